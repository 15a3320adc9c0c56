//! Weekly slot grid and availability bitsets.
//!
//! The week is divided into fixed-width slots. A cell is one (day, slot)
//! pair; day 0 is Monday. Cells are indexed row-major by day, so the
//! index order is the canonical chronological order within a UTC week.
//!
//! # Cyclic Week
//! Availability recurs weekly: the cell after the last slot of Sunday is
//! the first slot of Monday. Multi-slot meetings and run lengths wrap.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulingError};

const MINUTES_PER_DAY: u16 = 24 * 60;
const DAYS_PER_WEEK: usize = 7;

/// Shape of the weekly grid, shared by every signup in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawSlotGrid")]
pub struct SlotGrid {
    /// Width of one slot in minutes. Divides 1440.
    pub slot_minutes: u16,
}

impl Default for SlotGrid {
    fn default() -> Self {
        Self { slot_minutes: 30 }
    }
}

#[derive(Deserialize)]
struct RawSlotGrid {
    slot_minutes: u16,
}

impl TryFrom<RawSlotGrid> for SlotGrid {
    type Error = SchedulingError;

    fn try_from(raw: RawSlotGrid) -> Result<Self> {
        Self::new(raw.slot_minutes)
    }
}

impl SlotGrid {
    /// Creates a grid with the given slot width.
    ///
    /// Fails with `Configuration` unless the width is positive and divides a day.
    pub fn new(slot_minutes: u16) -> Result<Self> {
        if slot_minutes == 0 || MINUTES_PER_DAY % slot_minutes != 0 {
            return Err(SchedulingError::Configuration(format!(
                "slot width {slot_minutes} min does not divide a day"
            )));
        }
        Ok(Self { slot_minutes })
    }

    /// Slots in one day.
    #[inline]
    pub fn slots_per_day(&self) -> u16 {
        MINUTES_PER_DAY / self.slot_minutes
    }

    /// Cells in one week.
    #[inline]
    pub fn cells(&self) -> usize {
        DAYS_PER_WEEK * self.slots_per_day() as usize
    }

    /// Linear index of a cell, or `None` if it lies outside the grid.
    pub fn index(&self, cell: Cell) -> Option<usize> {
        if (cell.day as usize) < DAYS_PER_WEEK && cell.slot < self.slots_per_day() {
            Some(cell.day as usize * self.slots_per_day() as usize + cell.slot as usize)
        } else {
            None
        }
    }

    /// Cell at a linear index (wrapping past the end of the week).
    pub fn cell_at(&self, index: usize) -> Cell {
        let per_day = self.slots_per_day() as usize;
        let index = index % self.cells();
        Cell {
            day: (index / per_day) as u8,
            slot: (index % per_day) as u16,
        }
    }

    /// Minutes since Monday 00:00 at which a cell starts.
    pub fn start_minute(&self, cell: Cell) -> u32 {
        cell.day as u32 * MINUTES_PER_DAY as u32 + cell.slot as u32 * self.slot_minutes as u32
    }
}

/// One (day, slot) position in the weekly grid.
///
/// Ordering is chronological: by day, then slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Cell {
    /// Day of week, 0 = Monday .. 6 = Sunday.
    pub day: u8,
    /// Slot within the day, 0-based.
    pub slot: u16,
}

impl Cell {
    /// Creates a cell.
    pub fn new(day: u8, slot: u16) -> Self {
        Self { day, slot }
    }
}

/// Fixed-size weekly availability bitset.
///
/// One bit per cell of its [`SlotGrid`]. Bits past the last cell are
/// always zero, so word-wise operations never leak phantom cells.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawGrid")]
pub struct AvailabilityGrid {
    shape: SlotGrid,
    words: Vec<u64>,
}

#[derive(Deserialize)]
struct RawGrid {
    shape: SlotGrid,
    words: Vec<u64>,
}

impl TryFrom<RawGrid> for AvailabilityGrid {
    type Error = SchedulingError;

    fn try_from(raw: RawGrid) -> Result<Self> {
        let expected = raw.shape.cells().div_ceil(64);
        if raw.words.len() != expected {
            return Err(SchedulingError::Configuration(format!(
                "availability grid has {} words, expected {expected}",
                raw.words.len()
            )));
        }
        let grid = Self {
            shape: raw.shape,
            words: raw.words,
        };
        let mut trimmed = grid.clone();
        trimmed.clear_tail();
        if trimmed != grid {
            return Err(SchedulingError::Configuration(format!(
                "availability grid sets bits past cell {}",
                grid.len() - 1
            )));
        }
        Ok(grid)
    }
}

impl AvailabilityGrid {
    /// Creates an all-unavailable grid.
    pub fn empty(shape: SlotGrid) -> Self {
        let words = vec![0; shape.cells().div_ceil(64)];
        Self { shape, words }
    }

    /// Creates an always-available grid.
    pub fn full(shape: SlotGrid) -> Self {
        let mut grid = Self::empty(shape);
        for word in &mut grid.words {
            *word = u64::MAX;
        }
        grid.clear_tail();
        grid
    }

    /// Creates a grid from cells. Cells outside the grid are ignored.
    pub fn from_cells(shape: SlotGrid, cells: impl IntoIterator<Item = Cell>) -> Self {
        let mut grid = Self::empty(shape);
        for cell in cells {
            if let Some(index) = shape.index(cell) {
                grid.insert(index);
            }
        }
        grid
    }

    /// Creates a grid from linear indices. Indices past the end are ignored.
    pub fn from_indices(shape: SlotGrid, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut grid = Self::empty(shape);
        for index in indices {
            if index < shape.cells() {
                grid.insert(index);
            }
        }
        grid
    }

    /// Grid shape.
    #[inline]
    pub fn shape(&self) -> SlotGrid {
        self.shape
    }

    /// Total cells (available or not).
    #[inline]
    pub fn len(&self) -> usize {
        self.shape.cells()
    }

    /// Marks a cell index available.
    #[inline]
    pub fn insert(&mut self, index: usize) {
        debug_assert!(index < self.len());
        self.words[index / 64] |= 1 << (index % 64);
    }

    /// Marks a cell index unavailable.
    #[inline]
    pub fn remove(&mut self, index: usize) {
        debug_assert!(index < self.len());
        self.words[index / 64] &= !(1 << (index % 64));
    }

    /// Whether a cell index is available. Indices wrap around the week.
    #[inline]
    pub fn contains(&self, index: usize) -> bool {
        let index = index % self.len();
        self.words[index / 64] & (1 << (index % 64)) != 0
    }

    /// Whether a cell is available.
    pub fn contains_cell(&self, cell: Cell) -> bool {
        self.shape.index(cell).is_some_and(|i| self.contains(i))
    }

    /// Number of available cells.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Whether no cell is available.
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Keeps only cells also available in `other`.
    pub fn intersect_with(&mut self, other: &Self) {
        debug_assert_eq!(self.shape, other.shape);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= *b;
        }
    }

    /// Adds every cell available in `other`.
    pub fn union_with(&mut self, other: &Self) {
        debug_assert_eq!(self.shape, other.shape);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a |= *b;
        }
    }

    /// Removes every cell available in `other`.
    pub fn subtract(&mut self, other: &Self) {
        debug_assert_eq!(self.shape, other.shape);
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= !*b;
        }
    }

    /// Number of cells available in both grids.
    pub fn intersection_count(&self, other: &Self) -> usize {
        self.words
            .iter()
            .zip(&other.words)
            .map(|(a, b)| (a & b).count_ones() as usize)
            .sum()
    }

    /// Available cell indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            (0..64)
                .filter(move |bit| word & (1 << bit) != 0)
                .map(move |bit| w * 64 + bit)
        })
    }

    /// Available cells in chronological order.
    pub fn cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.iter().map(|i| self.shape.cell_at(i))
    }

    /// Start cells of every window of `length` consecutive available cells.
    ///
    /// Windows wrap around the end of the week. A length of 0 or 1
    /// returns the grid unchanged.
    pub fn meeting_starts(&self, length: usize) -> Self {
        if length <= 1 {
            return self.clone();
        }
        let total = self.len();
        let mut starts = Self::empty(self.shape);
        if length > total {
            return starts;
        }
        for start in self.iter() {
            if (1..length).all(|k| self.contains(start + k)) {
                starts.insert(start);
            }
        }
        starts
    }

    /// Cells covered by meetings of `length` slots starting at `start`.
    pub fn meeting_cells(shape: SlotGrid, start: usize, length: usize) -> Self {
        let total = shape.cells();
        Self::from_indices(shape, (0..length.max(1)).map(|k| (start + k) % total))
    }

    fn clear_tail(&mut self) {
        let used = self.len() % 64;
        if used != 0 {
            if let Some(last) = self.words.last_mut() {
                *last &= (1u64 << used) - 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slot_grid_shape() {
        let grid = SlotGrid::default();
        assert_eq!(grid.slots_per_day(), 48);
        assert_eq!(grid.cells(), 336);

        let hourly = SlotGrid::new(60).unwrap();
        assert_eq!(hourly.cells(), 168);

        assert!(SlotGrid::new(0).is_err());
        assert!(SlotGrid::new(7).is_err());
    }

    #[test]
    fn test_cell_index_round_trip() {
        let grid = SlotGrid::default();
        let cell = Cell::new(3, 17);
        let index = grid.index(cell).unwrap();
        assert_eq!(index, 3 * 48 + 17);
        assert_eq!(grid.cell_at(index), cell);

        assert_eq!(grid.index(Cell::new(7, 0)), None);
        assert_eq!(grid.index(Cell::new(0, 48)), None);
        // Wraps past Sunday into Monday
        assert_eq!(grid.cell_at(336), Cell::new(0, 0));
    }

    #[test]
    fn test_full_grid_has_no_phantom_cells() {
        let grid = AvailabilityGrid::full(SlotGrid::default());
        assert_eq!(grid.count(), 336);
        assert_eq!(grid.iter().last(), Some(335));
    }

    #[test]
    fn test_set_operations() {
        let shape = SlotGrid::default();
        let mut a = AvailabilityGrid::from_indices(shape, [1, 2, 3, 100]);
        let b = AvailabilityGrid::from_indices(shape, [2, 3, 4]);

        assert_eq!(a.intersection_count(&b), 2);

        let mut union = a.clone();
        union.union_with(&b);
        assert_eq!(union.iter().collect::<Vec<_>>(), vec![1, 2, 3, 4, 100]);

        a.intersect_with(&b);
        assert_eq!(a.iter().collect::<Vec<_>>(), vec![2, 3]);

        union.subtract(&b);
        assert_eq!(union.iter().collect::<Vec<_>>(), vec![1, 100]);
    }

    #[test]
    fn test_meeting_starts() {
        let shape = SlotGrid::default();
        let grid = AvailabilityGrid::from_indices(shape, [10, 11, 12, 20]);
        let starts = grid.meeting_starts(2);
        assert_eq!(starts.iter().collect::<Vec<_>>(), vec![10, 11]);

        let starts = grid.meeting_starts(3);
        assert_eq!(starts.iter().collect::<Vec<_>>(), vec![10]);

        assert_eq!(grid.meeting_starts(1), grid);
    }

    #[test]
    fn test_meeting_starts_wrap_week() {
        let shape = SlotGrid::default();
        // Sunday 23:30 + Monday 00:00
        let grid = AvailabilityGrid::from_indices(shape, [335, 0]);
        let starts = grid.meeting_starts(2);
        assert_eq!(starts.iter().collect::<Vec<_>>(), vec![335]);
    }

    #[test]
    fn test_meeting_cells() {
        let shape = SlotGrid::default();
        let cells = AvailabilityGrid::meeting_cells(shape, 335, 2);
        assert_eq!(cells.iter().collect::<Vec<_>>(), vec![0, 335]);
    }

    #[test]
    fn test_contains_cell() {
        let shape = SlotGrid::default();
        let grid = AvailabilityGrid::from_cells(shape, [Cell::new(2, 5)]);
        assert!(grid.contains_cell(Cell::new(2, 5)));
        assert!(!grid.contains_cell(Cell::new(2, 6)));
        assert!(!grid.contains_cell(Cell::new(9, 5)));
        assert_eq!(grid.cells().collect::<Vec<_>>(), vec![Cell::new(2, 5)]);
    }

    #[test]
    fn test_deserialize_round_trip() {
        let grid = AvailabilityGrid::from_indices(SlotGrid::default(), [0, 40, 335]);
        let json = serde_json::to_string(&grid).unwrap();
        let back: AvailabilityGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(back, grid);
    }

    #[test]
    fn test_deserialize_rejects_bad_slot_width() {
        assert!(serde_json::from_str::<SlotGrid>(r#"{"slot_minutes":0}"#).is_err());
        assert!(serde_json::from_str::<SlotGrid>(r#"{"slot_minutes":7}"#).is_err());
        let json = r#"{"shape":{"slot_minutes":0},"words":[]}"#;
        assert!(serde_json::from_str::<AvailabilityGrid>(json).is_err());
    }

    #[test]
    fn test_deserialize_rejects_wrong_word_count() {
        // 336 cells need 6 words
        let json = r#"{"shape":{"slot_minutes":30},"words":[3]}"#;
        let err = serde_json::from_str::<AvailabilityGrid>(json).unwrap_err();
        assert!(err.to_string().contains("expected 6"));
    }

    #[test]
    fn test_deserialize_rejects_tail_bits() {
        // Cell 336 would be bit 16 of the sixth word
        let json = r#"{"shape":{"slot_minutes":30},"words":[0,0,0,0,0,65536]}"#;
        assert!(serde_json::from_str::<AvailabilityGrid>(json).is_err());

        let json = r#"{"shape":{"slot_minutes":30},"words":[0,0,0,0,0,32768]}"#;
        let grid: AvailabilityGrid = serde_json::from_str(json).unwrap();
        assert_eq!(grid.iter().collect::<Vec<_>>(), vec![335]);
    }
}
