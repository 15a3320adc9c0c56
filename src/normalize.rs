//! Availability normalization.
//!
//! Converts weekly availability expressed in a participant's local
//! timezone into a UTC [`AvailabilityGrid`].
//!
//! # DST Handling
//! Weekly recurrence means the UTC offset can differ between weekdays of
//! the same week (a DST transition can fall mid-week). Each local slot is
//! converted using the offset in effect at the *next occurrence* of that
//! weekday/time on or after the reference date:
//!
//! - Ambiguous local times (fall-back) resolve to the earlier UTC instant.
//! - Nonexistent local times (spring-forward gap) use the offset in effect
//!   before the transition.
//! - When the zone offset is not a multiple of the slot width, the UTC cell
//!   containing the slot's start instant is marked.

use chrono::{
    Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Timelike,
    Weekday,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchedulingError};
use crate::models::{AvailabilityGrid, Cell, Signup, SlotGrid};

/// A slot in local time: (day-of-week, slot-of-day).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LocalSlot {
    /// Local day of week, 0 = Monday .. 6 = Sunday.
    pub day: u8,
    /// Local slot of day, 0-based.
    pub slot: u16,
}

impl LocalSlot {
    /// Creates a local slot.
    pub fn new(day: u8, slot: u16) -> Self {
        Self { day, slot }
    }
}

/// A signup whose availability is still in local time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawSignup {
    /// Stable participant identifier.
    pub id: String,
    /// IANA timezone name, e.g. `"America/New_York"`.
    pub timezone: String,
    /// Available local slots.
    pub local_slots: Vec<LocalSlot>,
    /// If-needed local slots.
    pub if_needed_slots: Vec<LocalSlot>,
    /// Whether this participant can facilitate a group.
    pub is_facilitator: bool,
    /// Courses the participant is enrolled in.
    pub courses: Vec<String>,
}

impl RawSignup {
    /// Creates a raw signup with no availability.
    pub fn new(id: impl Into<String>, timezone: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timezone: timezone.into(),
            ..Self::default()
        }
    }

    /// Adds available local slots.
    pub fn with_slots(mut self, slots: impl IntoIterator<Item = LocalSlot>) -> Self {
        self.local_slots.extend(slots);
        self
    }

    /// Adds if-needed local slots.
    pub fn with_if_needed_slots(mut self, slots: impl IntoIterator<Item = LocalSlot>) -> Self {
        self.if_needed_slots.extend(slots);
        self
    }

    /// Converts to a UTC [`Signup`].
    pub fn normalize(&self, week_reference: NaiveDate, shape: SlotGrid) -> Result<Signup> {
        let tz = parse_timezone(&self.timezone)?;
        let availability = normalize_with(&self.local_slots, tz, week_reference, shape)?;
        let if_needed = normalize_with(&self.if_needed_slots, tz, week_reference, shape)?;
        Ok(Signup {
            id: self.id.clone(),
            availability,
            if_needed,
            timezone: self.timezone.clone(),
            is_facilitator: self.is_facilitator,
            courses: self.courses.clone(),
        })
    }
}

/// Parses an IANA timezone name.
pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| SchedulingError::InvalidTimezone(name.to_string()))
}

/// Converts local weekly slots into a UTC availability grid.
///
/// # Errors
/// - `InvalidTimezone` if `timezone_name` is not a known IANA zone.
/// - `InvalidSlot` if a day is not 0..=6 or a slot is past the end of the day.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use u_cohort::models::SlotGrid;
/// use u_cohort::normalize::{normalize, LocalSlot};
///
/// // Monday 23:30 in New York (EST) is Tuesday 04:30 UTC.
/// let monday = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
/// let grid = normalize(&[LocalSlot::new(0, 47)], "America/New_York", monday, SlotGrid::default())
///     .unwrap();
/// assert_eq!(grid.iter().collect::<Vec<_>>(), vec![48 + 9]);
/// ```
pub fn normalize(
    raw_local_slots: &[LocalSlot],
    timezone_name: &str,
    week_reference: NaiveDate,
    shape: SlotGrid,
) -> Result<AvailabilityGrid> {
    let tz = parse_timezone(timezone_name)?;
    normalize_with(raw_local_slots, tz, week_reference, shape)
}

fn normalize_with(
    raw_local_slots: &[LocalSlot],
    tz: Tz,
    week_reference: NaiveDate,
    shape: SlotGrid,
) -> Result<AvailabilityGrid> {
    let mut grid = AvailabilityGrid::empty(shape);
    for &local in raw_local_slots {
        grid.insert(utc_index(local, tz, week_reference, shape)?);
    }
    Ok(grid)
}

fn utc_index(
    local: LocalSlot,
    tz: Tz,
    week_reference: NaiveDate,
    shape: SlotGrid,
) -> Result<usize> {
    if local.day > 6 {
        return Err(SchedulingError::invalid_slot(
            local.day,
            local.slot,
            "day must be 0..=6 (Monday..Sunday)",
        ));
    }
    let per_day = shape.slots_per_day();
    if local.slot >= per_day {
        return Err(SchedulingError::invalid_slot(
            local.day,
            local.slot,
            format!("slot must be below {per_day}"),
        ));
    }

    let date = next_weekday(week_reference, local.day).ok_or_else(|| {
        SchedulingError::Configuration(format!("reference date {week_reference} out of range"))
    })?;
    let minutes = local.slot as u32 * shape.slot_minutes as u32;
    let time = NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
        .ok_or_else(|| SchedulingError::invalid_slot(local.day, local.slot, "not a time of day"))?;

    let utc = resolve_local(tz, date.and_time(time));
    let minute_of_week =
        utc.weekday().num_days_from_monday() * 24 * 60 + utc.hour() * 60 + utc.minute();
    Ok(minute_of_week as usize / shape.slot_minutes as usize)
}

/// Local wall-clock time → naive UTC, resolving DST edge cases.
fn resolve_local(tz: Tz, local: NaiveDateTime) -> NaiveDateTime {
    match tz.from_local_datetime(&local).earliest() {
        Some(dt) => dt.naive_utc(),
        None => {
            // Inside a gap: apply the offset from before the transition.
            let before = tz.offset_from_utc_datetime(&(local - TimeDelta::days(1))).fix();
            local - TimeDelta::seconds(before.local_minus_utc() as i64)
        }
    }
}

/// First date on or after `from` falling on `day` (0 = Monday).
fn next_weekday(from: NaiveDate, day: u8) -> Option<NaiveDate> {
    let ahead = (day as u32 + 7 - from.weekday().num_days_from_monday()) % 7;
    from.checked_add_days(Days::new(ahead as u64))
}

/// Converts a UTC cell back to the participant's local weekday and time.
///
/// Uses the offset in effect at the next occurrence of the cell on or
/// after `week_reference`. Callers use this to render a meeting slot.
pub fn to_local(
    cell: Cell,
    timezone_name: &str,
    week_reference: NaiveDate,
    shape: SlotGrid,
) -> Result<(Weekday, NaiveTime)> {
    let tz = parse_timezone(timezone_name)?;
    if shape.index(cell).is_none() {
        return Err(SchedulingError::invalid_slot(cell.day, cell.slot, "cell outside grid"));
    }
    let date = next_weekday(week_reference, cell.day).ok_or_else(|| {
        SchedulingError::Configuration(format!("reference date {week_reference} out of range"))
    })?;
    let minutes = cell.slot as u32 * shape.slot_minutes as u32;
    let time = NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
        .ok_or_else(|| SchedulingError::invalid_slot(cell.day, cell.slot, "not a time of day"))?;
    let local = tz.from_utc_datetime(&date.and_time(time));
    Ok((local.weekday(), local.time()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn cells(grid: &AvailabilityGrid) -> Vec<usize> {
        grid.iter().collect()
    }

    #[test]
    fn test_utc_is_identity() {
        let grid = normalize(
            &[LocalSlot::new(0, 18), LocalSlot::new(6, 47)],
            "UTC",
            date(2024, 1, 15),
            SlotGrid::default(),
        )
        .unwrap();
        assert_eq!(cells(&grid), vec![18, 6 * 48 + 47]);
    }

    #[test]
    fn test_crosses_day_boundary() {
        // Monday 23:30 EST -> Tuesday 04:30 UTC
        let grid = normalize(
            &[LocalSlot::new(0, 47)],
            "America/New_York",
            date(2024, 1, 15),
            SlotGrid::default(),
        )
        .unwrap();
        assert_eq!(cells(&grid), vec![48 + 9]);
    }

    #[test]
    fn test_summer_offset() {
        // Monday 23:30 EDT -> Tuesday 03:30 UTC
        let grid = normalize(
            &[LocalSlot::new(0, 47)],
            "America/New_York",
            date(2024, 7, 15),
            SlotGrid::default(),
        )
        .unwrap();
        assert_eq!(cells(&grid), vec![48 + 7]);
    }

    #[test]
    fn test_offset_resolved_per_occurrence() {
        // Reference Friday 2024-03-08; US DST starts Sunday 2024-03-10.
        let grid = normalize(
            &[LocalSlot::new(4, 18), LocalSlot::new(0, 18)],
            "America/New_York",
            date(2024, 3, 8),
            SlotGrid::default(),
        )
        .unwrap();
        // Friday 09:00 EST -> 14:00 UTC; next Monday 09:00 EDT -> 13:00 UTC
        assert_eq!(cells(&grid), vec![26, 4 * 48 + 28]);
    }

    #[test]
    fn test_ambiguous_time_takes_earlier_instant() {
        // 2024-11-03 01:30 happens twice in New York: 05:30 UTC (EDT) and 06:30 UTC (EST).
        let grid = normalize(
            &[LocalSlot::new(6, 3)],
            "America/New_York",
            date(2024, 11, 3),
            SlotGrid::default(),
        )
        .unwrap();
        assert_eq!(cells(&grid), vec![6 * 48 + 11]);
    }

    #[test]
    fn test_gap_time_uses_previous_offset() {
        // 2024-03-10 02:30 does not exist in New York; EST gives 07:30 UTC.
        let grid = normalize(
            &[LocalSlot::new(6, 5)],
            "America/New_York",
            date(2024, 3, 10),
            SlotGrid::default(),
        )
        .unwrap();
        assert_eq!(cells(&grid), vec![6 * 48 + 15]);
    }

    #[test]
    fn test_wraps_into_next_week() {
        // Sunday 23:30 EST -> Monday 04:30 UTC
        let grid = normalize(
            &[LocalSlot::new(6, 47)],
            "America/New_York",
            date(2024, 1, 15),
            SlotGrid::default(),
        )
        .unwrap();
        assert_eq!(cells(&grid), vec![9]);
    }

    #[test]
    fn test_positive_offset_wraps_backwards() {
        // Monday 03:00 IST (+05:30) -> Sunday 21:30 UTC
        let grid = normalize(
            &[LocalSlot::new(0, 6)],
            "Asia/Kolkata",
            date(2024, 1, 15),
            SlotGrid::default(),
        )
        .unwrap();
        assert_eq!(cells(&grid), vec![6 * 48 + 43]);
    }

    #[test]
    fn test_unaligned_offset_floors_to_cell() {
        // Monday 06:00 NPT (+05:45) -> Monday 00:15 UTC, inside cell 0
        let grid = normalize(
            &[LocalSlot::new(0, 12)],
            "Asia/Kathmandu",
            date(2024, 1, 15),
            SlotGrid::default(),
        )
        .unwrap();
        assert_eq!(cells(&grid), vec![0]);
    }

    #[test]
    fn test_invalid_timezone() {
        let err = normalize(&[], "Not/AZone", date(2024, 1, 15), SlotGrid::default()).unwrap_err();
        assert_eq!(err, SchedulingError::InvalidTimezone("Not/AZone".into()));
    }

    #[test]
    fn test_invalid_slot() {
        let shape = SlotGrid::default();
        let err = normalize(&[LocalSlot::new(7, 0)], "UTC", date(2024, 1, 15), shape).unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidSlot { day: 7, .. }));

        let err = normalize(&[LocalSlot::new(0, 48)], "UTC", date(2024, 1, 15), shape).unwrap_err();
        assert!(matches!(err, SchedulingError::InvalidSlot { slot: 48, .. }));
    }

    #[test]
    fn test_to_local_inverts_normalize() {
        let shape = SlotGrid::default();
        let (weekday, time) =
            to_local(Cell::new(1, 9), "America/New_York", date(2024, 1, 15), shape).unwrap();
        assert_eq!(weekday, Weekday::Mon);
        assert_eq!(time, NaiveTime::from_hms_opt(23, 30, 0).unwrap());
    }

    #[test]
    fn test_raw_signup_normalize() {
        let raw = RawSignup::new("p1", "Europe/Berlin")
            .with_slots([LocalSlot::new(2, 20)])
            .with_if_needed_slots([LocalSlot::new(2, 22)]);
        let signup = raw.normalize(date(2024, 1, 15), SlotGrid::default()).unwrap();
        // Wednesday 10:00 CET -> 09:00 UTC
        assert_eq!(cells(&signup.availability), vec![2 * 48 + 18]);
        assert_eq!(cells(&signup.if_needed), vec![2 * 48 + 20]);
        assert_eq!(signup.timezone, "Europe/Berlin");
    }
}
