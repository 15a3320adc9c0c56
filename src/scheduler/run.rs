//! Scheduling run controller.
//!
//! Validates the input, seeds the search, enforces the budgets and turns
//! the best partition seen into a [`SchedulingResult`].
//!
//! [`run`] is the single-call entry point. [`SchedulingRun`] exposes the
//! same run one batch at a time for hosts that interleave their own work
//! (status updates, cancellation checks) between batches.

use chrono::NaiveDate;

use super::balance::balance_groups;
use super::RunParams;
use crate::error::Result;
use crate::models::{SchedulingResult, Signup, SlotGrid, StopReason};
use crate::normalize::RawSignup;
use crate::scoring::Scorer;
use crate::search::{CancelSignal, ProgressObserver, RunPhase, SearchEngine};
use crate::validation::{into_error, validate_run};

/// A scheduling run that advances one batch at a time.
///
/// # Example
/// ```
/// use u_cohort::models::{AvailabilityGrid, Signup, SlotGrid};
/// use u_cohort::scheduler::{RunParams, SchedulingRun};
/// use u_cohort::search::{NeverCancel, NoProgress, RunPhase};
///
/// let shape = SlotGrid::default();
/// let signups: Vec<Signup> = ["a", "b", "c"]
///     .iter()
///     .map(|id| Signup::new(*id, AvailabilityGrid::from_indices(shape, [20, 21])))
///     .collect();
/// let params = RunParams::default().with_group_size(2, 3);
///
/// let mut run = SchedulingRun::new(&signups, params).unwrap();
/// while run.advance(&mut NoProgress, &NeverCancel) != RunPhase::Done {
///     // host work between batches
/// }
/// let result = run.into_result();
/// assert_eq!(result.total_score(), 3);
/// ```
#[derive(Debug)]
pub struct SchedulingRun<'a> {
    params: RunParams,
    engine: SearchEngine<'a>,
}

impl<'a> SchedulingRun<'a> {
    /// Validates the input and prepares a run.
    ///
    /// Fails with `Configuration` before any search work if the input or
    /// parameters are unusable.
    pub fn new(signups: &'a [Signup], params: RunParams) -> Result<Self> {
        validate_run(signups, &params).map_err(into_error)?;
        let scorer = Scorer::new(signups, params.scoring_rules());
        let engine = SearchEngine::new(scorer, params.search, params.budget(), params.rng_seed);
        Ok(Self { params, engine })
    }

    /// Parameters of this run.
    pub fn params(&self) -> &RunParams {
        &self.params
    }

    /// Current phase.
    pub fn phase(&self) -> RunPhase {
        self.engine.phase()
    }

    /// Best total score seen so far.
    pub fn best_score(&self) -> usize {
        self.engine.best_score()
    }

    /// Executes one batch. This is the run's suspension point.
    pub fn advance(
        &mut self,
        progress: &mut dyn ProgressObserver,
        cancel: &dyn CancelSignal,
    ) -> RunPhase {
        self.engine.step(progress, cancel)
    }

    /// Produces the result from the best partition seen.
    ///
    /// A run abandoned before it stopped is reported as `Cancelled`.
    pub fn into_result(self) -> SchedulingResult {
        let scorer = self.engine.scorer();
        let (final_partition, balance_moves) = if self.params.balance {
            let mut best = self.engine.best_state().clone();
            let moves = balance_groups(&mut best, scorer);
            (best.to_partition(scorer), moves)
        } else {
            (self.engine.best_partition(), 0)
        };

        SchedulingResult {
            final_partition,
            iterations_run: self.engine.iterations(),
            best_iteration: self.engine.best_iteration(),
            elapsed: self.engine.elapsed(),
            stopped_reason: self.engine.stop_reason().unwrap_or(StopReason::Cancelled),
            balance_moves,
        }
    }
}

/// Runs the scheduler to completion.
///
/// `progress` is called after initialization, at the reporting cadence,
/// and once when the search stops; its failures are logged and ignored.
/// `cancel` is polled once per iteration.
#[tracing::instrument(
    level = "debug",
    skip_all,
    fields(participants = signups.len(), seed = params.rng_seed)
)]
pub fn run(
    signups: &[Signup],
    params: &RunParams,
    progress: &mut dyn ProgressObserver,
    cancel: &dyn CancelSignal,
) -> Result<SchedulingResult> {
    let mut run = SchedulingRun::new(signups, *params)?;
    while run.advance(progress, cancel) != RunPhase::Done {}
    let result = run.into_result();

    tracing::info!(
        stopped = ?result.stopped_reason,
        iterations = result.iterations_run,
        groups = result.final_partition.group_count(),
        placed = result.final_partition.placed_count(),
        unplaced = result.final_partition.unplaced.len(),
        elapsed_ms = result.elapsed.as_millis() as u64,
        "scheduling run finished"
    );
    Ok(result)
}

/// Normalizes raw local availability, then runs the scheduler.
///
/// Fails with `InvalidTimezone`/`InvalidSlot` on the first malformed
/// signup, before any search work.
pub fn run_raw(
    raw: &[RawSignup],
    week_reference: NaiveDate,
    shape: SlotGrid,
    params: &RunParams,
    progress: &mut dyn ProgressObserver,
    cancel: &dyn CancelSignal,
) -> Result<SchedulingResult> {
    let signups = raw
        .iter()
        .map(|r| r.normalize(week_reference, shape))
        .collect::<Result<Vec<_>>>()?;
    run(&signups, params, progress, cancel)
}
