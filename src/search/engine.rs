//! Local search engine.
//!
//! # State machine
//!
//! ```text
//! Initializing ──► Searching ──► Converged ───────┐
//!                      │    ├──► BudgetExhausted ─┼──► Done
//!                      │    └──► Cancelled ───────┘
//! ```
//!
//! [`SearchEngine::step`] advances the machine by one batch: the greedy
//! construction, a run of search iterations ending at a progress report,
//! or the transition from a stop state to `Done`. Callers that need a
//! cooperative suspension point drive `step` themselves.
//!
//! # Algorithm
//!
//! Each iteration copies the working partition into a scratch partition,
//! applies one random [`MoveKind`], and scores the result incrementally.
//! The scratch copy replaces the working partition when the
//! [`CoolingSchedule`] accepts the score delta. A strictly better working
//! partition is copied into the best-seen partition, which is what the
//! run returns.
//!
//! # Complexity
//! Per iteration: O(n + g·W) for the scratch copy plus one or two group
//! evaluations (n = signups, g = groups, W = grid words).

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use super::construct::greedy_partition;
use super::cooling::CoolingSchedule;
use super::moves::MoveKind;
use super::progress::{notify, CancelSignal, ProgressObserver, ProgressReport};
use super::state::PartitionState;
use crate::models::{Partition, StopReason};
use crate::scoring::Scorer;

/// Search tunables.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Consecutive iterations without an accepted improving move before
    /// the search counts as converged.
    pub convergence_window: u64,
    /// Iterations between progress reports.
    pub progress_every: u64,
    /// Wall-clock time between progress reports.
    pub progress_interval: Duration,
    /// Acceptance schedule for worsening moves.
    pub cooling: CoolingSchedule,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            convergence_window: 500,
            progress_every: 100,
            progress_interval: Duration::from_secs(1),
            cooling: CoolingSchedule::default(),
        }
    }
}

impl SearchConfig {
    /// Sets the convergence window.
    pub fn with_convergence_window(mut self, iterations: u64) -> Self {
        self.convergence_window = iterations;
        self
    }

    /// Sets the iteration cadence of progress reports.
    pub fn with_progress_every(mut self, iterations: u64) -> Self {
        self.progress_every = iterations;
        self
    }

    /// Sets the wall-clock cadence of progress reports.
    pub fn with_progress_interval(mut self, interval: Duration) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Sets the cooling schedule.
    pub fn with_cooling(mut self, cooling: CoolingSchedule) -> Self {
        self.cooling = cooling;
        self
    }
}

/// Stopping budget. A limit of `None` is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Budget {
    /// Maximum search iterations.
    pub iterations: Option<u64>,
    /// Maximum wall-clock time, measured from initialization.
    pub time: Option<Duration>,
}

/// Engine lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunPhase {
    /// Greedy construction pending.
    Initializing,
    /// Iterating.
    Searching,
    /// Stopped: no improvement within the convergence window.
    Converged,
    /// Stopped: iteration or time budget reached.
    BudgetExhausted,
    /// Stopped: caller cancelled.
    Cancelled,
    /// Final state.
    Done,
}

impl RunPhase {
    /// Whether the search loop has stopped.
    pub fn is_stopped(&self) -> bool {
        !matches!(self, Self::Initializing | Self::Searching)
    }

    fn from_stop(reason: StopReason) -> Self {
        match reason {
            StopReason::Converged => Self::Converged,
            StopReason::BudgetExhausted => Self::BudgetExhausted,
            StopReason::Cancelled => Self::Cancelled,
        }
    }
}

/// Seeded local search over partitions of one signup list.
#[derive(Debug)]
pub struct SearchEngine<'a> {
    scorer: Scorer<'a>,
    config: SearchConfig,
    budget: Budget,
    rng: ChaCha8Rng,
    phase: RunPhase,
    stop_reason: Option<StopReason>,
    working: PartitionState,
    scratch: PartitionState,
    best: PartitionState,
    best_iteration: u64,
    iteration: u64,
    stale: u64,
    upper_bound: usize,
    started: Option<Instant>,
    last_report: Option<Instant>,
}

impl<'a> SearchEngine<'a> {
    /// Creates an engine in the `Initializing` phase.
    pub fn new(scorer: Scorer<'a>, config: SearchConfig, budget: Budget, seed: u64) -> Self {
        let n = scorer.signups().len();
        let schedulable = (0..n).filter(|&i| !scorer.relaxed_grid(i).is_empty()).count();
        let upper_bound = if schedulable >= scorer.rules().min_group_size {
            schedulable
        } else {
            0
        };
        Self {
            scorer,
            config,
            budget,
            rng: ChaCha8Rng::seed_from_u64(seed),
            phase: RunPhase::Initializing,
            stop_reason: None,
            working: PartitionState::all_unplaced(n),
            scratch: PartitionState::all_unplaced(n),
            best: PartitionState::all_unplaced(n),
            best_iteration: 0,
            iteration: 0,
            stale: 0,
            upper_bound,
            started: None,
            last_report: None,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Why the search stopped, once it has.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.stop_reason
    }

    /// Iterations completed.
    pub fn iterations(&self) -> u64 {
        self.iteration
    }

    /// Best total score seen.
    pub fn best_score(&self) -> usize {
        self.best.total_score()
    }

    /// Iteration at which the best partition was reached.
    pub fn best_iteration(&self) -> u64 {
        self.best_iteration
    }

    /// Wall-clock time since initialization.
    pub fn elapsed(&self) -> Duration {
        self.started.map(|s| s.elapsed()).unwrap_or_default()
    }

    /// The scorer driving the search.
    pub fn scorer(&self) -> &Scorer<'a> {
        &self.scorer
    }

    /// Best-seen working partition.
    pub fn best_state(&self) -> &PartitionState {
        &self.best
    }

    /// Best-seen partition as IDs.
    pub fn best_partition(&self) -> Partition {
        self.best.to_partition(&self.scorer)
    }

    /// Advances by one batch and returns the new phase.
    pub fn step(
        &mut self,
        progress: &mut dyn ProgressObserver,
        cancel: &dyn CancelSignal,
    ) -> RunPhase {
        match self.phase {
            RunPhase::Initializing => self.initialize(progress),
            RunPhase::Searching => self.search_batch(progress, cancel),
            RunPhase::Converged | RunPhase::BudgetExhausted | RunPhase::Cancelled => {
                self.phase = RunPhase::Done;
            }
            RunPhase::Done => {}
        }
        self.phase
    }

    fn initialize(&mut self, progress: &mut dyn ProgressObserver) {
        let now = Instant::now();
        self.started = Some(now);
        self.last_report = Some(now);

        self.working = greedy_partition(&self.scorer, &mut self.rng);
        self.best.clone_from(&self.working);
        self.phase = RunPhase::Searching;

        tracing::debug!(
            participants = self.scorer.signups().len(),
            initial_score = self.best.total_score(),
            upper_bound = self.upper_bound,
            "search initialized"
        );
        self.report(progress);
    }

    fn search_batch(&mut self, progress: &mut dyn ProgressObserver, cancel: &dyn CancelSignal) {
        let every = self.config.progress_every.max(1);
        let mut done = 0u64;
        loop {
            if let Some(reason) = self.stop_condition(cancel) {
                self.stop(reason, progress);
                return;
            }
            self.iterate();
            done += 1;

            let interval_passed = self
                .last_report
                .is_some_and(|t| t.elapsed() >= self.config.progress_interval);
            if done >= every || interval_passed {
                self.report(progress);
                return;
            }
        }
    }

    fn stop_condition(&self, cancel: &dyn CancelSignal) -> Option<StopReason> {
        if cancel.is_cancelled() {
            return Some(StopReason::Cancelled);
        }
        if self.stale >= self.config.convergence_window
            || self.best.total_score() >= self.upper_bound
        {
            return Some(StopReason::Converged);
        }
        let out_of_iterations = self.budget.iterations.is_some_and(|max| self.iteration >= max);
        let out_of_time = self.budget.time.is_some_and(|max| self.elapsed() >= max);
        if out_of_iterations || out_of_time {
            return Some(StopReason::BudgetExhausted);
        }
        None
    }

    fn iterate(&mut self) {
        self.iteration += 1;
        self.scratch.clone_from(&self.working);

        let kind = MoveKind::random(&mut self.rng);
        if !kind.apply(&mut self.scratch, &self.scorer, &mut self.rng) {
            self.stale += 1;
            tracing::trace!(iteration = self.iteration, ?kind, "move not applicable");
            return;
        }

        let delta = self.scratch.total_score() as i64 - self.working.total_score() as i64;
        let accepted = self.config.cooling.accept(delta, self.iteration, &mut self.rng);
        tracing::trace!(iteration = self.iteration, ?kind, delta, accepted, "move evaluated");

        if accepted {
            std::mem::swap(&mut self.working, &mut self.scratch);
        }
        if accepted && delta > 0 {
            self.stale = 0;
        } else {
            self.stale += 1;
        }

        if self.working.total_score() > self.best.total_score() {
            self.best.clone_from(&self.working);
            self.best_iteration = self.iteration;
            tracing::debug!(
                iteration = self.iteration,
                best_score = self.best.total_score(),
                "new best partition"
            );
        }
    }

    fn stop(&mut self, reason: StopReason, progress: &mut dyn ProgressObserver) {
        self.stop_reason = Some(reason);
        self.phase = RunPhase::from_stop(reason);
        tracing::debug!(
            ?reason,
            iterations = self.iteration,
            best_score = self.best.total_score(),
            best_iteration = self.best_iteration,
            "search stopped"
        );
        self.report(progress);
    }

    fn report(&mut self, progress: &mut dyn ProgressObserver) {
        let report = ProgressReport {
            iterations_done: self.iteration,
            iterations_planned: self.budget.iterations,
            best_score: self.best.total_score(),
            total_participants: self.scorer.signups().len(),
        };
        notify(progress, &report);
        self.last_report = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AvailabilityGrid, Signup, SlotGrid};
    use crate::scoring::ScoringRules;
    use crate::search::progress::{NeverCancel, NoProgress, ProgressError};
    use std::cell::Cell;

    fn signup(id: &str, cells: &[usize]) -> Signup {
        Signup::new(id, AvailabilityGrid::from_indices(SlotGrid::default(), cells.iter().copied()))
    }

    fn rules(min: usize, max: usize) -> ScoringRules {
        ScoringRules {
            min_group_size: min,
            max_group_size: max,
            ..ScoringRules::default()
        }
    }

    fn drive(
        engine: &mut SearchEngine<'_>,
        progress: &mut dyn ProgressObserver,
        cancel: &dyn CancelSignal,
    ) {
        while engine.step(progress, cancel) != RunPhase::Done {}
    }

    /// Five signups sharing one cell, pairs only: 4 is the best reachable
    /// score, 5 the upper bound, so the search never converges early.
    fn pairs() -> Vec<Signup> {
        (0..5).map(|i| signup(&format!("s{i}"), &[3])).collect()
    }

    #[test]
    fn test_phase_sequence() {
        let signups = vec![signup("a", &[1, 2]), signup("b", &[2, 3])];
        let mut engine = SearchEngine::new(
            Scorer::new(&signups, rules(2, 4)),
            SearchConfig::default(),
            Budget {
                iterations: Some(100),
                time: None,
            },
            42,
        );
        assert_eq!(engine.phase(), RunPhase::Initializing);
        assert_eq!(engine.step(&mut NoProgress, &NeverCancel), RunPhase::Searching);
        assert_eq!(engine.step(&mut NoProgress, &NeverCancel), RunPhase::Converged);
        assert_eq!(engine.step(&mut NoProgress, &NeverCancel), RunPhase::Done);
        assert_eq!(engine.step(&mut NoProgress, &NeverCancel), RunPhase::Done);
        assert_eq!(engine.best_score(), 2);
        assert_eq!(engine.stop_reason(), Some(StopReason::Converged));
    }

    #[test]
    fn test_iteration_budget() {
        let signups = pairs();
        let config = SearchConfig::default().with_convergence_window(u64::MAX);
        let mut engine = SearchEngine::new(
            Scorer::new(&signups, rules(2, 2)),
            config,
            Budget {
                iterations: Some(50),
                time: None,
            },
            7,
        );
        drive(&mut engine, &mut NoProgress, &NeverCancel);

        assert_eq!(engine.stop_reason(), Some(StopReason::BudgetExhausted));
        assert_eq!(engine.iterations(), 50);
        assert_eq!(engine.best_score(), 4);
        engine.best_state().check_invariants().unwrap();
    }

    #[test]
    fn test_convergence_window() {
        let signups = pairs();
        let config = SearchConfig::default().with_convergence_window(20);
        let mut engine =
            SearchEngine::new(Scorer::new(&signups, rules(2, 2)), config, Budget::default(), 7);
        drive(&mut engine, &mut NoProgress, &NeverCancel);

        assert_eq!(engine.stop_reason(), Some(StopReason::Converged));
        assert!(engine.iterations() >= 20);
    }

    #[test]
    fn test_cancellation_returns_valid_best() {
        let signups = pairs();
        let polls = Cell::new(0u32);
        let cancel = || {
            polls.set(polls.get() + 1);
            polls.get() > 10
        };
        let config = SearchConfig::default()
            .with_convergence_window(u64::MAX)
            .with_progress_every(3);
        let mut engine =
            SearchEngine::new(Scorer::new(&signups, rules(2, 2)), config, Budget::default(), 3);
        drive(&mut engine, &mut NoProgress, &cancel);

        assert_eq!(engine.stop_reason(), Some(StopReason::Cancelled));
        assert_eq!(engine.iterations(), 10);
        engine.best_state().check_invariants().unwrap();
        let partition = engine.best_partition();
        assert!(partition.covers_exactly(signups.iter().map(|s| s.id.as_str())));
    }

    #[test]
    fn test_progress_reports_are_monotone() {
        let signups: Vec<Signup> = (0..12)
            .map(|i| signup(&format!("s{i}"), &[i % 3, 40 + i % 4]))
            .collect();
        let mut seen: Vec<ProgressReport> = Vec::new();
        let mut observer = |r: &ProgressReport| -> Result<(), ProgressError> {
            seen.push(*r);
            Ok(())
        };
        let config = SearchConfig::default().with_progress_every(10);
        let mut engine = SearchEngine::new(
            Scorer::new(&signups, rules(2, 4)),
            config,
            Budget {
                iterations: Some(300),
                time: None,
            },
            11,
        );
        drive(&mut engine, &mut observer, &NeverCancel);

        assert!(seen.len() >= 2);
        assert!(seen.windows(2).all(|w| w[0].best_score <= w[1].best_score));
        assert!(seen.iter().all(|r| r.total_participants == 12));
        assert_eq!(seen.last().map(|r| r.best_score), Some(engine.best_score()));
    }

    #[test]
    fn test_search_rebalances_full_group() {
        // Greedy fills one group of four and strands two; only moving a
        // placed member reaches 3 + 3.
        let signups: Vec<Signup> = (0..6).map(|i| signup(&format!("s{i}"), &[9])).collect();
        let config = SearchConfig::default().with_convergence_window(20_000);
        let mut engine = SearchEngine::new(
            Scorer::new(&signups, rules(3, 4)),
            config,
            Budget {
                iterations: Some(20_000),
                time: None,
            },
            42,
        );
        drive(&mut engine, &mut NoProgress, &NeverCancel);

        assert_eq!(engine.best_score(), 6);
        assert_eq!(engine.stop_reason(), Some(StopReason::Converged));
        assert_eq!(engine.best_partition().group_count(), 2);
    }

    #[test]
    fn test_failing_observer_does_not_abort() {
        let signups = pairs();
        let mut observer =
            |_: &ProgressReport| -> Result<(), ProgressError> { Err("rate limited".into()) };
        let mut engine = SearchEngine::new(
            Scorer::new(&signups, rules(2, 2)),
            SearchConfig::default().with_progress_every(5),
            Budget {
                iterations: Some(40),
                time: None,
            },
            1,
        );
        drive(&mut engine, &mut observer, &NeverCancel);
        assert_eq!(engine.stop_reason(), Some(StopReason::BudgetExhausted));
    }

    #[test]
    fn test_same_seed_same_result() {
        let signups: Vec<Signup> = (0..15)
            .map(|i| signup(&format!("s{i:02}"), &[i % 4, 100 + i % 5]))
            .collect();
        let run = |seed| {
            let mut engine = SearchEngine::new(
                Scorer::new(&signups, rules(2, 4)),
                SearchConfig::default(),
                Budget {
                    iterations: Some(400),
                    time: None,
                },
                seed,
            );
            drive(&mut engine, &mut NoProgress, &NeverCancel);
            (engine.best_partition(), engine.iterations(), engine.best_iteration())
        };
        assert_eq!(run(99), run(99));
    }

    #[test]
    fn test_time_budget() {
        let signups = pairs();
        let config = SearchConfig::default().with_convergence_window(u64::MAX);
        let mut engine = SearchEngine::new(
            Scorer::new(&signups, rules(2, 2)),
            config,
            Budget {
                iterations: None,
                time: Some(Duration::from_millis(5)),
            },
            5,
        );
        drive(&mut engine, &mut NoProgress, &NeverCancel);

        assert_eq!(engine.stop_reason(), Some(StopReason::BudgetExhausted));
        assert!(engine.elapsed() >= Duration::from_millis(5));
        assert!(engine.iterations() > 0);
        engine.best_state().check_invariants().unwrap();
        let partition = engine.best_partition();
        assert!(partition.covers_exactly(signups.iter().map(|s| s.id.as_str())));
    }

    #[test]
    fn test_progress_interval_cadence() {
        let signups = pairs();
        let mut seen: Vec<u64> = Vec::new();
        let mut observer = |r: &ProgressReport| -> Result<(), ProgressError> {
            seen.push(r.iterations_done);
            Ok(())
        };
        let config = SearchConfig::default()
            .with_convergence_window(u64::MAX)
            .with_progress_every(1_000_000)
            .with_progress_interval(Duration::ZERO);
        let mut engine = SearchEngine::new(
            Scorer::new(&signups, rules(2, 2)),
            config,
            Budget {
                iterations: Some(25),
                time: None,
            },
            5,
        );
        drive(&mut engine, &mut observer, &NeverCancel);

        // One report after init, one per iteration, one at stop
        let mut expected: Vec<u64> = (0..=25).collect();
        expected.push(25);
        assert_eq!(seen, expected);
    }
}
