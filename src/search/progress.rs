//! Progress reporting and cooperative cancellation.
//!
//! Both hooks are supplied by the caller and invoked synchronously from
//! the search loop. The engine owns no timers and does no I/O; throttling
//! (e.g. a chat message edit rate limit) is the observer's business.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Snapshot passed to a [`ProgressObserver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressReport {
    /// Search iterations completed.
    pub iterations_done: u64,
    /// Iteration budget, if one was set.
    pub iterations_planned: Option<u64>,
    /// Best total score seen so far. Never decreases within a run.
    pub best_score: usize,
    /// Participants in the run.
    pub total_participants: usize,
}

/// Error type an observer may return. Logged and ignored by the engine.
pub type ProgressError = Box<dyn std::error::Error + Send + Sync>;

/// Receives periodic progress reports.
///
/// Implemented for any `FnMut(&ProgressReport) -> Result<(), ProgressError>`.
pub trait ProgressObserver {
    /// Called at the reporting cadence and once when the run stops.
    fn on_progress(&mut self, report: &ProgressReport) -> Result<(), ProgressError>;
}

impl<F> ProgressObserver for F
where
    F: FnMut(&ProgressReport) -> Result<(), ProgressError>,
{
    fn on_progress(&mut self, report: &ProgressReport) -> Result<(), ProgressError> {
        self(report)
    }
}

/// Observer that discards all reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressObserver for NoProgress {
    fn on_progress(&mut self, _report: &ProgressReport) -> Result<(), ProgressError> {
        Ok(())
    }
}

/// Cooperative cancellation check, polled once per iteration.
///
/// Implemented for any `Fn() -> bool`.
pub trait CancelSignal {
    /// Whether the caller wants the run to stop.
    fn is_cancelled(&self) -> bool;
}

impl<F> CancelSignal for F
where
    F: Fn() -> bool,
{
    fn is_cancelled(&self) -> bool {
        self()
    }
}

/// Signal that never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl CancelSignal for NeverCancel {
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// Shareable cancellation flag, e.g. flipped by another thread or a
/// command handler's "stop" button.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates an unset flag.
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl CancelSignal for CancelFlag {
    fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Invokes an observer, logging and swallowing errors and panics.
///
/// Returns whether the observer succeeded.
pub(crate) fn notify(observer: &mut dyn ProgressObserver, report: &ProgressReport) -> bool {
    match catch_unwind(AssertUnwindSafe(|| observer.on_progress(report))) {
        Ok(Ok(())) => true,
        Ok(Err(err)) => {
            tracing::warn!(
                error = %err,
                iterations = report.iterations_done,
                "progress callback failed"
            );
            false
        }
        Err(_) => {
            tracing::warn!(iterations = report.iterations_done, "progress callback panicked");
            false
        }
    }
}
