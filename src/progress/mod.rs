//! Progress reporting for pipeline stages.
//!
//! Stages never render anything themselves. They push [`ProgressUpdate`]s
//! through a [`Throttle`], which forwards at most one update per interval
//! (plus the final 100% update) to a [`ProgressReporter`].

mod terminal;

use std::fmt;
use std::time::{Duration, Instant};

pub use terminal::{format_eta, render_line, TerminalProgress};

/// Default minimum time between forwarded updates.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// The three pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Combine,
    Clean,
    Filter,
}

impl Stage {
    /// Label shown in front of the progress bar.
    pub fn label(&self) -> &'static str {
        match self {
            Stage::Combine => "Reading & deleting",
            Stage::Clean => "Cleaning",
            Stage::Filter => "Processing",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Combine => write!(f, "combine"),
            Stage::Clean => write!(f, "clean"),
            Stage::Filter => write!(f, "filter"),
        }
    }
}

/// One progress sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressUpdate {
    pub current: u64,
    pub total: u64,
    pub stage: Stage,
    pub elapsed: Duration,
}

impl ProgressUpdate {
    /// Completion in percent, clamped to 100.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.current as f64 * 100.0 / self.total as f64).min(100.0)
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.total
    }
}

/// Receives throttled progress updates.
pub trait ProgressReporter {
    fn report(&mut self, update: ProgressUpdate);
}

/// Discards all updates.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&mut self, _update: ProgressUpdate) {}
}

/// Collects every update it receives.
#[derive(Debug, Default, Clone)]
pub struct RecordingProgress {
    pub updates: Vec<ProgressUpdate>,
}

impl ProgressReporter for RecordingProgress {
    fn report(&mut self, update: ProgressUpdate) {
        self.updates.push(update);
    }
}

/// Rate-limits updates for one stage.
pub struct Throttle<'a> {
    reporter: &'a mut dyn ProgressReporter,
    stage: Stage,
    start: Instant,
    last: Instant,
    interval: Duration,
    completed: bool,
}

impl<'a> Throttle<'a> {
    pub fn new(reporter: &'a mut dyn ProgressReporter, stage: Stage) -> Self {
        Self::with_interval(reporter, stage, DEFAULT_INTERVAL)
    }

    pub fn with_interval(
        reporter: &'a mut dyn ProgressReporter,
        stage: Stage,
        interval: Duration,
    ) -> Self {
        let start = Instant::now();
        Self {
            reporter,
            stage,
            start,
            last: start,
            interval,
            completed: false,
        }
    }

    /// Offer an update. Forwarded if the interval has passed or the stage
    /// just reached its total.
    pub fn tick(&mut self, current: u64, total: u64) {
        if self.completed {
            return;
        }
        let now = Instant::now();
        let done = current >= total;
        if !done && now.duration_since(self.last) < self.interval {
            return;
        }
        self.last = now;
        self.completed = done;
        self.reporter.report(ProgressUpdate {
            current,
            total,
            stage: self.stage,
            elapsed: now.duration_since(self.start),
        });
    }

    /// Emit the final 100% update unless it was already sent.
    pub fn finish(&mut self, total: u64) {
        self.tick(total, total);
    }
}
