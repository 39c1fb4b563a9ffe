//! Progress reporting for export runs.
//!
//! The pipeline reports through a [`ProgressSink`] wrapped in a
//! [`ProgressReporter`] that enforces two ordering guarantees: the
//! reported percent never decreases, and the completion event fires
//! exactly once.

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

/// Counters accumulated over one export run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportStats {
    /// Objects surviving the filter pipeline.
    pub objects: usize,
    /// Field rows emitted.
    pub fields: usize,
    /// Fields dropped by explicit field-level permissions.
    pub filtered_fields: usize,
    /// Objects dropped by the system-object stage.
    pub filtered_system_objects: usize,
    /// Objects dropped by the permission stage.
    pub filtered_by_permissions: usize,
}

/// Receiver for progress notifications.
///
/// Implementations must tolerate being called many times in quick
/// succession; notifications are fire-and-forget.
pub trait ProgressSink: Send + Sync {
    /// Called with a human-readable status, overall percent, and the
    /// counters so far.
    fn update(&self, text: &str, percent: u8, stats: &ExportStats);
}

impl<F> ProgressSink for F
where
    F: Fn(&str, u8, &ExportStats) + Send + Sync,
{
    fn update(&self, text: &str, percent: u8, stats: &ExportStats) {
        self(text, percent, stats)
    }
}

/// Sink that discards all notifications.
#[derive(Debug, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn update(&self, _text: &str, _percent: u8, _stats: &ExportStats) {}
}

/// The slice of overall progress occupied by the describe loop.
#[derive(Debug, Clone, Copy)]
pub struct ProgressRange {
    /// Percent when the first object starts.
    pub start: u8,
    /// Percent when the last object finishes.
    pub end: u8,
}

impl Default for ProgressRange {
    fn default() -> Self {
        Self { start: 10, end: 90 }
    }
}

impl ProgressRange {
    /// Scale `done` of `total` into this range.
    pub fn scale(&self, done: usize, total: usize) -> u8 {
        if total == 0 {
            return self.end;
        }
        let span = f64::from(self.end.saturating_sub(self.start));
        let fraction = done as f64 / total as f64;
        self.start + (fraction * span).round() as u8
    }
}

/// Wraps a sink, clamping percent to be non-decreasing and reporting
/// completion at most once.
pub(crate) struct ProgressReporter<'a> {
    sink: &'a dyn ProgressSink,
    last_percent: AtomicU8,
    completed: AtomicBool,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(sink: &'a dyn ProgressSink) -> Self {
        Self {
            sink,
            last_percent: AtomicU8::new(0),
            completed: AtomicBool::new(false),
        }
    }

    /// Report progress; percent is clamped to never go backwards.
    pub fn report(&self, text: &str, percent: u8, stats: &ExportStats) {
        let percent = self.last_percent.fetch_max(percent, Ordering::Relaxed).max(percent);
        self.sink.update(text, percent, stats);
    }

    /// Report the terminal event at 100 percent; later calls are ignored.
    pub fn complete(&self, text: &str, stats: &ExportStats) {
        if !self.completed.swap(true, Ordering::Relaxed) {
            self.report(text, 100, stats);
        }
    }
}
