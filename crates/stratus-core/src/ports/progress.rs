//! Progress reporting port
//!
//! The engine reports walk progress as a percentage and never touches the
//! terminal itself; the CLI attaches a progress-bar implementation, tests
//! attach [`NullProgressSink`].

/// Port trait for reporting progress of a walk or transfer
pub trait IProgressSink: Send + Sync {
    /// Reports completion as a percentage in 0.0..=100.0
    fn report(&self, percent: f64);

    /// Marks the tracked work as finished and releases any display
    fn finish(&self);
}

/// A sink that discards all progress reports
pub struct NullProgressSink;

impl IProgressSink for NullProgressSink {
    fn report(&self, _percent: f64) {}
    fn finish(&self) {}
}
