//! Walk progress accounting
//!
//! A [`ProgressCounter`] is the explicit accumulator threaded through the
//! recursive walks: one shared `current` count against a precomputed
//! total, reported as a percentage through the [`IProgressSink`] port.

use stratus_core::ports::IProgressSink;

/// Counts comparisons against a precomputed total and reports percentages
///
/// The reported value is clamped to 99.99% so the display never reaches
/// 100% before the walk truly finishes; a zero total reports nothing.
pub struct ProgressCounter<'a> {
    current: usize,
    total: usize,
    sink: &'a dyn IProgressSink,
}

impl<'a> ProgressCounter<'a> {
    pub fn new(total: usize, sink: &'a dyn IProgressSink) -> Self {
        Self {
            current: 0,
            total,
            sink,
        }
    }

    /// Records one comparison and reports the updated percentage
    pub fn tick(&mut self) {
        self.current += 1;
        if self.total == 0 {
            return;
        }
        let fraction = (self.current as f64 / self.total as f64).min(0.9999);
        self.sink.report(fraction * 100.0);
    }

    /// Completes the tracked walk
    pub fn finish(self) {
        self.sink.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingSink {
        reports: Mutex<Vec<f64>>,
        finished: Mutex<bool>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                reports: Mutex::new(Vec::new()),
                finished: Mutex::new(false),
            }
        }
    }

    impl IProgressSink for RecordingSink {
        fn report(&self, percent: f64) {
            self.reports.lock().unwrap().push(percent);
        }
        fn finish(&self) {
            *self.finished.lock().unwrap() = true;
        }
    }

    #[test]
    fn test_reports_fraction_of_total() {
        let sink = RecordingSink::new();
        let mut counter = ProgressCounter::new(4, &sink);
        counter.tick();
        counter.tick();

        let reports = sink.reports.lock().unwrap().clone();
        assert_eq!(reports, vec![25.0, 50.0]);
    }

    #[test]
    fn test_never_reaches_hundred_before_finish() {
        let sink = RecordingSink::new();
        let mut counter = ProgressCounter::new(2, &sink);
        counter.tick();
        counter.tick();
        counter.tick(); // overshoot: more comparisons than the total predicted

        let reports = sink.reports.lock().unwrap().clone();
        assert!(reports.iter().all(|p| *p < 100.0));
        assert!(*reports.last().unwrap() > 99.0);
    }

    #[test]
    fn test_zero_total_reports_nothing() {
        let sink = RecordingSink::new();
        let mut counter = ProgressCounter::new(0, &sink);
        counter.tick();
        assert!(sink.reports.lock().unwrap().is_empty());

        counter.finish();
        assert!(*sink.finished.lock().unwrap());
    }
}
