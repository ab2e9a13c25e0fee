//! Terminal progress bar behind the progress port

use indicatif::{ProgressBar, ProgressStyle};

use stratus_core::ports::IProgressSink;

/// Scale factor: the bar tracks hundredths of a percent
const BAR_SCALE: u64 = 100;

/// Renders engine progress as an indicatif bar
pub struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    pub fn new(message: &'static str) -> Self {
        let bar = ProgressBar::new(100 * BAR_SCALE);
        bar.set_style(
            ProgressStyle::with_template("{msg} [{bar:30}] {percent:>3}%")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.set_message(message);
        Self { bar }
    }
}

impl IProgressSink for TerminalProgress {
    fn report(&self, percent: f64) {
        let position = (percent.clamp(0.0, 100.0) * BAR_SCALE as f64) as u64;
        self.bar.set_position(position);
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}
