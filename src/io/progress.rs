//! Batch progress display for manifest processing

use indicatif::{ProgressBar, ProgressStyle};

use crate::io::configuration::PROGRESS_BAR_WIDTH;

/// Single batch bar counting completed samples
///
/// Safe to share across worker threads; the underlying bar synchronises
/// internally.
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a bar sized for `total` samples
    pub fn new(total: usize) -> Self {
        let template = format!(
            "[{{elapsed_precise}}] Samples: [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
        );
        let style = ProgressStyle::default_bar()
            .template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar());

        let bar = ProgressBar::new(total as u64);
        bar.set_style(style);

        Self { bar }
    }

    /// Record one finished sample and show its name
    pub fn sample_done(&self, name: &str) {
        self.bar.set_message(name.to_string());
        self.bar.inc(1);
    }

    /// Close out the bar
    pub fn finish(&self) {
        self.bar.finish_with_message("done");
    }
}
