use crate::ui::theme;
use crate::ui::Icons;
use indicatif::{HumanDuration, ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;

/// Progress over the batches of a bulk load
pub struct LoadProgress {
    pb: ProgressBar,
}

impl LoadProgress {
    /// Bar for a load whose batch count is known up front
    pub fn new(total_batches: usize) -> Self {
        Self::styled(
            ProgressBar::new(total_batches as u64),
            "{spinner} [{bar:30}] {pos}/{len} batches {msg}",
        )
    }

    /// Counter for a remote sync, which ends when the source runs dry
    pub fn open_ended() -> Self {
        Self::styled(ProgressBar::new_spinner(), "{spinner} {pos} pages {msg}")
    }

    fn styled(pb: ProgressBar, template: &str) -> Self {
        if !console::Term::stdout().is_term() {
            return Self { pb: ProgressBar::hidden() };
        }
        if let Ok(style) = ProgressStyle::with_template(template) {
            pb.set_style(style.progress_chars("=> "));
        }
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }

    pub fn batch_done(&self, written: usize, skipped: usize) {
        self.pb.inc(1);
        self.pb.set_message(format!("{} written, {} skipped", written, skipped));
    }

    pub fn finish_with_summary(&self, duration: Duration, written: usize, skipped: usize) {
        self.pb.finish_and_clear();
        println!();
        println!(
            "{} {}",
            Icons::OK.style(theme().success.clone()),
            format!("Complete in {}", HumanDuration(duration)).style(theme().success.clone())
        );
        println!(
            "  {} {}  {} {}",
            Icons::WRITTEN.style(theme().accent.clone()),
            written,
            Icons::SKIPPED.style(theme().accent.clone()),
            skipped
        );
    }
}

pub struct Spinner {
    pb: ProgressBar,
}

impl Spinner {
    pub fn new(message: &str) -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_message(message.to_string());
        if console::Term::stdout().is_term() {
            pb.enable_steady_tick(Duration::from_millis(100));
        }
        Self { pb }
    }

    pub fn finish_with_message(&self, msg: &str) {
        self.pb.finish_with_message(msg.to_string());
    }
}
