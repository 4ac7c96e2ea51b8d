use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Spinner shown while an external stage is running. The toolchain's own
/// output goes to the log, not the terminal, so this is the only liveness
/// signal during long `mdrun` calls.
pub fn stage_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

pub fn finish_success(spinner: &ProgressBar, message: &str) {
    spinner.finish_with_message(format!("✓ {}", message));
}

pub fn finish_failure(spinner: &ProgressBar) {
    spinner.abandon_with_message("✗ stage failed".to_string());
}
