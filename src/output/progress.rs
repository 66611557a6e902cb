//! Progress bar utilities.

use indicatif::{HumanBytes, ProgressBar, ProgressStyle};

use crate::jobs::JobSnapshot;

/// Create a spinner for long-running operations.
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}

/// Create a segment-count progress bar for one job.
pub fn create_job_bar(total_segments: u64, filename: &str) -> ProgressBar {
    let bar = ProgressBar::new(total_segments);
    bar.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} {prefix} [{bar:40.cyan/blue}] {pos}/{len} segments {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );
    bar.set_prefix(filename.to_string());
    bar
}

/// Reflect a job snapshot on its bar.
pub fn update_job_bar(bar: &ProgressBar, job: &JobSnapshot) {
    bar.set_length(job.total_segments as u64);
    bar.set_position(job.segments_done as u64);
    bar.set_prefix(job.filename.clone());
    bar.set_message(format!(
        "{} ({}/s)",
        HumanBytes(job.bytes_done),
        HumanBytes(job.speed as u64)
    ));
}
