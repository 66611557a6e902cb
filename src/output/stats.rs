//! Job and duplicate-scan reports.

use console::style;
use indicatif::HumanBytes;

use crate::dedup::DuplicateGroup;
use crate::jobs::{JobSnapshot, JobStatus};

/// Print the outcome of one job.
pub fn print_job_summary(job: &JobSnapshot) {
    println!();
    println!("{}", style(format!("Job {}:", job.id)).bold());
    println!("  File:     {}", job.filename);
    println!("  Source:   {}", job.url);
    let status = match &job.status {
        JobStatus::Completed => style(job.status.to_string()).green(),
        JobStatus::Failed(_) => style(job.status.to_string()).red(),
        _ => style(job.status.to_string()).yellow(),
    };
    println!("  Status:   {}", status);
    println!("  Segments: {}/{}", job.segments_done, job.total_segments);
    println!("  Size:     {}", HumanBytes(job.bytes_done));
}

/// Print groups of identical files.
pub fn print_duplicate_groups(groups: &[DuplicateGroup]) {
    println!();
    if groups.is_empty() {
        println!("{}", style("No duplicate files found.").green());
        return;
    }

    println!("{}", style("═".repeat(50)).dim());
    for group in groups {
        println!(
            "{} {} ({} each)",
            style("Digest").bold(),
            group.digest,
            HumanBytes(group.size)
        );
        for file in &group.files {
            println!("  {}", file);
        }
    }
    let redundant: usize = groups.iter().map(|g| g.files.len().saturating_sub(1)).sum();
    println!("{}", style("═".repeat(50)).dim());
    println!(
        "{} group(s), {} redundant file(s)",
        style(groups.len()).yellow(),
        style(redundant).yellow()
    );
}
