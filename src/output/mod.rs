//! Output module for console output and progress.
//!
//! Provides:
//! - Colored console output
//! - Progress bars for foreground downloads
//! - Job and duplicate-scan reports

pub mod console;
pub mod progress;
pub mod stats;

pub use console::{
    print_banner, print_config_summary, print_error, print_info, print_success, print_warning,
};
pub use progress::{create_job_bar, create_spinner, update_job_bar};
pub use stats::{print_duplicate_groups, print_job_summary};
