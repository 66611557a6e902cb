//! Console output utilities.

use console::style;

use crate::config::Config;

/// Print an info message.
pub fn print_info(message: &str) {
    println!("{} {}", style("INFO").cyan().bold(), message);
}

/// Print a success message.
pub fn print_success(message: &str) {
    println!("{} {}", style("OK").green().bold(), message);
}

/// Print a warning message.
pub fn print_warning(message: &str) {
    println!("{} {}", style("WARN").yellow().bold(), message);
}

/// Print an error message.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("ERROR").red().bold(), message);
}

/// Print the application banner.
pub fn print_banner() {
    let banner = r#"
╔═══════════════════════════════════════════════════════╗
║     Webb Core                                         ║
║     Segmented playlist downloads with live progress   ║
╚═══════════════════════════════════════════════════════╝
"#;
    println!("{}", style(banner).cyan());
}

/// Print configuration summary.
pub fn print_config_summary(config: &Config, serving: bool) {
    println!();
    println!("{}", style("Configuration:").bold());
    if serving {
        println!("  Listen:    http://{}", config.bind_address());
    }
    println!("  Directory: {}", config.download.directory.display());
    println!(
        "  Segments:  {} at a time per job",
        config.download.max_concurrent_segments
    );
    println!("  Jobs:      {} at a time", config.download.max_concurrent_jobs);
    println!("  Naming:    {}", config.download.naming);
    println!();
}
