//! Webb Core - CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

use webb_core::{
    cli::{Args, Command},
    config::{validate_config, Config, NamingMode},
    dedup::find_duplicates,
    engine::Engine,
    error::{exit_codes, Error, Result},
    jobs::JobStatus,
    output::{
        create_job_bar, create_spinner, print_banner, print_config_summary,
        print_duplicate_groups, print_error, print_info, print_job_summary, print_success,
        print_warning, update_job_bar,
    },
    server,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_) | Error::ConfigValidation { .. } | Error::TomlParse(_) => {
                    ExitCode::from(exit_codes::CONFIG_ERROR as u8)
                }
                Error::InvalidInput(_)
                | Error::UrlParse(_)
                | Error::ResolutionFailed(_)
                | Error::NoSegments
                | Error::Http(_) => ExitCode::from(exit_codes::NETWORK_ERROR as u8),
                Error::DuplicateSubmission(_)
                | Error::SegmentFetch(_)
                | Error::Assembly(_)
                | Error::JobFailed { .. } => ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8),
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    print_banner();

    // Load configuration
    let mut config = if args.config.exists() {
        Config::load(&args.config)?
    } else {
        print_warning(&format!(
            "Configuration file not found: {}",
            args.config.display()
        ));
        print_info("Using default configuration with CLI arguments");
        Config::default()
    };

    // Merge CLI arguments into config
    args.merge_into_config(&mut config);

    validate_config(&config)?;

    match args.command(&config) {
        Command::Serve => serve(config).await,
        Command::Download { url, naming } => download(config, &url, naming).await,
        Command::FindDuplicates => scan_duplicates(config).await,
    }
}

async fn serve(config: Config) -> Result<()> {
    print_config_summary(&config, true);

    let engine = Arc::new(Engine::from_config(&config)?);
    server::serve(engine, &config.server, config.download.naming).await
}

/// Download one playlist in the foreground.
async fn download(config: Config, url: &str, naming: NamingMode) -> Result<()> {
    print_config_summary(&config, false);

    let engine = Engine::from_config(&config)?;

    let spinner = create_spinner("Resolving playlist...");
    let submitted = engine.submit(url, naming).await;
    spinner.finish_and_clear();
    let id = submitted?;

    let bar = create_job_bar(0, "");
    let job = engine.wait_for(id, |job| update_job_bar(&bar, job)).await?;
    bar.finish_and_clear();

    print_job_summary(&job);
    engine.shutdown();

    match job.status {
        JobStatus::Failed(reason) => Err(Error::JobFailed { id, reason }),
        _ => {
            print_success(&format!(
                "Saved {}",
                engine.directory().join(&job.filename).display()
            ));
            Ok(())
        }
    }
}

async fn scan_duplicates(config: Config) -> Result<()> {
    let dir = config.download.directory.clone();
    print_info(&format!("Scanning {} for duplicates...", dir.display()));

    let spinner = create_spinner("Hashing files...");
    let groups = tokio::task::spawn_blocking(move || find_duplicates(&dir))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?;
    spinner.finish_and_clear();

    print_duplicate_groups(&groups?);
    Ok(())
}
