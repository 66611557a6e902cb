//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, NamingMode};

/// Segmented playlist download service.
#[derive(Parser, Debug)]
#[command(
    name = "webb-core",
    version,
    about = "Download HLS playlists into single media files",
    long_about = "Serves an HTTP API that queues M3U8/HLS downloads and streams their progress.\n\n\
                  Can also download a single playlist in the foreground or scan the\n\
                  download directory for duplicate files."
)]
pub struct Args {
    /// Download one playlist in the foreground and exit.
    #[arg(short, long, conflicts_with = "find_duplicates")]
    pub url: Option<String>,

    /// Name the output with the next free number (1.mp4, 2.mp4, ...).
    #[arg(long)]
    pub auto_number: bool,

    /// Print groups of identical files in the download directory and exit.
    #[arg(long)]
    pub find_duplicates: bool,

    /// Interface for the HTTP server.
    #[arg(long)]
    pub host: Option<String>,

    /// Port for the HTTP server.
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory for downloaded files.
    #[arg(short = 'd', long = "directory")]
    pub download_directory: Option<PathBuf>,

    /// Segment requests in flight per job.
    #[arg(long = "max-segments")]
    pub max_segments: Option<usize>,

    /// Jobs downloaded at the same time.
    #[arg(long = "max-jobs")]
    pub max_jobs: Option<usize>,

    /// User-Agent sent with every request.
    #[arg(short = 'a', long = "user-agent", env = "WEBB_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

/// What the process was asked to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Serve,
    Download { url: String, naming: NamingMode },
    FindDuplicates,
}

impl Args {
    /// The requested mode of operation.
    ///
    /// `config` is the merged configuration; foreground downloads take its
    /// naming mode, so `--auto-number` and the config file both apply.
    pub fn command(&self, config: &Config) -> Command {
        if let Some(url) = &self.url {
            Command::Download {
                url: url.clone(),
                naming: config.download.naming,
            }
        } else if self.find_duplicates {
            Command::FindDuplicates
        } else {
            Command::Serve
        }
    }

    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(&self, config: &mut Config) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }

        if let Some(port) = self.port {
            config.server.port = port;
        }

        if let Some(dir) = &self.download_directory {
            config.download.directory = dir.clone();
        }

        if let Some(max) = self.max_segments {
            config.download.max_concurrent_segments = max;
        }

        if let Some(max) = self.max_jobs {
            config.download.max_concurrent_jobs = max;
        }

        if let Some(user_agent) = &self.user_agent {
            config.download.user_agent = user_agent.clone();
        }

        // Only override the file's naming when the flag is set
        if self.auto_number {
            config.download.naming = NamingMode::AutoNumber;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serve_by_default() {
        let args = Args::parse_from(["webb-core"]);
        assert_eq!(args.command(&Config::default()), Command::Serve);
        assert_eq!(args.config, PathBuf::from("config.toml"));
    }

    #[test]
    fn test_foreground_download() {
        let args = Args::parse_from([
            "webb-core",
            "--url",
            "https://cdn.example/a.m3u8",
            "--auto-number",
        ]);
        let mut config = Config::default();
        args.merge_into_config(&mut config);
        assert_eq!(
            args.command(&config),
            Command::Download {
                url: "https://cdn.example/a.m3u8".into(),
                naming: NamingMode::AutoNumber,
            }
        );
    }

    #[test]
    fn test_foreground_download_uses_configured_naming() {
        let args = Args::parse_from(["webb-core", "--url", "https://cdn.example/a.m3u8"]);
        let mut config: Config =
            toml::from_str("[download]\nnaming = \"auto_number\"\n").unwrap();
        args.merge_into_config(&mut config);

        assert_eq!(
            args.command(&config),
            Command::Download {
                url: "https://cdn.example/a.m3u8".into(),
                naming: NamingMode::AutoNumber,
            }
        );

        assert_eq!(
            args.command(&Config::default()),
            Command::Download {
                url: "https://cdn.example/a.m3u8".into(),
                naming: NamingMode::Source,
            }
        );
    }

    #[test]
    fn test_url_conflicts_with_duplicate_scan() {
        let result = Args::try_parse_from([
            "webb-core",
            "--url",
            "https://cdn.example/a.m3u8",
            "--find-duplicates",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_merge_overrides_only_given_values() {
        let args = Args::parse_from([
            "webb-core",
            "-d",
            "/tmp/media",
            "--max-segments",
            "4",
            "--port",
            "9000",
        ]);
        let mut config = Config::default();
        args.merge_into_config(&mut config);

        assert_eq!(config.download.directory, PathBuf::from("/tmp/media"));
        assert_eq!(config.download.max_concurrent_segments, 4);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.download.max_concurrent_jobs, 1);
        assert_eq!(config.download.naming, NamingMode::Source);
    }
}
