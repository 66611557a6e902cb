//! Configuration and input validation logic.

use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use crate::config::loader::Config;
use crate::error::{Error, Result};

/// Marks a URL as an M3U8 playlist, in any letter case.
static PLAYLIST_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.m3u8").expect("playlist url regex"));

/// Minimum length for the User-Agent header.
const MIN_USER_AGENT_LENGTH: usize = 8;

/// Upper bound on segment fetches in flight per job.
const MAX_SEGMENT_CONCURRENCY: usize = 256;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    if config.server.host.trim().is_empty() {
        return Err(invalid("server.host", "Host cannot be empty".into()));
    }

    let download = &config.download;
    if download.max_concurrent_segments == 0
        || download.max_concurrent_segments > MAX_SEGMENT_CONCURRENCY
    {
        return Err(invalid(
            "download.max_concurrent_segments",
            format!(
                "Must be between 1 and {} (got {})",
                MAX_SEGMENT_CONCURRENCY, download.max_concurrent_segments
            ),
        ));
    }

    if download.max_concurrent_jobs == 0 {
        return Err(invalid(
            "download.max_concurrent_jobs",
            "At least one dispatch worker is required".into(),
        ));
    }

    if download.playlist_timeout_secs == 0 {
        return Err(invalid(
            "download.playlist_timeout_secs",
            "Timeout must be at least one second".into(),
        ));
    }

    if download.segment_timeout_secs == 0 {
        return Err(invalid(
            "download.segment_timeout_secs",
            "Timeout must be at least one second".into(),
        ));
    }

    validate_user_agent(&download.user_agent)?;

    if config.progress.interval_ms == 0 {
        return Err(invalid(
            "progress.interval_ms",
            "Interval must be positive".into(),
        ));
    }

    if config.progress.subscriber_buffer == 0 {
        return Err(invalid(
            "progress.subscriber_buffer",
            "Buffer must hold at least one frame".into(),
        ));
    }

    Ok(())
}

/// Validate the User-Agent string.
pub fn validate_user_agent(user_agent: &str) -> Result<()> {
    if user_agent.trim().len() < MIN_USER_AGENT_LENGTH {
        return Err(invalid(
            "download.user_agent",
            format!(
                "User agent must be at least {} characters (got {})",
                MIN_USER_AGENT_LENGTH,
                user_agent.trim().len()
            ),
        ));
    }
    Ok(())
}

/// Check that `input` is an absolute http(s) URL pointing at an M3U8 playlist.
pub fn validate_playlist_url(input: &str) -> Result<Url> {
    let input = input.trim();
    if input.is_empty() {
        return Err(Error::InvalidInput("URL is empty".into()));
    }

    let url = Url::parse(input).map_err(|e| Error::InvalidInput(format!("{}: {}", e, input)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidInput(format!(
            "Unsupported scheme '{}': {}",
            url.scheme(),
            input
        )));
    }

    if !PLAYLIST_PATTERN.is_match(input) {
        return Err(Error::InvalidInput(format!(
            "Not an M3U8 playlist URL: {}",
            input
        )));
    }

    Ok(url)
}

fn invalid(field: &str, message: String) -> Error {
    Error::ConfigValidation {
        field: field.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_zero_caps_rejected() {
        let mut config = Config::default();
        config.download.max_concurrent_segments = 0;
        assert!(matches!(
            validate_config(&config),
            Err(Error::ConfigValidation { field, .. }) if field == "download.max_concurrent_segments"
        ));

        let mut config = Config::default();
        config.download.max_concurrent_jobs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = Config::default();
        config.progress.interval_ms = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_short_user_agent_rejected() {
        assert!(validate_user_agent("curl").is_err());
        assert!(validate_user_agent("webb-core/0.1").is_ok());
    }

    #[test]
    fn test_valid_playlist_urls() {
        assert!(validate_playlist_url("https://cdn.example.com/live/index.m3u8").is_ok());
        assert!(validate_playlist_url("http://cdn.example.com/a.M3U8?token=1").is_ok());
        assert!(validate_playlist_url("  https://x.example/v.m3u8  ").is_ok());
    }

    #[test]
    fn test_invalid_playlist_urls() {
        for input in [
            "",
            "not a url",
            "https://cdn.example.com/video.mp4",
            "ftp://cdn.example.com/index.m3u8",
            "/relative/index.m3u8",
        ] {
            assert!(
                matches!(validate_playlist_url(input), Err(Error::InvalidInput(_))),
                "expected rejection for {:?}",
                input
            );
        }
    }
}
