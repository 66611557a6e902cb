//! M3U8/HLS playlist resolution.

use std::time::Duration;

use crate::config::validate_playlist_url;
use crate::dedup::hash_bytes;
use crate::error::{Error, Result};
use crate::http::Fetcher;

/// A media playlist reduced to what a job needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPlaylist {
    /// URL of the media playlist the segments came from.
    pub playlist_url: String,
    /// Absolute segment URLs in playback order.
    pub segments: Vec<String>,
    /// MD5 digest of the media playlist body.
    pub digest: String,
}

/// Resolve a playlist URL into its ordered segment list.
///
/// Master playlists are followed to their highest-bandwidth variant. Network
/// and parse failures are reported as [`Error::ResolutionFailed`].
pub async fn resolve_playlist(
    fetcher: &dyn Fetcher,
    url: &str,
    timeout: Duration,
) -> Result<ResolvedPlaylist> {
    let url = validate_playlist_url(url)?;

    resolve_validated(fetcher, url.as_str(), timeout)
        .await
        .map_err(|e| match e {
            Error::NoSegments | Error::ResolutionFailed(_) => e,
            other => Error::ResolutionFailed(other.to_string()),
        })
}

async fn resolve_validated(
    fetcher: &dyn Fetcher,
    url: &str,
    timeout: Duration,
) -> Result<ResolvedPlaylist> {
    let content = fetcher.fetch_text(url, timeout).await?;

    let (playlist_url, body, media) = match parse(&content)? {
        m3u8_rs::Playlist::MasterPlaylist(master) => {
            // Select highest quality variant
            let variant = master
                .variants
                .iter()
                .filter(|v| !v.is_i_frame)
                .max_by_key(|v| v.bandwidth)
                .ok_or_else(|| {
                    Error::ResolutionFailed("No variants in master playlist".into())
                })?;

            let variant_url = resolve_url(url, &variant.uri)?;
            tracing::debug!(
                "Selected variant {} ({} bps) from {}",
                variant_url,
                variant.bandwidth,
                url
            );

            let media_content = fetcher.fetch_text(&variant_url, timeout).await?;
            match parse(&media_content)? {
                m3u8_rs::Playlist::MediaPlaylist(media) => (variant_url, media_content, media),
                m3u8_rs::Playlist::MasterPlaylist(_) => {
                    return Err(Error::ResolutionFailed(
                        "Expected media playlist behind variant".into(),
                    ))
                }
            }
        }
        m3u8_rs::Playlist::MediaPlaylist(media) => (url.to_string(), content, media),
    };

    let segments = extract_segments(&playlist_url, &media)?;
    if segments.is_empty() {
        return Err(Error::NoSegments);
    }

    tracing::debug!("Resolved {} segments from {}", segments.len(), playlist_url);

    Ok(ResolvedPlaylist {
        digest: hash_bytes(body.as_bytes()),
        playlist_url,
        segments,
    })
}

fn parse(content: &str) -> Result<m3u8_rs::Playlist> {
    m3u8_rs::parse_playlist_res(content.as_bytes())
        .map_err(|e| Error::ResolutionFailed(format!("Failed to parse playlist: {:?}", e)))
}

/// Extract absolute segment URLs from a media playlist.
fn extract_segments(base_url: &str, playlist: &m3u8_rs::MediaPlaylist) -> Result<Vec<String>> {
    playlist
        .segments
        .iter()
        .map(|seg| resolve_url(base_url, &seg.uri))
        .collect()
}

/// Resolve a potentially relative URL against a base URL.
fn resolve_url(base: &str, path: &str) -> Result<String> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Ok(path.to_string());
    }

    let base_url = url::Url::parse(base)?;
    let resolved = base_url.join(path)?;
    Ok(resolved.to_string())
}
