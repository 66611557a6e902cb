//! Filename generation and manipulation.

use url::Url;

use crate::error::{Error, Result};

/// Extension given to assembled playlists.
pub const OUTPUT_EXTENSION: &str = "mp4";

/// Validate and sanitize a client-supplied filename.
///
/// Returns an error if the filename contains path traversal patterns.
pub fn sanitize_filename(name: &str) -> Result<String> {
    let name = name.trim();

    // Reject path traversal attempts
    if name.contains("..") {
        return Err(Error::InvalidFilename(format!(
            "Path traversal detected: '{}'",
            name
        )));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(Error::InvalidFilename(format!(
            "Path separators not allowed in filename: '{}'",
            name
        )));
    }

    if name.contains('\0') {
        return Err(Error::InvalidFilename(format!(
            "Null bytes not allowed in filename: '{}'",
            name
        )));
    }

    let sanitized = replace_reserved(name);

    if sanitized.trim().is_empty() || sanitized.starts_with('.') {
        return Err(Error::InvalidFilename(format!(
            "Filename cannot be empty or hidden: '{}'",
            name
        )));
    }

    Ok(sanitized)
}

fn replace_reserved(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Reduce an arbitrary string to a safe single path component.
///
/// Unlike [`sanitize_filename`] this never fails; unusable input yields an
/// empty string.
fn clean_component(raw: &str) -> String {
    let replaced = replace_reserved(raw)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_");
    replaced.trim_start_matches('.').to_string()
}

/// Derive an output filename from a playlist URL.
///
/// `https://cdn/x/clip.m3u8` becomes `clip.mp4`; an empty path falls back to
/// the host name.
pub fn filename_from_url(url: &Url) -> String {
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or("");
    let playlist_stem = last
        .len()
        .checked_sub(".m3u8".len())
        .and_then(|cut| Some((last.get(..cut)?, last.get(cut..)?)))
        .filter(|(_, ext)| ext.eq_ignore_ascii_case(".m3u8"))
        .map(|(stem, _)| stem);

    let mut name = clean_component(playlist_stem.unwrap_or(last));
    if !name.is_empty() && (playlist_stem.is_some() || !name.contains('.')) {
        name.push('.');
        name.push_str(OUTPUT_EXTENSION);
    }

    if name.is_empty() {
        let host = clean_component(url.host_str().unwrap_or("download"));
        name = format!("{}.{}", host, OUTPUT_EXTENSION);
    }

    name
}

/// Insert a collision counter: `a.mp4` with 2 becomes `a (2).mp4`.
pub fn numbered_filename(filename: &str, counter: u32) -> String {
    match filename.rfind('.') {
        Some(dot_pos) if dot_pos > 0 => {
            let (stem, ext) = filename.split_at(dot_pos);
            format!("{} ({}){}", stem, counter, ext)
        }
        _ => format!("{} ({})", filename, counter),
    }
}

/// Next free number for auto-numbered outputs (`1.mp4`, `2.mp4`, ...).
pub fn next_auto_number<'a>(names: impl IntoIterator<Item = &'a str>) -> u64 {
    let suffix = format!(".{}", OUTPUT_EXTENSION);
    names
        .into_iter()
        .filter_map(|name| name.strip_suffix(suffix.as_str()))
        .filter(|stem| !stem.is_empty() && stem.chars().all(|c| c.is_ascii_digit()))
        .filter_map(|stem| stem.parse::<u64>().ok())
        .max()
        .map_or(1, |max| max + 1)
}

/// Filename for auto-numbered output `n`.
pub fn auto_number_filename(n: u64) -> String {
    format!("{}.{}", n, OUTPUT_EXTENSION)
}
