//! Directory scanning for duplicate files.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::Serialize;

use crate::dedup::hash::hash_file;
use crate::error::Result;

/// A set of files in one directory sharing identical content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub digest: String,
    pub size: u64,
    pub files: Vec<String>,
}

/// Non-empty regular files in `dir` as `(name, size)` pairs.
fn non_empty_files(dir: &Path) -> Result<Vec<(String, u64)>> {
    let mut files = Vec::new();
    if !dir.exists() {
        return Ok(files);
    }

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let metadata = entry.metadata()?;
        if !metadata.is_file() || metadata.len() == 0 {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            files.push((name.to_string(), metadata.len()));
        }
    }

    Ok(files)
}

/// Digest every non-empty file in `dir`, keyed by digest.
///
/// Files with identical content collapse onto one entry.
pub fn directory_digests(dir: &Path) -> Result<HashMap<String, String>> {
    let mut digests = HashMap::new();
    for (name, _) in non_empty_files(dir)? {
        let digest = hash_file(&dir.join(&name))?;
        digests.insert(digest, name);
    }
    Ok(digests)
}

/// Find groups of identical files in `dir`.
///
/// Files are bucketed by size first; only sizes shared by two or more files
/// are hashed.
pub fn find_duplicates(dir: &Path) -> Result<Vec<DuplicateGroup>> {
    let mut by_size: HashMap<u64, Vec<String>> = HashMap::new();
    for (name, size) in non_empty_files(dir)? {
        by_size.entry(size).or_default().push(name);
    }

    let mut by_digest: BTreeMap<String, DuplicateGroup> = BTreeMap::new();
    for (size, names) in by_size {
        if names.len() < 2 {
            continue;
        }
        for name in names {
            let digest = hash_file(&dir.join(&name))?;
            by_digest
                .entry(digest.clone())
                .or_insert_with(|| DuplicateGroup {
                    digest,
                    size,
                    files: Vec::new(),
                })
                .files
                .push(name);
        }
    }

    let groups = by_digest
        .into_values()
        .filter(|group| group.files.len() > 1)
        .map(|mut group| {
            group.files.sort();
            group
        })
        .collect();

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedup::hash::hash_bytes;

    #[test]
    fn test_directory_digests_skips_empty_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"first").unwrap();
        std::fs::write(dir.path().join("empty.mp4"), b"").unwrap();
        std::fs::create_dir(dir.path().join("nested")).unwrap();

        let digests = directory_digests(dir.path()).unwrap();
        assert_eq!(digests.len(), 1);
        assert_eq!(digests.get(&hash_bytes(b"first")).map(String::as_str), Some("a.mp4"));
    }

    #[test]
    fn test_directory_digests_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let digests = directory_digests(&dir.path().join("absent")).unwrap();
        assert!(digests.is_empty());
    }

    #[test]
    fn test_find_duplicates_groups_same_content() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"same bytes").unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"same bytes").unwrap();
        // Same size, different content.
        std::fs::write(dir.path().join("c.mp4"), b"diff bytes").unwrap();
        std::fs::write(dir.path().join("d.mp4"), b"unique and longer").unwrap();

        let groups = find_duplicates(dir.path()).unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].files, vec!["a.mp4".to_string(), "b.mp4".to_string()]);
        assert_eq!(groups[0].size, 10);
        assert_eq!(groups[0].digest, hash_bytes(b"same bytes"));
    }

    #[test]
    fn test_find_duplicates_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"one").unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"three").unwrap();
        assert!(find_duplicates(dir.path()).unwrap().is_empty());
    }
}
