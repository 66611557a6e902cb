//! Operations on the files held in the download directory.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::fs::paths::resolve_in_dir;

/// One file in the download directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    pub name: String,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    pub mime: String,
}

/// List regular files in `dir`, most recently modified first.
pub async fn list_files(dir: &Path) -> Result<Vec<FileEntry>> {
    let mut files = Vec::new();
    if !tokio::fs::try_exists(dir).await? {
        return Ok(files);
    }

    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if !metadata.is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        let mime = mime_guess::from_path(&name)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        files.push(FileEntry {
            name,
            size: metadata.len(),
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            mime,
        });
    }

    files.sort_by(|a, b| b.modified.cmp(&a.modified).then_with(|| a.name.cmp(&b.name)));
    Ok(files)
}

/// Read a whole file along with its guessed MIME type.
pub async fn read_file(dir: &Path, name: &str) -> Result<(Vec<u8>, String)> {
    let path = resolve_in_dir(dir, name)?;
    let data = match tokio::fs::read(&path).await {
        Ok(data) => data,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::FileNotFound(name.to_string()))
        }
        Err(e) => return Err(Error::Io(e)),
    };
    let mime = mime_guess::from_path(&path)
        .first_or_octet_stream()
        .essence_str()
        .to_string();
    Ok((data, mime))
}

/// Rename a file; fails if the source is missing or the target exists.
pub async fn rename_file(dir: &Path, old_name: &str, new_name: &str) -> Result<()> {
    let old_path = resolve_in_dir(dir, old_name)?;
    let new_path = resolve_in_dir(dir, new_name)?;

    if !tokio::fs::try_exists(&old_path).await? {
        return Err(Error::FileNotFound(old_name.to_string()));
    }
    if tokio::fs::try_exists(&new_path).await? {
        return Err(Error::InvalidFilename(format!(
            "Target already exists: '{}'",
            new_name
        )));
    }

    tokio::fs::rename(&old_path, &new_path).await?;
    tracing::info!("Renamed {} -> {}", old_path.display(), new_path.display());
    Ok(())
}

/// Delete one file.
pub async fn delete_file(dir: &Path, name: &str) -> Result<()> {
    let path = resolve_in_dir(dir, name)?;
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {
            tracing::info!("Deleted {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(Error::FileNotFound(name.to_string()))
        }
        Err(e) => Err(Error::Io(e)),
    }
}

/// Delete several files, skipping missing ones. Returns how many were removed.
pub async fn delete_files(dir: &Path, names: &[String]) -> Result<usize> {
    let mut deleted = 0;
    for name in names {
        match delete_file(dir, name).await {
            Ok(()) => deleted += 1,
            Err(Error::FileNotFound(_)) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(deleted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_list_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"1234").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let files = list_files(dir.path()).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "a.mp4");
        assert_eq!(files[0].size, 4);
        assert_eq!(files[0].mime, "video/mp4");
        assert!(files[0].modified.is_some());
    }

    #[tokio::test]
    async fn test_list_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(list_files(&dir.path().join("nope")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_read_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"1234").unwrap();

        let (data, mime) = read_file(dir.path(), "a.mp4").await.unwrap();
        assert_eq!(data, b"1234");
        assert_eq!(mime, "video/mp4");

        assert!(matches!(
            read_file(dir.path(), "missing.mp4").await,
            Err(Error::FileNotFound(_))
        ));
        assert!(matches!(
            read_file(dir.path(), "../a.mp4").await,
            Err(Error::InvalidFilename(_))
        ));
    }

    #[tokio::test]
    async fn test_rename_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("taken.mp4"), b"y").unwrap();

        assert!(rename_file(dir.path(), "a.mp4", "taken.mp4").await.is_err());
        assert!(matches!(
            rename_file(dir.path(), "missing.mp4", "b.mp4").await,
            Err(Error::FileNotFound(_))
        ));
        assert!(rename_file(dir.path(), "a.mp4", "../b.mp4").await.is_err());

        rename_file(dir.path(), "a.mp4", "b.mp4").await.unwrap();
        assert!(dir.path().join("b.mp4").exists());
        assert!(!dir.path().join("a.mp4").exists());
    }

    #[tokio::test]
    async fn test_delete_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"y").unwrap();

        assert!(matches!(
            delete_file(dir.path(), "c.mp4").await,
            Err(Error::FileNotFound(_))
        ));

        let names = vec!["a.mp4".to_string(), "b.mp4".to_string(), "c.mp4".to_string()];
        assert_eq!(delete_files(dir.path(), &names).await.unwrap(), 2);
        assert!(list_files(dir.path()).await.unwrap().is_empty());
    }
}
