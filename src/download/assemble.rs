//! Reassembly of fetched segments into one output file.

use std::path::{Path, PathBuf};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::download::segments::SegmentOutcome;
use crate::error::{Error, Result};
use crate::fs::{ensure_dir, numbered_filename};

/// Highest collision counter tried before giving up.
const MAX_COLLISION_COUNTER: u32 = 10_000;

/// An output file created exclusively for one job.
#[derive(Debug)]
pub struct ClaimedOutput {
    file: File,
    pub filename: String,
    pub path: PathBuf,
}

/// A finished output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledFile {
    pub filename: String,
    pub path: PathBuf,
    /// Real on-disk size after writing.
    pub size: u64,
    /// Segments left out because their fetch failed.
    pub skipped: usize,
}

fn assembly_error(context: &str, e: impl std::fmt::Display) -> Error {
    Error::Assembly(format!("{}: {}", context, e))
}

/// Create `desired` in `dir`, or the first free `name (n).ext` variant.
///
/// Creation uses create-new semantics, so two jobs can never claim the same
/// name even when they finish at the same time.
pub async fn claim_output(dir: &Path, desired: &str) -> Result<ClaimedOutput> {
    ensure_dir(dir)
        .await
        .map_err(|e| assembly_error("Failed to create output directory", e))?;

    for counter in 0..=MAX_COLLISION_COUNTER {
        let filename = if counter == 0 {
            desired.to_string()
        } else {
            numbered_filename(desired, counter)
        };
        let path = dir.join(&filename);

        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => {
                if counter > 0 {
                    tracing::debug!("{} exists, writing {} instead", desired, filename);
                }
                return Ok(ClaimedOutput {
                    file,
                    filename,
                    path,
                });
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(assembly_error(&format!("Failed to create {}", filename), e)),
        }
    }

    Err(Error::Assembly(format!(
        "No free filename for {} after {} attempts",
        desired, MAX_COLLISION_COUNTER
    )))
}

/// Write fetched segments into a claimed output, in order.
///
/// Failed segments are skipped, so the file is shorter than the source when
/// any fetch failed. A partially written file is removed on error.
pub async fn write_segments(
    output: ClaimedOutput,
    outcomes: &[SegmentOutcome],
) -> Result<AssembledFile> {
    let ClaimedOutput {
        file,
        filename,
        path,
    } = output;

    let result = write_all(file, outcomes).await;
    let skipped = match result {
        Ok(skipped) => skipped,
        Err(e) => {
            let _ = tokio::fs::remove_file(&path).await;
            return Err(assembly_error(&format!("Failed to write {}", filename), e));
        }
    };

    let size = tokio::fs::metadata(&path)
        .await
        .map_err(|e| assembly_error("Failed to stat output", e))?
        .len();

    if skipped > 0 {
        tracing::warn!(
            "{}: {} of {} segments missing, output is truncated",
            filename,
            skipped,
            outcomes.len()
        );
    }

    Ok(AssembledFile {
        filename,
        path,
        size,
        skipped,
    })
}

async fn write_all(file: File, outcomes: &[SegmentOutcome]) -> std::io::Result<usize> {
    let mut writer = BufWriter::new(file);
    let mut skipped = 0;

    for outcome in outcomes {
        match outcome {
            SegmentOutcome::Fetched(data) => writer.write_all(data).await?,
            SegmentOutcome::Failed(_) => skipped += 1,
        }
    }

    writer.flush().await?;
    writer.into_inner().sync_all().await?;
    Ok(skipped)
}

/// Claim a unique output name and write the segments into it.
pub async fn assemble(
    dir: &Path,
    desired: &str,
    outcomes: &[SegmentOutcome],
) -> Result<AssembledFile> {
    let output = claim_output(dir, desired).await?;
    write_segments(output, outcomes).await
}
