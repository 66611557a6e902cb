//! Bounded-concurrency segment fetching.

use std::time::Duration;

use futures::stream::{self, StreamExt};

use crate::http::Fetcher;

/// Result of fetching one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SegmentOutcome {
    Fetched(Vec<u8>),
    Failed(String),
}

impl SegmentOutcome {
    /// Payload size; zero for failures.
    pub fn payload_len(&self) -> u64 {
        match self {
            SegmentOutcome::Fetched(data) => data.len() as u64,
            SegmentOutcome::Failed(_) => 0,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, SegmentOutcome::Failed(_))
    }
}

/// Fetch every segment with at most `max_concurrent` requests in flight.
///
/// The returned vector is aligned with `segments` regardless of completion
/// order. A failed segment never cancels its siblings; it is reported as
/// [`SegmentOutcome::Failed`]. `on_complete` runs once per segment as each
/// fetch finishes, with the segment index.
pub async fn fetch_segments(
    fetcher: &dyn Fetcher,
    segments: &[String],
    max_concurrent: usize,
    timeout: Duration,
    mut on_complete: impl FnMut(usize, &SegmentOutcome),
) -> Vec<SegmentOutcome> {
    let mut slots: Vec<Option<SegmentOutcome>> = vec![None; segments.len()];

    let mut completed = stream::iter(segments.iter().cloned().enumerate())
        .map(|(index, url): (usize, String)| async move {
            let outcome = match fetcher.fetch_bytes(&url, timeout).await {
                Ok(data) => SegmentOutcome::Fetched(data),
                Err(e) => {
                    tracing::warn!("Segment {} failed ({}): {}", index, url, e);
                    SegmentOutcome::Failed(e.to_string())
                }
            };
            (index, outcome)
        })
        .buffer_unordered(max_concurrent.max(1));

    while let Some((index, outcome)) = completed.next().await {
        on_complete(index, &outcome);
        slots[index] = Some(outcome);
    }

    slots
        .into_iter()
        .map(|slot| slot.unwrap_or_else(|| SegmentOutcome::Failed("not fetched".into())))
        .collect()
}
