//! Job dispatch: drives queued jobs through fetch and assembly.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::config::DownloadConfig;
use crate::download::assemble::{claim_output, write_segments, AssembledFile};
use crate::download::segments::fetch_segments;
use crate::error::{Error, Result};
use crate::http::Fetcher;
use crate::jobs::{JobId, JobRegistry};

/// Longest failure reason stored on a job, in characters.
const MAX_FAILURE_MESSAGE: usize = 50;

/// Consumes job ids from the intake queue and runs each job to completion.
pub struct Dispatcher {
    registry: Arc<JobRegistry>,
    fetcher: Arc<dyn Fetcher>,
    directory: PathBuf,
    max_concurrent_segments: usize,
    segment_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<JobRegistry>,
        fetcher: Arc<dyn Fetcher>,
        settings: &DownloadConfig,
    ) -> Self {
        Self {
            registry,
            fetcher,
            directory: settings.directory.clone(),
            max_concurrent_segments: settings.max_concurrent_segments,
            segment_timeout: settings.segment_timeout(),
        }
    }

    /// Start `workers` consumers sharing one intake queue.
    ///
    /// With one worker, jobs run strictly one after another in intake order.
    /// Workers exit once every sender of the queue is dropped.
    pub fn spawn(
        self,
        intake: mpsc::UnboundedReceiver<JobId>,
        workers: usize,
    ) -> Vec<JoinHandle<()>> {
        let dispatcher = Arc::new(self);
        let intake = Arc::new(Mutex::new(intake));

        (0..workers.max(1))
            .map(|worker| {
                let dispatcher = Arc::clone(&dispatcher);
                let intake = Arc::clone(&intake);
                tokio::spawn(async move { dispatcher.worker_loop(worker, intake).await })
            })
            .collect()
    }

    async fn worker_loop(
        self: Arc<Self>,
        worker: usize,
        intake: Arc<Mutex<mpsc::UnboundedReceiver<JobId>>>,
    ) {
        tracing::debug!("Dispatch worker {} started", worker);
        loop {
            let next = intake.lock().await.recv().await;
            let Some(id) = next else {
                break;
            };
            Arc::clone(&self).run_job(id).await;
        }
        tracing::debug!("Dispatch worker {} stopped", worker);
    }

    /// Run one job and record its terminal status.
    ///
    /// The job body runs in its own task so a panic marks only that job
    /// failed.
    pub async fn run_job(self: Arc<Self>, id: JobId) {
        let this = Arc::clone(&self);
        let outcome = tokio::spawn(async move { this.drive(id).await }).await;

        let result = match outcome {
            Ok(Ok(file)) => {
                tracing::info!(
                    "Job {} completed: {} ({} bytes)",
                    id,
                    file.path.display(),
                    file.size
                );
                self.registry.mark_completed(id, file.filename, file.size)
            }
            Ok(Err(e)) => {
                tracing::error!("Job {} failed: {}", id, e);
                self.registry.mark_failed(id, failure_message(&e.to_string()))
            }
            Err(join_error) => {
                tracing::error!("Job {} aborted: {}", id, join_error);
                self.registry
                    .mark_failed(id, failure_message(&join_error.to_string()))
            }
        };

        if let Err(e) = result {
            tracing::warn!("Could not record final status of job {}: {}", id, e);
        }
    }

    async fn drive(&self, id: JobId) -> Result<AssembledFile> {
        let segments = self.registry.mark_downloading(id)?;
        let desired = self
            .registry
            .get(id)
            .ok_or(Error::JobNotFound(id))?
            .filename;

        tracing::info!("Job {}: fetching {} segments", id, segments.len());

        let registry = &self.registry;
        let outcomes = fetch_segments(
            &*self.fetcher,
            &segments,
            self.max_concurrent_segments,
            self.segment_timeout,
            |_, outcome| {
                if let Err(e) = registry.record_segment(id, outcome.payload_len()) {
                    tracing::warn!("Job {}: progress update rejected: {}", id, e);
                }
            },
        )
        .await;

        let output = claim_output(&self.directory, &desired).await?;
        self.registry.rename(id, output.filename.clone())?;
        write_segments(output, &outcomes).await
    }
}

/// Bound a failure reason to a short human-readable summary.
pub fn failure_message(reason: &str) -> String {
    if reason.chars().count() <= MAX_FAILURE_MESSAGE {
        return reason.to_string();
    }
    let truncated: String = reason.chars().take(MAX_FAILURE_MESSAGE).collect();
    format!("{}...", truncated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::mock::MockFetcher;
    use crate::jobs::{JobStatus, NewJob};

    struct Fixture {
        registry: Arc<JobRegistry>,
        fetcher: Arc<MockFetcher>,
        dir: tempfile::TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                registry: Arc::new(JobRegistry::new()),
                fetcher: Arc::new(MockFetcher::new()),
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn dispatcher(&self) -> Arc<Dispatcher> {
            let settings = DownloadConfig {
                directory: self.dir.path().to_path_buf(),
                ..DownloadConfig::default()
            };
            let fetcher: Arc<dyn Fetcher> = self.fetcher.clone();
            Arc::new(Dispatcher::new(Arc::clone(&self.registry), fetcher, &settings))
        }

        /// Register a job whose segment `i` is `i + 1` copies of byte `i`.
        fn job(&self, name: &str, segments: usize) -> JobId {
            let urls: Vec<String> = (0..segments)
                .map(|i| format!("https://cdn.example/{}/seg{}.ts", name, i))
                .collect();
            for (i, url) in urls.iter().enumerate() {
                self.fetcher.serve(url, vec![i as u8; i + 1]);
            }
            self.registry.create(NewJob {
                source_url: format!("https://cdn.example/{}/index.m3u8", name),
                filename: format!("{}.mp4", name),
                segments: urls,
                content_digest: name.to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_all_segments_succeed() {
        let fx = Fixture::new();
        let id = fx.job("clip", 5);

        fx.dispatcher().run_job(id).await;

        let snap = fx.registry.get(id).unwrap();
        assert_eq!(snap.status, JobStatus::Completed);
        assert_eq!(snap.segments_done, 5);
        assert_eq!(snap.total_segments, 5);
        // 1 + 2 + 3 + 4 + 5
        assert_eq!(snap.bytes_done, 15);
        let written = std::fs::read(fx.dir.path().join("clip.mp4")).unwrap();
        assert_eq!(written.len(), 15);
        assert_eq!(&written[..3], &[0, 1, 1]);
    }

    #[tokio::test]
    async fn test_failed_segment_still_completes() {
        let fx = Fixture::new();
        let id = fx.job("clip", 5);
        fx.fetcher.fail("https://cdn.example/clip/seg2.ts", "connection reset");

        fx.dispatcher().run_job(id).await;

        let snap = fx.registry.get(id).unwrap();
        assert_eq!(snap.status, JobStatus::Completed);
        assert_eq!(snap.segments_done, 5);
        // 15 minus the three bytes of segment 2
        assert_eq!(snap.bytes_done, 12);
        let written = std::fs::read(fx.dir.path().join("clip.mp4")).unwrap();
        assert_eq!(written, vec![0, 1, 1, 3, 3, 3, 3, 4, 4, 4, 4, 4]);
    }

    #[tokio::test]
    async fn test_collision_renames_job() {
        let fx = Fixture::new();
        std::fs::write(fx.dir.path().join("clip.mp4"), b"old").unwrap();
        let id = fx.job("clip", 1);

        fx.dispatcher().run_job(id).await;

        let snap = fx.registry.get(id).unwrap();
        assert_eq!(snap.filename, "clip (1).mp4");
        assert_eq!(snap.bytes_done, 1);
    }

    #[tokio::test]
    async fn test_assembly_failure_marks_failed() {
        let fx = Fixture::new();
        // A regular file where the download directory should be.
        let blocked = fx.dir.path().join("blocked");
        std::fs::write(&blocked, b"").unwrap();
        let settings = DownloadConfig {
            directory: blocked,
            ..DownloadConfig::default()
        };
        let fetcher: Arc<dyn Fetcher> = fx.fetcher.clone();
        let dispatcher = Arc::new(Dispatcher::new(Arc::clone(&fx.registry), fetcher, &settings));
        let id = fx.job("clip", 2);

        dispatcher.run_job(id).await;

        match fx.registry.get(id).unwrap().status {
            JobStatus::Failed(reason) => {
                assert!(reason.starts_with("Assembly failed"));
                assert!(reason.chars().count() <= MAX_FAILURE_MESSAGE + 3);
            }
            other => panic!("expected failure, got {}", other),
        }
    }

    #[tokio::test]
    async fn test_spawned_workers_drain_queue() {
        let fx = Fixture::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let handles = Dispatcher::new(
            Arc::clone(&fx.registry),
            fx.fetcher.clone(),
            &DownloadConfig {
                directory: fx.dir.path().to_path_buf(),
                ..DownloadConfig::default()
            },
        )
        .spawn(rx, 1);

        let a = fx.job("a", 2);
        let b = fx.job("b", 3);
        tx.send(a).unwrap();
        tx.send(b).unwrap();
        drop(tx);

        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(fx.registry.get(a).unwrap().status, JobStatus::Completed);
        assert_eq!(fx.registry.get(b).unwrap().status, JobStatus::Completed);
    }

    #[test]
    fn test_failure_message_truncation() {
        assert_eq!(failure_message("short"), "short");
        let long = "x".repeat(80);
        let message = failure_message(&long);
        assert_eq!(message.len(), MAX_FAILURE_MESSAGE + 3);
        assert!(message.ends_with("..."));
    }
}
