//! Job intake: ties resolution, duplicate detection, naming and dispatch
//! together behind one handle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::{Config, NamingMode};
use crate::dedup::directory_digests;
use crate::download::{resolve_playlist, Dispatcher};
use crate::error::{Error, Result};
use crate::fs::{auto_number_filename, filename_from_url, list_files, next_auto_number};
use crate::http::{Fetcher, HttpClient};
use crate::jobs::{JobId, JobRegistry, JobSnapshot, NewJob};
use crate::progress::{Frame, ProgressBroadcaster};

/// How often [`Engine::wait_for`] samples the registry.
const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A running download engine.
///
/// Owns the registry, the intake queue, the dispatch workers and the
/// progress broadcaster. Background tasks stop when the engine is dropped.
pub struct Engine {
    registry: Arc<JobRegistry>,
    fetcher: Arc<dyn Fetcher>,
    broadcaster: ProgressBroadcaster,
    intake: mpsc::UnboundedSender<JobId>,
    directory: PathBuf,
    playlist_timeout: Duration,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl Engine {
    /// Start an engine that talks to the network through reqwest.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = HttpClient::new(config.download.user_agent.clone())?;
        Ok(Self::start(config, Arc::new(client)))
    }

    /// Start an engine on the current tokio runtime.
    pub fn start(config: &Config, fetcher: Arc<dyn Fetcher>) -> Self {
        let registry = Arc::new(JobRegistry::new());
        let (intake, rx) = mpsc::unbounded_channel();

        let dispatcher =
            Dispatcher::new(Arc::clone(&registry), Arc::clone(&fetcher), &config.download);
        let mut tasks = dispatcher.spawn(rx, config.download.max_concurrent_jobs);

        let broadcaster = ProgressBroadcaster::new(Arc::clone(&registry), &config.progress);
        tasks.push(broadcaster.spawn());

        tracing::info!(
            "Engine started: directory {}, {} segment(s) per job, {} job(s) at a time",
            config.download.directory.display(),
            config.download.max_concurrent_segments,
            config.download.max_concurrent_jobs.max(1)
        );

        Self {
            registry,
            fetcher,
            broadcaster,
            intake,
            directory: config.download.directory.clone(),
            playlist_timeout: config.download.playlist_timeout(),
            tasks: Mutex::new(tasks),
        }
    }

    pub fn registry(&self) -> &Arc<JobRegistry> {
        &self.registry
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Subscribe to progress frames.
    ///
    /// Returns the current snapshot together with a receiver for every later
    /// frame, so a new observer never starts with an empty view.
    pub fn subscribe(&self) -> Result<(Frame, broadcast::Receiver<Frame>)> {
        let rx = self.broadcaster.subscribe();
        let frame = self.broadcaster.current_frame()?;
        Ok((frame, rx))
    }

    /// Validate, resolve and enqueue a playlist download.
    ///
    /// Every rejection happens before a job is created; on success the job
    /// is `Pending` and will be picked up by a dispatch worker.
    pub async fn submit(&self, url: &str, naming: NamingMode) -> Result<JobId> {
        let url = url.trim();
        tracing::info!("Submission: {}", url);

        let playlist = resolve_playlist(&*self.fetcher, url, self.playlist_timeout).await?;
        let held = self.held_digests().await?;

        let filename = match naming {
            NamingMode::Source => filename_from_url(&url::Url::parse(url)?),
            NamingMode::AutoNumber => self.next_numbered_name().await?,
        };

        let id = self.registry.admit(
            NewJob {
                source_url: url.to_string(),
                filename: filename.clone(),
                segments: playlist.segments,
                content_digest: playlist.digest,
            },
            &held,
            &self.directory,
        )?;

        self.intake
            .send(id)
            .map_err(|_| Error::Config("Dispatcher is not running".to_string()))?;

        tracing::info!("Job {} queued as {}", id, filename);
        Ok(id)
    }

    /// Digests of the files already in the download directory.
    ///
    /// Completed jobs are checked by the registry itself at admission.
    async fn held_digests(&self) -> Result<HashMap<String, String>> {
        let dir = self.directory.clone();
        tokio::task::spawn_blocking(move || directory_digests(&dir))
            .await
            .map_err(|e| Error::Io(std::io::Error::other(e)))?
    }

    async fn next_numbered_name(&self) -> Result<String> {
        let mut names: Vec<String> = list_files(&self.directory)
            .await?
            .into_iter()
            .map(|entry| entry.name)
            .collect();
        names.extend(self.registry.filenames());
        let n = next_auto_number(names.iter().map(String::as_str));
        Ok(auto_number_filename(n))
    }

    /// Wait until a job reaches a terminal state.
    ///
    /// `on_update` sees every sampled snapshot, including the final one.
    pub async fn wait_for(
        &self,
        id: JobId,
        mut on_update: impl FnMut(&JobSnapshot),
    ) -> Result<JobSnapshot> {
        let mut ticker = tokio::time::interval(WAIT_POLL_INTERVAL);
        loop {
            ticker.tick().await;
            let snapshot = self.registry.get(id).ok_or(Error::JobNotFound(id))?;
            on_update(&snapshot);
            if snapshot.status.is_terminal() {
                return Ok(snapshot);
            }
        }
    }

    /// Stop the dispatch workers and the broadcaster.
    ///
    /// A job that is mid-download is abandoned.
    pub fn shutdown(&self) {
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        for task in tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
