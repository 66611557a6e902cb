//! Thread-safe job registry.
//!
//! All job state lives behind one mutex. Other components never touch a
//! [`Job`] directly; they go through the typed transitions below, each of
//! which applies its whole change while holding the lock.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use chrono::Utc;

use crate::error::{Error, Result};
use crate::jobs::job::{Job, JobId, JobSnapshot, JobStatus, NewJob};

#[derive(Debug)]
struct RegistryInner {
    next_id: JobId,
    jobs: BTreeMap<JobId, Job>,
}

/// In-memory store of every job known to this process.
#[derive(Debug)]
pub struct JobRegistry {
    inner: Mutex<RegistryInner>,
}

impl Default for JobRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl JobRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(RegistryInner {
                next_id: 1,
                jobs: BTreeMap::new(),
            }),
        }
    }

    // Every critical section leaves the map consistent, so a panic elsewhere
    // never leaves half-written state behind.
    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Insert a new pending job and return its id.
    pub fn create(&self, new: NewJob) -> JobId {
        let mut inner = self.lock();
        Self::insert(&mut inner, new)
    }

    fn insert(inner: &mut RegistryInner, new: NewJob) -> JobId {
        let id = inner.next_id;
        inner.next_id += 1;
        inner.jobs.insert(id, Job::new(id, new));
        id
    }

    /// Insert a new job unless its digest is already held or in flight.
    ///
    /// `held` maps digests of files in `directory` to their names. Jobs that
    /// are pending, downloading, or completed with their output still in
    /// `directory` are checked and the job inserted under one lock
    /// acquisition, so a job finishing concurrently cannot slip past.
    pub fn admit(
        &self,
        new: NewJob,
        held: &HashMap<String, String>,
        directory: &Path,
    ) -> Result<JobId> {
        if let Some(existing) = held.get(&new.content_digest) {
            return Err(Error::DuplicateSubmission(existing.clone()));
        }

        let mut inner = self.lock();
        let holder = inner.jobs.values().find(|job| {
            job.content_digest == new.content_digest
                && match job.status {
                    JobStatus::Pending | JobStatus::Downloading => true,
                    JobStatus::Completed => directory.join(&job.filename).is_file(),
                    JobStatus::Failed(_) => false,
                }
        });
        if let Some(job) = holder {
            return Err(Error::DuplicateSubmission(format!(
                "job {} ({})",
                job.id, job.filename
            )));
        }

        Ok(Self::insert(&mut inner, new))
    }

    /// Apply a partial update to one job atomically.
    pub(crate) fn update<T>(
        &self,
        id: JobId,
        apply: impl FnOnce(&mut Job) -> Result<T>,
    ) -> Result<T> {
        let mut inner = self.lock();
        let job = inner.jobs.get_mut(&id).ok_or(Error::JobNotFound(id))?;
        apply(job)
    }

    fn transition(job: &mut Job, next: JobStatus) -> Result<()> {
        if !job.status.can_transition_to(&next) {
            return Err(Error::InvalidTransition {
                id: job.id,
                from: job.status.to_string(),
                to: next.to_string(),
            });
        }
        job.status = next;
        Ok(())
    }

    /// Move a pending job to `Downloading`, start its clock and return the
    /// segment list to fetch.
    pub fn mark_downloading(&self, id: JobId) -> Result<Arc<[String]>> {
        self.update(id, |job| {
            Self::transition(job, JobStatus::Downloading)?;
            job.started = Some(Instant::now());
            job.started_at = Some(Utc::now());
            Ok(Arc::clone(&job.ordered_segments))
        })
    }

    /// Account for one finished segment fetch, successful or not.
    pub fn record_segment(&self, id: JobId, bytes: u64) -> Result<()> {
        self.update(id, |job| {
            if job.status != JobStatus::Downloading {
                return Err(Error::InvalidTransition {
                    id,
                    from: job.status.to_string(),
                    to: "segment progress".into(),
                });
            }
            if job.segments_done < job.segments_total {
                job.segments_done += 1;
            }
            job.bytes_done += bytes;
            if let Some(started) = job.started {
                let elapsed = started.elapsed().as_secs_f64();
                if elapsed > 0.0 {
                    job.speed_bytes_per_sec = job.bytes_done as f64 / elapsed;
                }
            }
            Ok(())
        })
    }

    /// Replace the target filename after collision resolution.
    pub fn rename(&self, id: JobId, filename: String) -> Result<()> {
        self.update(id, |job| {
            job.filename = filename;
            Ok(())
        })
    }

    /// Mark a job completed with its final name and on-disk size.
    pub fn mark_completed(&self, id: JobId, filename: String, size: u64) -> Result<()> {
        self.update(id, |job| {
            Self::transition(job, JobStatus::Completed)?;
            job.filename = filename;
            job.bytes_done = size;
            Ok(())
        })
    }

    /// Mark a job failed.
    pub fn mark_failed(&self, id: JobId, reason: impl Into<String>) -> Result<()> {
        let reason = reason.into();
        self.update(id, |job| Self::transition(job, JobStatus::Failed(reason)))
    }

    /// Snapshot of one job.
    pub fn get(&self, id: JobId) -> Option<JobSnapshot> {
        self.lock().jobs.get(&id).map(Job::snapshot)
    }

    /// Snapshot of every job, newest first.
    pub fn snapshot_all(&self) -> Vec<JobSnapshot> {
        self.lock().jobs.values().rev().map(Job::snapshot).collect()
    }

    /// Current target filenames of all jobs.
    pub fn filenames(&self) -> Vec<String> {
        self.lock()
            .jobs
            .values()
            .map(|job| job.filename.clone())
            .collect()
    }

    /// Number of registered jobs.
    pub fn len(&self) -> usize {
        self.lock().jobs.len()
    }

    /// Whether no jobs have been registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_job(digest: &str, segments: usize) -> NewJob {
        NewJob {
            source_url: format!("https://cdn.example/{}/index.m3u8", digest),
            filename: "index.mp4".into(),
            segments: (0..segments).map(|i| format!("https://cdn.example/{}.ts", i)).collect(),
            content_digest: digest.into(),
        }
    }

    #[test]
    fn test_ids_are_monotonic() {
        let registry = JobRegistry::new();
        assert_eq!(registry.create(new_job("a", 1)), 1);
        assert_eq!(registry.create(new_job("b", 1)), 2);
        assert_eq!(registry.create(new_job("c", 1)), 3);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_snapshot_newest_first() {
        let registry = JobRegistry::new();
        registry.create(new_job("a", 1));
        registry.create(new_job("b", 1));
        let ids: Vec<_> = registry.snapshot_all().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_admit_rejects_held_digest() {
        let registry = JobRegistry::new();
        let held = HashMap::from([("abc".to_string(), "old.mp4".to_string())]);
        let err = registry
            .admit(new_job("abc", 2), &held, Path::new("downloads"))
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateSubmission(name) if name == "old.mp4"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_admit_rejects_in_flight_digest() {
        let registry = JobRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let held = HashMap::new();
        let first = registry.admit(new_job("abc", 2), &held, dir.path()).unwrap();

        assert!(matches!(
            registry.admit(new_job("abc", 2), &held, dir.path()),
            Err(Error::DuplicateSubmission(_))
        ));
        assert_eq!(registry.len(), 1);

        // A failed job no longer blocks resubmission.
        registry.mark_failed(first, "gone").unwrap();
        assert_eq!(registry.admit(new_job("abc", 2), &held, dir.path()).unwrap(), 2);
    }

    #[test]
    fn test_admit_rejects_job_completed_after_held_scan() {
        let registry = JobRegistry::new();
        let dir = tempfile::tempdir().unwrap();
        let first = registry
            .admit(new_job("abc", 1), &HashMap::new(), dir.path())
            .unwrap();
        registry.mark_downloading(first).unwrap();

        // Held files were scanned while the first job was still running.
        let stale_held = HashMap::new();
        std::fs::write(dir.path().join("index.mp4"), b"media").unwrap();
        registry.mark_completed(first, "index.mp4".into(), 5).unwrap();

        let second = registry.admit(new_job("abc", 1), &stale_held, dir.path());
        assert!(matches!(second, Err(Error::DuplicateSubmission(_))));
        assert_eq!(registry.len(), 1);

        // Once the output is removed the digest is free again.
        std::fs::remove_file(dir.path().join("index.mp4")).unwrap();
        assert_eq!(
            registry.admit(new_job("abc", 1), &stale_held, dir.path()).unwrap(),
            2
        );
    }

    #[test]
    fn test_lifecycle_and_counters() {
        let registry = JobRegistry::new();
        let id = registry.create(new_job("a", 2));

        // Progress before dispatch is rejected.
        assert!(registry.record_segment(id, 10).is_err());

        let segments = registry.mark_downloading(id).unwrap();
        assert_eq!(segments.len(), 2);
        assert!(registry.get(id).unwrap().started_at.is_some());

        registry.record_segment(id, 10).unwrap();
        registry.record_segment(id, 5).unwrap();
        // Extra completions never push the count past the total.
        registry.record_segment(id, 0).unwrap();

        let snap = registry.get(id).unwrap();
        assert_eq!(snap.segments_done, 2);
        assert_eq!(snap.bytes_done, 15);
        assert_eq!(snap.status, JobStatus::Downloading);

        registry.mark_completed(id, "index (1).mp4".into(), 15).unwrap();
        let snap = registry.get(id).unwrap();
        assert_eq!(snap.status, JobStatus::Completed);
        assert_eq!(snap.filename, "index (1).mp4");
        assert_eq!(snap.progress, 100.0);
    }

    #[test]
    fn test_rejects_backward_transitions() {
        let registry = JobRegistry::new();
        let id = registry.create(new_job("a", 1));
        assert!(matches!(
            registry.mark_completed(id, "x.mp4".into(), 0),
            Err(Error::InvalidTransition { .. })
        ));
        registry.mark_downloading(id).unwrap();
        assert!(registry.mark_downloading(id).is_err());
        registry.mark_failed(id, "boom").unwrap();
        assert!(registry.mark_completed(id, "x.mp4".into(), 0).is_err());
        assert_eq!(
            registry.get(id).unwrap().status,
            JobStatus::Failed("boom".into())
        );
    }

    #[test]
    fn test_unknown_job() {
        let registry = JobRegistry::new();
        assert!(registry.get(42).is_none());
        assert!(matches!(
            registry.record_segment(42, 1),
            Err(Error::JobNotFound(42))
        ));
    }

    #[test]
    fn test_concurrent_segment_updates() {
        let registry = Arc::new(JobRegistry::new());
        let id = registry.create(new_job("a", 64));
        registry.mark_downloading(id).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || {
                    for _ in 0..8 {
                        registry.record_segment(id, 3).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let snap = registry.get(id).unwrap();
        assert_eq!(snap.segments_done, 64);
        assert_eq!(snap.bytes_done, 192);
    }
}
