//! Job model and registry.

pub mod job;
pub mod registry;

pub use job::{Job, JobId, JobSnapshot, JobStatus, NewJob};
pub use registry::JobRegistry;
