//! Webb Core - segmented playlist download service
//!
//! This library turns M3U8/HLS playlist URLs into single media files while
//! tracking many downloads at once and reporting their progress live.
//!
//! # Features
//!
//! - Master playlist resolution to the highest-bandwidth variant
//! - Bounded-concurrency segment fetching with in-order reassembly
//! - Duplicate detection by content digest before any download starts
//! - Live progress snapshots for any number of observers
//! - HTTP API for submission, progress and file management
//!
//! # Example
//!
//! ```no_run
//! use webb_core::{Config, Engine, NamingMode};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Engine::from_config(&Config::default())?;
//!     let id = engine
//!         .submit("https://cdn.example/show/index.m3u8", NamingMode::Source)
//!         .await?;
//!     let job = engine.wait_for(id, |_| {}).await?;
//!     println!("{} -> {}", job.url, job.status);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod dedup;
pub mod download;
pub mod engine;
pub mod error;
pub mod fs;
pub mod http;
pub mod jobs;
pub mod output;
pub mod progress;
pub mod server;

// Re-exports for convenience
pub use config::{Config, NamingMode};
pub use engine::Engine;
pub use error::{Error, Result};
pub use jobs::{JobId, JobRegistry, JobSnapshot, JobStatus};
pub use progress::ProgressBroadcaster;
