//! Download pipeline.
//!
//! This module provides:
//! - M3U8/HLS playlist resolution
//! - Bounded-concurrency segment fetching
//! - Order-preserving reassembly into a uniquely named file
//! - The dispatcher that drives queued jobs through the pipeline

pub mod assemble;
pub mod dispatcher;
pub mod m3u8;
pub mod segments;

pub use assemble::{assemble, AssembledFile};
pub use dispatcher::Dispatcher;
pub use m3u8::{resolve_playlist, ResolvedPlaylist};
pub use segments::{fetch_segments, SegmentOutcome};
