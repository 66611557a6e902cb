//! Live progress reporting.

pub mod broadcaster;

pub use broadcaster::{snapshot_map, Frame, ProgressBroadcaster};
