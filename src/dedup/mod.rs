//! Deduplication module.
//!
//! Provides:
//! - MD5 content hashing for buffers and files
//! - Directory digest index for the submission pre-check
//! - Size-bucketed duplicate file scanning

pub mod hash;
pub mod scan;

pub use hash::{hash_bytes, hash_file};
pub use scan::{directory_digests, find_duplicates, DuplicateGroup};
