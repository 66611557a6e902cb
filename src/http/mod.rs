//! Outbound HTTP.
//!
//! This module provides:
//! - The `Fetcher` trait used by the resolver and the segment pool
//! - A reqwest client with a fixed User-Agent and per-request timeouts

pub mod client;
#[cfg(test)]
pub mod mock;

pub use client::{Fetcher, HttpClient};
