//! Configuration module for webb-core.
//!
//! This module handles:
//! - Loading configuration from TOML files
//! - Output naming modes
//! - Configuration and submission URL validation

pub mod loader;
pub mod modes;
pub mod validation;

pub use loader::{Config, DownloadConfig, ProgressConfig, ServerConfig};
pub use modes::NamingMode;
pub use validation::{validate_config, validate_playlist_url};
