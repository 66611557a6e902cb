//! Output naming mode definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a new job's output file is named.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingMode {
    /// Derive the name from the playlist URL (default).
    #[default]
    Source,
    /// Use the next free number: `1.mp4`, `2.mp4`, ...
    AutoNumber,
}

impl fmt::Display for NamingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamingMode::Source => write!(f, "source"),
            NamingMode::AutoNumber => write!(f, "auto_number"),
        }
    }
}

impl FromStr for NamingMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "source" => Ok(NamingMode::Source),
            "auto_number" | "auto" => Ok(NamingMode::AutoNumber),
            _ => Err(format!("Unknown naming mode: {}", s)),
        }
    }
}
