//! Filesystem module.
//!
//! Provides:
//! - Output filename derivation and collision numbering
//! - Path resolution inside the download directory
//! - Listing, renaming and deleting held files

pub mod library;
pub mod naming;
pub mod paths;

pub use library::{delete_file, delete_files, list_files, read_file, rename_file, FileEntry};
pub use naming::{
    auto_number_filename, filename_from_url, next_auto_number, numbered_filename,
    sanitize_filename,
};
pub use paths::{ensure_dir, resolve_in_dir};
