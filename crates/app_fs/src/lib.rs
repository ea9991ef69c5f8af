//! Flipview File System Abstraction Layer
//!
//! Provides the collaborators the interaction core talks to:
//! - Path splitting that accepts both `/` and `\` separators
//! - `FileSink`: deleting image files (trash or unlink)
//! - `TagStore`: per-directory tag persistence (JSON sidecar files)
//! - In-memory sink/store for hosts without a file system and for tests
//! - Drop-source path extraction

pub mod path_utils;
mod file_sink;
mod tag_store;
mod memory;
mod drop_source;

pub use path_utils::{dir_of, name_of};
pub use file_sink::{FileSink, SystemFileSink};
pub use tag_store::{TagStore, SidecarTagStore, TagMap};
pub use memory::{MemoryFileSink, MemoryTagStore};
pub use drop_source::{extract_image_paths, is_image_path, IMAGE_EXTENSIONS};

use thiserror::Error;

/// File system errors
#[derive(Error, Debug)]
pub enum FsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed tag file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Path not found: {0}")]
    NotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[cfg(feature = "trash-support")]
    #[error("Trash error: {0}")]
    Trash(#[from] trash::Error),

    #[error("Background task failed: {0}")]
    Task(String),

    /// Failure injected by the in-memory collaborators
    #[error("Simulated failure: {0}")]
    Simulated(String),
}

pub type Result<T> = std::result::Result<T, FsError>;
