//! Errors for the I/O edges of the crate (settings and score files)
//!
//! The simulation itself never fails; it logs and recovers locally.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Score entries need a non-blank player name
    #[error("invalid player name {0:?}")]
    InvalidName(String),
}

pub type Result<T> = std::result::Result<T, Error>;
