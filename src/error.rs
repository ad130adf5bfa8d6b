//! Error types for the file tail engine.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for tail operations.
///
/// [`Error::InvalidArgument`] is returned synchronously from constructors.
/// Every other variant surfaces through the `error` event of the session
/// that produced it and is fatal to that open cycle, except [`Error::Close`]
/// which is reported while the close sequence still runs to completion.
#[derive(Error, Debug)]
pub enum Error {
    /// Bad construction input, rejected before any I/O is attempted.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Opening the tailed file failed.
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Querying the current file size failed.
    #[error("failed to stat file: {source}")]
    Stat {
        #[source]
        source: std::io::Error,
    },

    /// A chunk read failed.
    #[error("read failed at offset {offset}: {source}")]
    Read {
        offset: u64,
        #[source]
        source: std::io::Error,
    },

    /// Releasing the file handle failed.
    #[error("failed to close file handle: {source}")]
    Close {
        #[source]
        source: std::io::Error,
    },

    /// Strict UTF-8 decoding of a chunk failed.
    #[error("UTF-8 decoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// File watching errors from the notify crate.
    #[error("file watcher error: {0}")]
    Watcher(#[from] notify::Error),
}

/// A convenient Result type for tail operations.
pub type Result<T> = std::result::Result<T, Error>;
