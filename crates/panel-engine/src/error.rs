use std::{io, result::Result as StdResult};

use thiserror::Error;

/// Convenient result type for the engine crate.
pub type Result<T> = StdResult<T, Error>;

/// Unified error type for the panel engine.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O failure while performing a system operation.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The main loop has stopped and no longer accepts jobs.
    #[error("UI channel closed")]
    ChannelClosed,

    /// The worker pool was shut down before the job was submitted.
    #[error("worker pool is shut down")]
    PoolShutdown,

    /// An operation needing a tokio runtime was called outside of one.
    #[error("no tokio runtime available")]
    NoRuntime,

    /// A settings key that is empty or escapes the settings directory.
    #[error("invalid settings key: {0:?}")]
    InvalidKey(String),

    /// A user action with nothing to run.
    #[error("empty command")]
    EmptyCommand,

    /// File watcher setup failure.
    #[error("file watch error: {0}")]
    Watch(#[from] notify::Error),

    /// Redirect to a page id that does not exist.
    #[error("unknown page: {0}")]
    UnknownPage(String),

    /// The panel document could not be loaded.
    #[error("{}", .0.pretty())]
    Config(#[from] config::Error),
}
