//! Error types.
//!
//! Only failures that end the process are errors. Console binding and mode
//! handling report status values instead and never reach this module.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("failed to initialize window runtime: {0}")]
    Runtime(String),

    #[error("failed to create window: {0}")]
    WindowCreation(String),

    #[error("event loop failed: {0}")]
    EventLoop(String),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to determine config directory")]
    NoConfigDir,

    #[error("failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter {0:?}: {1}")]
    Filter(String, String),

    #[error("failed to install log subscriber: {0}")]
    Init(String),
}
