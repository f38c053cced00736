// src/error.rs
//! Error layers of a run. Only configuration errors are fatal; the other
//! three are caught at their boundary and logged.

use std::path::PathBuf;

use thiserror::Error;

/// Missing or malformed settings. Aborts the run before any network I/O.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Portal collection failure. The run continues with an empty candidate list.
#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("http request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("could not decode alert feed: {0}")]
    Feed(#[from] serde_json::Error),
    #[error("invalid portal url: {0}")]
    Url(String),
    #[error("building http client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Per-message delivery failure. Logged, never propagated out of `Notifier::send`.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("telegram connection error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("telegram error ({status}): {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

/// Store write failure. The run still counts as completed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("encoding history: {0}")]
    Encode(#[from] serde_json::Error),
}
