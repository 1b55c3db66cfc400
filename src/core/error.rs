//! Error types for interaction jobs and the pools that run them.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::worker_pool::PoolError;

/// Serializable mirror of the `std::io::ErrorKind` values a job can hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoCategory {
    /// The file does not exist.
    NotFound,
    /// The file exists but cannot be read or written.
    PermissionDenied,
    /// The file extension is not a recognized model format.
    UnsupportedFormat,
    /// Any other I/O failure.
    Other,
}

impl From<io::ErrorKind> for IoCategory {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::NotFound => Self::NotFound,
            io::ErrorKind::PermissionDenied => Self::PermissionDenied,
            io::ErrorKind::Unsupported | io::ErrorKind::InvalidInput => Self::UnsupportedFormat,
            _ => Self::Other,
        }
    }
}

impl From<IoCategory> for io::ErrorKind {
    fn from(category: IoCategory) -> Self {
        match category {
            IoCategory::NotFound => Self::NotFound,
            IoCategory::PermissionDenied => Self::PermissionDenied,
            IoCategory::UnsupportedFormat => Self::Unsupported,
            IoCategory::Other => Self::Other,
        }
    }
}

/// Errors produced by interaction jobs, the analysis entry points and pools.
///
/// Every variant is serializable so a failure captured inside a worker can be
/// carried through the result channel as a value and re-raised unchanged on
/// the receiving side.
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionError {
    /// Pair construction needs at least two source models.
    #[error("at least two source models are required, got {found}")]
    InsufficientSources {
        /// Number of source models supplied.
        found: usize,
    },

    /// A model or medium file could not be opened, read or written.
    #[error("{}: {message}", .path.display())]
    Io {
        /// Category of the failure.
        category: IoCategory,
        /// File the failure relates to.
        path: PathBuf,
        /// Human readable description.
        message: String,
    },

    /// A file was read but its content is not a valid model.
    #[error("invalid model {}: {message}", .path.display())]
    InvalidModel {
        /// File the model was read from.
        path: PathBuf,
        /// What was wrong with it.
        message: String,
    },

    /// The job panicked inside a worker.
    #[error("job panicked in worker {worker}: {message}")]
    WorkerPanic {
        /// Worker that ran the job.
        worker: usize,
        /// Panic payload rendered as text.
        message: String,
    },

    /// The job stopped early because its pool was terminated.
    #[error("job cancelled by pool shutdown")]
    Cancelled,

    /// Pool lifecycle or protocol failure.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl InteractionError {
    /// Build an I/O error for `path` from a `std::io::Error`.
    pub fn io(path: impl AsRef<Path>, err: &io::Error) -> Self {
        Self::Io {
            category: err.kind().into(),
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        }
    }

    /// Build the error raised for a file with an unrecognized extension.
    pub fn unsupported_format(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let extension = path
            .extension()
            .map_or_else(|| "<none>".to_string(), |ext| ext.to_string_lossy().into_owned());
        Self::Io {
            category: IoCategory::UnsupportedFormat,
            path: path.to_path_buf(),
            message: format!("unrecognized model file extension `{extension}`"),
        }
    }

    /// Build an invalid-model error for `path`.
    pub fn invalid_model(path: impl AsRef<Path>, message: impl Into<String>) -> Self {
        Self::InvalidModel {
            path: path.as_ref().to_path_buf(),
            message: message.into(),
        }
    }

    /// True for the I/O category: missing files, unreadable files and
    /// unrecognized extensions.
    #[must_use]
    pub const fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }

    /// The I/O category, when this is an I/O error.
    #[must_use]
    pub const fn io_category(&self) -> Option<IoCategory> {
        match self {
            Self::Io { category, .. } => Some(*category),
            _ => None,
        }
    }
}

impl From<InteractionError> for io::Error {
    fn from(err: InteractionError) -> Self {
        let kind = err
            .io_category()
            .map_or(io::ErrorKind::Other, io::ErrorKind::from);
        Self::new(kind, err)
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
