//! Typed error handling for includecheck.
//!
//! The analysis core itself never fails: every edge case is absorbed
//! locally, with an omitted diagnostic as the worst outcome. These errors
//! cover the surrounding pipeline — reading sources, loading configuration,
//! applying fixes — with structured variants consumers can match on.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for includecheck operations.
#[derive(Error, Debug)]
pub enum IncludeCheckError {
    /// I/O error when reading or writing files
    #[error("I/O error at {path}: {message}")]
    Io {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Front-end error while assembling a translation unit
    #[error("Front-end error in {path}: {message}")]
    Frontend { path: PathBuf, message: String },

    /// Configuration file errors
    #[error("Config error at {path}: {message}")]
    Config { path: PathBuf, message: String },

    /// Fix application errors
    #[error("Fix error: {message}")]
    Fix { message: String },

    /// Invalid argument provided
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl IncludeCheckError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create a front-end error.
    pub fn frontend(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Frontend {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Config {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a fix error.
    pub fn fix(message: impl Into<String>) -> Self {
        Self::Fix {
            message: message.into(),
        }
    }

    /// Create an invalid-argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Check if this is a recoverable error (analysis of other units can
    /// continue).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Frontend { .. } | Self::Config { .. })
    }

    /// Get the path associated with this error, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } => Some(path),
            Self::Frontend { path, .. } => Some(path),
            Self::Config { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Convenience type alias for includecheck results.
pub type IncludeCheckResult<T> = Result<T, IncludeCheckError>;

/// Extension trait for converting std::io::Error with path context.
pub trait IoResultExt<T> {
    /// Add path context to an I/O error.
    fn with_path(self, path: impl Into<PathBuf>) -> IncludeCheckResult<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> IncludeCheckResult<T> {
        self.map_err(|e| IncludeCheckError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error() {
        let err = IncludeCheckError::io(
            PathBuf::from("/test/Widget.m"),
            std::io::Error::new(std::io::ErrorKind::NotFound, "file not found"),
        );
        assert!(matches!(err, IncludeCheckError::Io { .. }));
        assert_eq!(err.path(), Some(&PathBuf::from("/test/Widget.m")));
        assert!(err.to_string().contains("/test/Widget.m"));
    }

    #[test]
    fn test_is_recoverable() {
        assert!(IncludeCheckError::frontend("/a.m", "bad input").is_recoverable());
        assert!(IncludeCheckError::config("/x.toml", "bad key").is_recoverable());
        assert!(!IncludeCheckError::fix("overlap").is_recoverable());
    }

    #[test]
    fn test_io_result_ext() {
        let result: std::io::Result<()> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert!(result.with_path("/missing/Widget.h").is_err());
    }
}
