use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Target does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Target is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("{0}")]
    Other(String),
}

/// Classification of a recovered, per-item failure.
///
/// None of these abort a job; they are counted and surfaced in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemErrorKind {
    AccessDenied,
    UnexpectedNonEmpty,
    TransientIo,
}

impl ItemErrorKind {
    pub fn classify(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => ItemErrorKind::AccessDenied,
            _ => ItemErrorKind::TransientIo,
        }
    }
}

impl std::fmt::Display for ItemErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemErrorKind::AccessDenied => f.write_str("access denied"),
            ItemErrorKind::UnexpectedNonEmpty => f.write_str("directory not empty"),
            ItemErrorKind::TransientIo => f.write_str("I/O error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_permission_denied() {
        let err = io::Error::new(io::ErrorKind::PermissionDenied, "locked");
        assert_eq!(ItemErrorKind::classify(&err), ItemErrorKind::AccessDenied);
    }

    #[test]
    fn test_classify_other_is_transient() {
        let err = io::Error::new(io::ErrorKind::Interrupted, "interrupted");
        assert_eq!(ItemErrorKind::classify(&err), ItemErrorKind::TransientIo);
    }
}
