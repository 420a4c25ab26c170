//! Error types shared by the record stores and the workflow layer.

use std::path::PathBuf;

/// Errors surfaced by the tracker core.
///
/// Business-rule violations are not errors here; they come back as
/// [`crate::coaching::RequestOutcome`] or [`Rejection`] values so the caller
/// can show the message inline.
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Rejected(#[from] Rejection),
}

impl TrackerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TrackerError::Io {
            path: path.into(),
            source,
        }
    }
}

/// A user-facing validation failure. The message text is shown verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct Rejection {
    pub message: String,
}

impl Rejection {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_displays_message_verbatim() {
        let err: TrackerError = Rejection::new("Login already exists.").into();
        assert_eq!(err.to_string(), "Login already exists.");
    }

    #[test]
    fn io_error_names_the_path() {
        let err = TrackerError::io(
            "data/usersData.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("data/usersData.txt"));
    }
}
