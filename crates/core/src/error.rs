//! Error types for the epgedit domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Core errors describe bad input or impossible rebuilds; collaborator
//! failures (storage, transport) live in [`StoreError`] and never leak into
//! [`Error`].

use thiserror::Error;

/// The top-level error type for core schedule operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A document, rule set or request could not be parsed into the data model.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// An edited sequence referenced a program the catalog does not contain.
    #[error("Program ID {program_id} for channel {channel_id} not found in schedule")]
    ProgramNotFound {
        channel_id: String,
        program_id: String,
    },

    /// Original filler plus the editor's adjustment went below zero.
    #[error("Filler for program {program_id} on channel {channel_id} would be {minutes} minutes")]
    NegativeFiller {
        channel_id: String,
        program_id: String,
        minutes: i64,
    },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedInput(message.into())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::MalformedInput(e.to_string())
    }
}

// --- Collaborator errors ---

/// Failures of the storage collaborator behind [`crate::store::ScheduleStore`].
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("{collaborator} unavailable: {reason}")]
    Unavailable {
        collaborator: String,
        reason: String,
    },

    #[error("Object not found: {0}")]
    NotFound(String),

    /// The collaborator returned content the core could not interpret.
    #[error("Stored object {key} is malformed: {reason}")]
    Corrupt { key: String, reason: String },
}

impl StoreError {
    pub fn unavailable(collaborator: impl Into<String>, reason: impl ToString) -> Self {
        StoreError::Unavailable {
            collaborator: collaborator.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_not_found_names_channel_and_program() {
        let err = Error::ProgramNotFound {
            channel_id: "C1".into(),
            program_id: "P9".into(),
        };
        let text = err.to_string();
        assert!(text.contains("P9"));
        assert!(text.contains("C1"));
    }

    #[test]
    fn json_errors_become_malformed_input() {
        let err: Error = serde_json::from_str::<serde_json::Value>("{oops")
            .unwrap_err()
            .into();
        assert!(matches!(err, Error::MalformedInput(_)));
    }

    #[test]
    fn store_error_displays_collaborator() {
        let err = StoreError::unavailable("file store", "disk full");
        assert_eq!(err.to_string(), "file store unavailable: disk full");
    }
}
