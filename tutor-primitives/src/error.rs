//! Shared error definitions for tutor primitives.

use thiserror::Error;
use uuid::Error as UuidError;

/// Result alias used throughout the tutor runtime.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing tutor primitive types.
#[derive(Debug, Error)]
pub enum Error {
    /// The provided session identifier could not be parsed.
    #[error("invalid session id: {source}")]
    InvalidSessionId {
        /// Source parsing error from the UUID library.
        #[from]
        source: UuidError,
    },

    /// The supplied text does not name a known exercise kind.
    #[error("unknown exercise kind `{value}` (expected one of: {expected})")]
    UnknownExerciseKind {
        /// The offending input.
        value: String,
        /// Comma separated list of accepted slugs.
        expected: String,
    },
}
