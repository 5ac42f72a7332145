//! Core shared types for the French tutor dialogue runtime.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod exercise;
mod ids;
mod topic;

/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Exercise kinds and their graded subset.
pub use exercise::{ExerciseKind, GradedKind};
/// Unique identifier for a tutoring session.
pub use ids::SessionId;
/// Learner-supplied practice topic.
pub use topic::Topic;
