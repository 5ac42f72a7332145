//! Exercise kinds offered by the tutor.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The kind of practice a session runs.
///
/// Determines which prompt templates are used and how the learner's messages
/// are interpreted by the dialogue state machine.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    /// A French sentence with a blank the learner fills in.
    FillBlank,
    /// A short-answer French question.
    #[serde(rename = "qa")]
    QuestionAnswer,
    /// Open-ended French conversation until the learner opts out.
    Conversation,
    /// Five French words matched against scrambled English translations.
    VocabMatch,
}

impl ExerciseKind {
    /// Every exercise kind, in menu order.
    pub const ALL: [Self; 4] = [
        Self::FillBlank,
        Self::QuestionAnswer,
        Self::Conversation,
        Self::VocabMatch,
    ];

    /// Returns the graded view of this kind, or `None` for conversation.
    #[must_use]
    pub const fn as_graded(self) -> Option<GradedKind> {
        match self {
            Self::FillBlank => Some(GradedKind::FillBlank),
            Self::QuestionAnswer => Some(GradedKind::QuestionAnswer),
            Self::VocabMatch => Some(GradedKind::VocabMatch),
            Self::Conversation => None,
        }
    }

    /// Returns `true` when a single answer is graded and the exercise ends.
    #[must_use]
    pub const fn is_graded(self) -> bool {
        self.as_graded().is_some()
    }

    /// Short machine-friendly name, accepted by [`FromStr`].
    #[must_use]
    pub const fn slug(self) -> &'static str {
        match self {
            Self::FillBlank => "fill-blank",
            Self::QuestionAnswer => "qa",
            Self::Conversation => "conversation",
            Self::VocabMatch => "vocab-match",
        }
    }

    /// Human-facing label, also accepted by [`FromStr`].
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FillBlank => "Fill in the Blank",
            Self::QuestionAnswer => "Q&A",
            Self::Conversation => "Conversation",
            Self::VocabMatch => "Vocabulary Matching",
        }
    }

    /// Header line shown above a freshly generated task.
    #[must_use]
    pub const fn banner(self) -> &'static str {
        match self {
            Self::FillBlank => "--- Fill-in-the-Blank Task ---",
            Self::QuestionAnswer => "--- Q&A Task ---",
            Self::Conversation => "--- Conversation Task ---",
            Self::VocabMatch => "--- Vocabulary Matching Task ---",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ExerciseKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| {
                wanted.eq_ignore_ascii_case(kind.slug()) || wanted.eq_ignore_ascii_case(kind.label())
            })
            .ok_or_else(|| Error::UnknownExerciseKind {
                value: wanted.to_owned(),
                expected: Self::ALL
                    .iter()
                    .map(|kind| kind.slug())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Exercise kinds whose single answer is verified by the completion service.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GradedKind {
    /// See [`ExerciseKind::FillBlank`].
    FillBlank,
    /// See [`ExerciseKind::QuestionAnswer`].
    #[serde(rename = "qa")]
    QuestionAnswer,
    /// See [`ExerciseKind::VocabMatch`].
    VocabMatch,
}

impl From<GradedKind> for ExerciseKind {
    fn from(value: GradedKind) -> Self {
        match value {
            GradedKind::FillBlank => Self::FillBlank,
            GradedKind::QuestionAnswer => Self::QuestionAnswer,
            GradedKind::VocabMatch => Self::VocabMatch,
        }
    }
}

impl fmt::Display for GradedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&ExerciseKind::from(*self), f)
    }
}
