//! Learner-supplied practice topic.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Topic the learner wants to practise.
///
/// Surrounding whitespace is dropped. An empty topic leaves the choice to the
/// completion service.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Creates a topic from free text.
    #[must_use]
    pub fn new(text: impl AsRef<str>) -> Self {
        Self(text.as_ref().trim().to_owned())
    }

    /// Topic that lets the completion service pick.
    #[must_use]
    pub const fn open() -> Self {
        Self(String::new())
    }

    /// Returns `true` when no topic was given.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the topic text, empty for an open topic.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Topic {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Topic {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_open() {
            f.write_str("(open topic)")
        } else {
            f.write_str(&self.0)
        }
    }
}
