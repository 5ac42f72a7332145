//! Conversation transcript kept for the conversation exercise.

use tutor_adapters::traits::{MessageRole, PromptMessage};

/// Append-only transcript of a French conversation.
///
/// The opening line generated when the exercise starts is kept apart from
/// the learner exchanges, so after `n` exchanges [`len`](Self::len) is `2n`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversationHistory {
    opening: Option<PromptMessage>,
    turns: Vec<PromptMessage>,
}

impl ConversationHistory {
    /// Creates an empty history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a history seeded with the assistant's conversation starter.
    #[must_use]
    pub fn with_opening(opening: impl Into<String>) -> Self {
        Self {
            opening: Some(PromptMessage::assistant(opening)),
            turns: Vec::new(),
        }
    }

    /// Appends one learner message and the reply it received.
    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.turns.push(PromptMessage::user(user));
        self.turns.push(PromptMessage::assistant(assistant));
    }

    /// Returns the conversation starter, if any.
    #[must_use]
    pub fn opening(&self) -> Option<&PromptMessage> {
        self.opening.as_ref()
    }

    /// Number of exchange messages, excluding the opening.
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Returns `true` before the first exchange.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of completed learner/tutor exchanges.
    #[must_use]
    pub fn exchanges(&self) -> usize {
        self.turns.len() / 2
    }

    /// Number of messages [`iter`](Self::iter) yields, opening included.
    #[must_use]
    pub fn total_messages(&self) -> usize {
        self.turns.len() + usize::from(self.opening.is_some())
    }

    /// Iterates over the opening followed by every exchange message.
    pub fn iter(&self) -> impl Iterator<Item = &PromptMessage> {
        self.opening.iter().chain(self.turns.iter())
    }

    /// Returns the most recent learner message.
    #[must_use]
    pub fn last_user_message(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|message| message.role() == MessageRole::User)
            .map(PromptMessage::content)
    }

    /// Approximate token footprint of the transcript.
    ///
    /// Uses ~4 characters per token. Logged on every conversation turn.
    #[must_use]
    pub fn estimated_tokens(&self) -> usize {
        self.iter()
            .map(|message| (message.content().len() / 4).max(1))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_exchanges_without_opening() {
        let mut history = ConversationHistory::with_opening("Salut ! Quoi de neuf ?");
        assert!(history.is_empty());
        assert_eq!(history.total_messages(), 1);

        for n in 1..=3 {
            history.push_exchange(format!("message {n}"), format!("r\u{e9}ponse {n}"));
            assert_eq!(history.len(), 2 * n);
            assert_eq!(history.exchanges(), n);
        }
        assert_eq!(history.total_messages(), 7);
        assert_eq!(history.last_user_message(), Some("message 3"));
    }

    #[test]
    fn iterates_opening_first() {
        let mut history = ConversationHistory::with_opening("Bonjour");
        history.push_exchange("Salut", "Comment vas-tu ?");

        let contents: Vec<&str> = history.iter().map(PromptMessage::content).collect();
        assert_eq!(contents, vec!["Bonjour", "Salut", "Comment vas-tu ?"]);
        assert_eq!(history.opening().map(PromptMessage::role), Some(MessageRole::Assistant));
    }

    #[test]
    fn estimates_tokens_reasonably() {
        let mut history = ConversationHistory::new();
        history.push_exchange("Oui", "D'accord");
        let short = history.estimated_tokens();
        history.push_exchange(
            "Je voudrais visiter le mus\u{e9}e du Louvre demain matin.",
            "Excellente id\u{e9}e, il ouvre \u{e0} neuf heures.",
        );
        assert!(history.estimated_tokens() > short);
    }
}
