//! Prompt construction for the French tutor.
//!
//! [`exercises`] holds the initiation, verification and conversation
//! builders; [`template`] renders the literal feedback templates and
//! [`history`] keeps the conversation transcript.

#![warn(missing_docs, clippy::pedantic)]

pub mod exercises;
pub mod history;
pub mod template;

pub use exercises::{
    conversation_initiation, conversation_turn, fill_blank_initiation, initiation, qa_initiation,
    verification_request, vocab_match_initiation,
};
pub use history::ConversationHistory;
pub use template::{PromptTemplate, TemplateBuilder, TemplateError, TemplateResult};
