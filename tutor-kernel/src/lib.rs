//! Dialogue core of the French tutor.
//!
//! [`SessionController`] owns one learner's exercise and routes each message
//! through the [`DialogueMachine`]: graded answers are verified once, a
//! conversation continues until the learner types an exit keyword, and
//! anything else while idle gets the standby notice.

#![warn(missing_docs, clippy::pedantic)]

mod dialogue;
mod session;

pub use dialogue::{
    DialogueError, DialogueEvent, DialogueMachine, DialogueResult, DialogueState, EXIT_KEYWORDS,
    TurnPlan, is_exit_keyword,
};
pub use session::{
    CONVERSATION_ENDED_MESSAGE, Exercise, INTERNAL_ERROR_MESSAGE, Reply, ReplyOutcome,
    STANDBY_MESSAGE, SessionController, SessionError, SessionResult, TaskRecord,
};
