//! Dialogue state machine driving one tutoring session.

use thiserror::Error;
use tracing::debug;
use tutor_primitives::{ExerciseKind, GradedKind, SessionId};

/// Learner messages that end a conversation exercise.
pub const EXIT_KEYWORDS: [&str; 2] = ["quit", "exit"];

/// States a session can occupy between turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DialogueState {
    /// A graded exercise is shown; the next message is the learner's answer.
    AwaitingAnswer,
    /// A conversation is running; messages are forwarded with history.
    InConversation,
    /// Nothing to answer; only a new session moves the learner on.
    Standby,
}

impl DialogueState {
    /// State entered right after a successful reset into `kind`.
    #[must_use]
    pub const fn initial_for(kind: ExerciseKind) -> Self {
        match kind {
            ExerciseKind::Conversation => Self::InConversation,
            ExerciseKind::FillBlank | ExerciseKind::QuestionAnswer | ExerciseKind::VocabMatch => {
                Self::AwaitingAnswer
            }
        }
    }

    /// Returns `true` in the standby state.
    #[must_use]
    pub const fn is_standby(self) -> bool {
        matches!(self, Self::Standby)
    }
}

/// Events that move the machine between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogueEvent {
    /// A new exercise of the given kind was generated.
    Reset(ExerciseKind),
    /// Feedback for a graded answer was delivered.
    AnswerGraded,
    /// The conversation produced another reply.
    ConversationContinued,
    /// The learner left the conversation.
    ConversationEnded,
    /// A message arrived in standby and the learner was told to start over.
    StandbyReminded,
}

/// What the session should do with an incoming learner message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPlan {
    /// Send one verification request for the stored task.
    Verify(GradedKind),
    /// Forward the message with the conversation history.
    Continue,
    /// End the conversation locally, without calling the service.
    EndConversation,
    /// Reply with the standby notice, without calling the service.
    RemindStandby,
}

/// Returns `true` if `message` asks to leave a conversation.
#[must_use]
pub fn is_exit_keyword(message: &str) -> bool {
    let message = message.trim();
    EXIT_KEYWORDS
        .iter()
        .any(|keyword| message.eq_ignore_ascii_case(keyword))
}

/// Tracks the dialogue state and the exercise kind it applies to.
#[derive(Debug, Clone, Copy)]
pub struct DialogueMachine {
    session_id: SessionId,
    state: DialogueState,
    kind: Option<ExerciseKind>,
}

impl DialogueMachine {
    /// Creates a machine in standby, before any exercise has started.
    #[must_use]
    pub const fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            state: DialogueState::Standby,
            kind: None,
        }
    }

    /// Returns the owning session identifier.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Returns the current state.
    #[must_use]
    pub const fn state(&self) -> DialogueState {
        self.state
    }

    /// Returns the kind of the current exercise, if one was started.
    #[must_use]
    pub const fn kind(&self) -> Option<ExerciseKind> {
        self.kind
    }

    /// Decides how to handle `message` without changing state.
    ///
    /// # Errors
    ///
    /// Returns [`DialogueError::UnhandledInput`] when the state and exercise
    /// kind do not belong together, which only happens if the machine was
    /// driven out of order.
    pub fn plan(&self, message: &str) -> DialogueResult<TurnPlan> {
        let plan = match (self.state, self.kind) {
            (DialogueState::Standby, _) => Some(TurnPlan::RemindStandby),
            (DialogueState::AwaitingAnswer, Some(kind)) => kind.as_graded().map(TurnPlan::Verify),
            (DialogueState::InConversation, Some(ExerciseKind::Conversation)) => {
                Some(if is_exit_keyword(message) {
                    TurnPlan::EndConversation
                } else {
                    TurnPlan::Continue
                })
            }
            _ => None,
        };

        plan.ok_or(DialogueError::UnhandledInput {
            session_id: self.session_id,
            state: self.state,
            kind: self.kind,
        })
    }

    /// Applies an event, returning the resulting state.
    ///
    /// # Errors
    ///
    /// Returns [`DialogueError::InvalidTransition`] when the event is not
    /// allowed from the current state.
    pub fn transition(&mut self, event: DialogueEvent) -> DialogueResult<DialogueState> {
        let graded = self.kind.is_some_and(ExerciseKind::is_graded);
        let conversing = self.kind == Some(ExerciseKind::Conversation);

        let next = match (self.state, event) {
            (_, DialogueEvent::Reset(kind)) => {
                self.kind = Some(kind);
                Some(DialogueState::initial_for(kind))
            }
            (DialogueState::AwaitingAnswer, DialogueEvent::AnswerGraded) if graded => {
                Some(DialogueState::Standby)
            }
            (DialogueState::InConversation, DialogueEvent::ConversationContinued) if conversing => {
                Some(DialogueState::InConversation)
            }
            (DialogueState::InConversation, DialogueEvent::ConversationEnded) if conversing => {
                Some(DialogueState::Standby)
            }
            (DialogueState::Standby, DialogueEvent::StandbyReminded) => {
                Some(DialogueState::Standby)
            }
            _ => None,
        };

        let Some(next_state) = next else {
            return Err(DialogueError::InvalidTransition {
                session_id: self.session_id,
                from: self.state,
                kind: self.kind,
                event,
            });
        };

        if next_state != self.state {
            debug!(
                session_id = %self.session_id,
                from = ?self.state,
                to = ?next_state,
                kind = ?self.kind,
                ?event,
                "dialogue transition"
            );
            self.state = next_state;
        }

        Ok(self.state)
    }
}

/// Errors emitted by the dialogue state machine.
///
/// Both variants are invariant violations rather than user errors.
#[derive(Debug, Error)]
pub enum DialogueError {
    /// Event was not permitted from the current state.
    #[error("invalid dialogue transition from {from:?} ({kind:?}) via {event:?} in session {session_id}")]
    InvalidTransition {
        /// Session whose transition failed.
        session_id: SessionId,
        /// State prior to the attempted transition.
        from: DialogueState,
        /// Exercise kind at the time.
        kind: Option<ExerciseKind>,
        /// Event that triggered the failure.
        event: DialogueEvent,
    },

    /// No handler exists for a message in this state and kind.
    #[error("no handler for input in state {state:?} ({kind:?}) in session {session_id}")]
    UnhandledInput {
        /// Session that received the input.
        session_id: SessionId,
        /// Current state.
        state: DialogueState,
        /// Current exercise kind.
        kind: Option<ExerciseKind>,
    },
}

/// Result alias used for dialogue operations.
pub type DialogueResult<T> = Result<T, DialogueError>;
