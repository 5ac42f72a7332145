//! Tutoring session: one active exercise, its dialogue state, and the
//! completion service that generates tasks and feedback.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};
use tutor_adapters::completion::{CompletionParams, CompletionService};
use tutor_adapters::traits::{AdapterError, PromptMessage};
use tutor_primitives::{ExerciseKind, SessionId, Topic};
use tutor_prompts::template::TemplateError;
use tutor_prompts::{ConversationHistory, conversation_turn, initiation, verification_request};

use crate::dialogue::{DialogueError, DialogueEvent, DialogueMachine, DialogueState, TurnPlan};

/// Reply sent for any message received while nothing is being answered.
pub const STANDBY_MESSAGE: &str = "To continue, click the 'start a new session' button.";

/// Reply sent when the completion service cannot produce text.
pub const INTERNAL_ERROR_MESSAGE: &str = "An internal error has occurred. Please try again later.";

/// Reply sent when the learner leaves a conversation.
pub const CONVERSATION_ENDED_MESSAGE: &str = "Ending conversation.";

/// Text of the exercise shown to the learner, kept for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    kind: ExerciseKind,
    original_task_text: String,
}

impl TaskRecord {
    fn new(kind: ExerciseKind, original_task_text: String) -> Self {
        Self {
            kind,
            original_task_text,
        }
    }

    /// Returns the generated task text exactly as shown to the learner.
    #[must_use]
    pub fn original_task_text(&self) -> &str {
        &self.original_task_text
    }
}

/// Exercise currently held by a session.
#[derive(Debug, Clone)]
pub struct Exercise {
    topic: Topic,
    task: TaskRecord,
    history: ConversationHistory,
}

impl Exercise {
    /// Returns the topic the exercise was generated for.
    #[must_use]
    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Returns the exercise kind.
    #[must_use]
    pub const fn kind(&self) -> ExerciseKind {
        self.task.kind
    }

    /// Returns the generated task.
    #[must_use]
    pub fn task(&self) -> &TaskRecord {
        &self.task
    }

    /// Returns the conversation history. Empty for graded exercises.
    #[must_use]
    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }
}

/// Classifies a [`Reply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// A freshly generated exercise.
    Task,
    /// Feedback on a graded answer.
    Feedback,
    /// The tutor's next conversation message.
    ConversationReply,
    /// The conversation was closed by the learner.
    ConversationEnded,
    /// The session is in standby and needs a reset.
    StandbyNotice,
    /// The completion service failed.
    ServiceError,
}

/// Text returned to the learner together with the resulting state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    content: String,
    state: DialogueState,
    outcome: ReplyOutcome,
}

impl Reply {
    fn new(content: impl Into<String>, state: DialogueState, outcome: ReplyOutcome) -> Self {
        Self {
            content: content.into(),
            state,
            outcome,
        }
    }

    /// Returns the text to show.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns the session state after this reply.
    #[must_use]
    pub const fn state(&self) -> DialogueState {
        self.state
    }

    /// Returns what kind of reply this is.
    #[must_use]
    pub const fn outcome(&self) -> ReplyOutcome {
        self.outcome
    }

    /// Returns `true` if the completion service failed.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.outcome, ReplyOutcome::ServiceError)
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content)
    }
}

/// Errors that indicate a broken session invariant.
///
/// Completion failures are not errors here: they are reported to the
/// learner as a [`ReplyOutcome::ServiceError`] reply.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The dialogue machine rejected a step.
    #[error(transparent)]
    Dialogue(#[from] DialogueError),

    /// A prompt template could not be rendered.
    #[error("failed to render prompt: {0}")]
    Template(#[from] TemplateError),

    /// The state requires an exercise but none is stored.
    #[error("session {session_id} is {state:?} without an active exercise")]
    MissingExercise {
        /// Affected session.
        session_id: SessionId,
        /// State that required an exercise.
        state: DialogueState,
    },
}

/// Result alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Drives one learner's tutoring session.
///
/// A controller is used from one task at a time: both operations take
/// `&mut self`, so turns never interleave. Distinct controllers can share
/// the same [`CompletionService`].
pub struct SessionController {
    id: SessionId,
    completion: Arc<dyn CompletionService>,
    params: CompletionParams,
    machine: DialogueMachine,
    exercise: Option<Exercise>,
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("id", &self.id)
            .field("params", &self.params)
            .field("state", &self.machine.state())
            .field("exercise", &self.exercise)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Creates a session in standby with a random identifier.
    #[must_use]
    pub fn new(completion: Arc<dyn CompletionService>, params: CompletionParams) -> Self {
        Self::with_id(SessionId::random(), completion, params)
    }

    /// Creates a session in standby with the supplied identifier.
    #[must_use]
    pub fn with_id(
        id: SessionId,
        completion: Arc<dyn CompletionService>,
        params: CompletionParams,
    ) -> Self {
        Self {
            id,
            completion,
            params,
            machine: DialogueMachine::new(id),
            exercise: None,
        }
    }

    /// Returns the session identifier.
    #[must_use]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Returns the current dialogue state.
    #[must_use]
    pub const fn state(&self) -> DialogueState {
        self.machine.state()
    }

    /// Returns the sampling parameters sent with each completion.
    #[must_use]
    pub const fn params(&self) -> CompletionParams {
        self.params
    }

    /// Returns the active exercise, if any.
    #[must_use]
    pub fn exercise(&self) -> Option<&Exercise> {
        self.exercise.as_ref()
    }

    /// Starts a new exercise of `kind` about `topic`.
    ///
    /// On success the previous exercise and history are discarded and the
    /// reply carries the kind's banner followed by the task text. If the
    /// completion service fails, the previous exercise and state are kept and
    /// an internal-error reply is returned.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] only if the dialogue machine rejects the
    /// reset, which indicates a bug.
    pub async fn reset(
        &mut self,
        topic: impl Into<Topic>,
        kind: ExerciseKind,
    ) -> SessionResult<Reply> {
        let topic = topic.into();
        let messages = initiation(kind, &topic);

        let task_text = match self.complete(&messages).await {
            Ok(text) => text,
            Err(err) => return Ok(self.service_failure(&err)),
        };

        let history = if kind == ExerciseKind::Conversation {
            ConversationHistory::with_opening(task_text.clone())
        } else {
            ConversationHistory::new()
        };
        let content = format!("{}\n{task_text}", kind.banner());
        let state = self.machine.transition(DialogueEvent::Reset(kind))?;
        info!(session_id = %self.id, %kind, %topic, "exercise started");

        self.exercise = Some(Exercise {
            topic,
            task: TaskRecord::new(kind, task_text),
            history,
        });
        Ok(Reply::new(content, state, ReplyOutcome::Task))
    }

    /// Handles one learner message according to the current state.
    ///
    /// Graded answers receive one feedback reply and the session moves to
    /// standby. Conversation messages are answered with the full history until
    /// the learner sends an exit keyword. In standby the learner is asked to
    /// start a new session. Completion failures yield an internal-error reply
    /// and leave the state unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError`] when a session invariant is broken.
    pub async fn respond(&mut self, message: &str) -> SessionResult<Reply> {
        match self.machine.plan(message)? {
            TurnPlan::RemindStandby => {
                let state = self.machine.transition(DialogueEvent::StandbyReminded)?;
                Ok(Reply::new(STANDBY_MESSAGE, state, ReplyOutcome::StandbyNotice))
            }
            TurnPlan::EndConversation => {
                let state = self.machine.transition(DialogueEvent::ConversationEnded)?;
                info!(session_id = %self.id, "conversation ended by learner");
                Ok(Reply::new(
                    CONVERSATION_ENDED_MESSAGE,
                    state,
                    ReplyOutcome::ConversationEnded,
                ))
            }
            TurnPlan::Verify(kind) => {
                let messages = {
                    let exercise = self.active_exercise()?;
                    verification_request(kind, exercise.task.original_task_text(), message)?
                };

                match self.complete(&messages).await {
                    Ok(feedback) => {
                        let state = self.machine.transition(DialogueEvent::AnswerGraded)?;
                        info!(session_id = %self.id, %kind, "answer graded");
                        Ok(Reply::new(feedback, state, ReplyOutcome::Feedback))
                    }
                    Err(err) => Ok(self.service_failure(&err)),
                }
            }
            TurnPlan::Continue => {
                let messages = conversation_turn(&self.active_exercise()?.history, message);

                match self.complete(&messages).await {
                    Ok(reply) => {
                        let state = self.machine.state();
                        let exercise = self.exercise.as_mut().ok_or(SessionError::MissingExercise {
                            session_id: self.id,
                            state,
                        })?;
                        exercise.history.push_exchange(message, reply.clone());
                        debug!(
                            session_id = %self.id,
                            exchanges = exercise.history.exchanges(),
                            estimated_tokens = exercise.history.estimated_tokens(),
                            "conversation continued"
                        );
                        let state = self.machine.transition(DialogueEvent::ConversationContinued)?;
                        Ok(Reply::new(reply, state, ReplyOutcome::ConversationReply))
                    }
                    Err(err) => Ok(self.service_failure(&err)),
                }
            }
        }
    }

    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, AdapterError> {
        self.completion.complete(messages, self.params).await
    }

    fn active_exercise(&self) -> SessionResult<&Exercise> {
        self.exercise.as_ref().ok_or(SessionError::MissingExercise {
            session_id: self.id,
            state: self.machine.state(),
        })
    }

    fn service_failure(&self, err: &AdapterError) -> Reply {
        warn!(
            session_id = %self.id,
            state = ?self.machine.state(),
            error = %err,
            "completion failed"
        );
        Reply::new(
            INTERNAL_ERROR_MESSAGE,
            self.machine.state(),
            ReplyOutcome::ServiceError,
        )
    }
}
