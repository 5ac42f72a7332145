use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream;
use tutor_adapters::completion::{
    AdapterCompletion, CompletionParams, CompletionService, RetryPolicy,
};
use tutor_adapters::traits::{
    AdapterError, AdapterMetadata, AdapterResult, AdapterStream, InferenceChunk, InferenceRequest,
    MessageRole, ModelAdapter, PromptMessage,
};
use tutor_kernel::{
    CONVERSATION_ENDED_MESSAGE, DialogueState, INTERNAL_ERROR_MESSAGE, ReplyOutcome,
    STANDBY_MESSAGE, SessionController,
};
use tutor_primitives::{ExerciseKind, Topic};

/// Completion fake that replays queued results and records every request.
struct RecordingCompletion {
    replies: Mutex<VecDeque<AdapterResult<String>>>,
    calls: Mutex<Vec<(Vec<PromptMessage>, CompletionParams)>>,
}

impl RecordingCompletion {
    fn with_replies<I>(replies: I) -> Arc<Self>
    where
        I: IntoIterator<Item = AdapterResult<String>>,
    {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn texts(replies: &[&str]) -> Arc<Self> {
        Self::with_replies(replies.iter().map(|text| Ok((*text).to_owned())))
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn call(&self, index: usize) -> Vec<PromptMessage> {
        self.calls.lock().unwrap()[index].0.clone()
    }

    fn params(&self, index: usize) -> CompletionParams {
        self.calls.lock().unwrap()[index].1
    }
}

#[async_trait]
impl CompletionService for RecordingCompletion {
    async fn complete(
        &self,
        messages: &[PromptMessage],
        params: CompletionParams,
    ) -> AdapterResult<String> {
        self.calls
            .lock()
            .unwrap()
            .push((messages.to_vec(), params));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AdapterError::EmptyResponse))
    }
}

fn session(completion: &Arc<RecordingCompletion>) -> SessionController {
    SessionController::new(
        Arc::clone(completion) as Arc<dyn CompletionService>,
        CompletionParams::default(),
    )
}

fn last_user(messages: &[PromptMessage]) -> &str {
    messages
        .iter()
        .rev()
        .find(|message| message.role() == MessageRole::User)
        .map(PromptMessage::content)
        .unwrap()
}

#[tokio::test]
async fn paris_travel_fill_blank_scenario() {
    let completion = RecordingCompletion::texts(&[
        "Je ___ à Paris pour les vacances.",
        "Correct ! « Je suis à Paris » est juste.",
    ]);
    let mut session = session(&completion);

    let reply = session
        .reset("Paris travel", ExerciseKind::FillBlank)
        .await
        .unwrap();
    assert_eq!(completion.call_count(), 1);
    assert!(last_user(&completion.call(0)).contains("Paris travel"));
    assert_eq!(reply.state(), DialogueState::AwaitingAnswer);
    assert_eq!(
        reply.content(),
        "--- Fill-in-the-Blank Task ---\nJe ___ à Paris pour les vacances."
    );

    let feedback = session.respond("suis").await.unwrap();
    assert_eq!(completion.call_count(), 2);
    assert_eq!(
        last_user(&completion.call(1)),
        "Task: Fill in the blank (French).\nOriginal exercise: Je ___ à Paris pour les vacances.\nUser's answer: suis\nProvide feedback on whether the user's answer is correct and explain why."
    );
    assert_eq!(feedback.outcome(), ReplyOutcome::Feedback);
    assert_eq!(feedback.content(), "Correct ! « Je suis à Paris » est juste.");
    assert_eq!(session.state(), DialogueState::Standby);
}

#[tokio::test]
async fn open_topic_conversation_exit_scenario() {
    let completion = RecordingCompletion::texts(&["Bonjour ! De quoi veux-tu parler ?"]);
    let mut session = session(&completion);

    let reply = session
        .reset("", ExerciseKind::Conversation)
        .await
        .unwrap();
    assert!(last_user(&completion.call(0)).contains("a topic of your choice"));
    assert_eq!(reply.state(), DialogueState::InConversation);

    let reply = session.respond("exit").await.unwrap();
    assert_eq!(reply.content(), CONVERSATION_ENDED_MESSAGE);
    assert_eq!(reply.outcome(), ReplyOutcome::ConversationEnded);
    assert_eq!(reply.state(), DialogueState::Standby);
    assert_eq!(completion.call_count(), 1);
}

#[tokio::test]
async fn reset_never_enters_standby() {
    for kind in ExerciseKind::ALL {
        let completion = RecordingCompletion::texts(&["Tâche générée."]);
        let mut session = session(&completion);

        let reply = session.reset(Topic::new("école"), kind).await.unwrap();
        assert_ne!(reply.state(), DialogueState::Standby, "{kind}");
        assert!(reply.content().starts_with(kind.banner()));
        assert_eq!(reply.outcome(), ReplyOutcome::Task);
    }
}

#[tokio::test]
async fn standby_is_idempotent_and_silent() {
    let completion = RecordingCompletion::texts(&["Quel âge as-tu ?", "Très bien !"]);
    let mut session = session(&completion);
    session
        .reset("age", ExerciseKind::QuestionAnswer)
        .await
        .unwrap();
    session.respond("vingt ans").await.unwrap();
    let calls = completion.call_count();

    for message in ["encore", "", "quit", "Je veux continuer"] {
        let reply = session.respond(message).await.unwrap();
        assert_eq!(reply.content(), STANDBY_MESSAGE);
        assert_eq!(reply.state(), DialogueState::Standby);
        assert_eq!(reply.outcome(), ReplyOutcome::StandbyNotice);
    }
    assert_eq!(completion.call_count(), calls);
}

#[tokio::test]
async fn graded_answer_triggers_exactly_one_verification() {
    for kind in [
        ExerciseKind::FillBlank,
        ExerciseKind::QuestionAnswer,
        ExerciseKind::VocabMatch,
    ] {
        let task = "1. chat 2. chien 3. maison 4. livre 5. pomme";
        let completion = RecordingCompletion::texts(&[task, "Feedback."]);
        let mut session = session(&completion);
        session.reset("", kind).await.unwrap();

        session.respond("dog, cat, book, house, apple").await.unwrap();
        assert_eq!(completion.call_count(), 2, "{kind}");
        assert!(last_user(&completion.call(1)).contains(task));
        assert_eq!(
            session.exercise().unwrap().task().original_task_text(),
            task
        );

        session.respond("again").await.unwrap();
        assert_eq!(completion.call_count(), 2, "{kind}");
    }
}

#[tokio::test]
async fn conversation_history_grows_two_per_exchange() {
    let completion = RecordingCompletion::texts(&[
        "Salut ! Tu aimes le sport ?",
        "Super, lequel ?",
        "Le tennis est génial.",
        "Tu joues souvent ?",
    ]);
    let mut session = session(&completion);
    session
        .reset("sport", ExerciseKind::Conversation)
        .await
        .unwrap();

    for (turn, message) in ["Oui !", "Le tennis.", "Chaque semaine."].iter().enumerate() {
        let reply = session.respond(message).await.unwrap();
        assert_eq!(reply.outcome(), ReplyOutcome::ConversationReply);
        assert_eq!(reply.state(), DialogueState::InConversation);

        let history = session.exercise().unwrap().history();
        assert_eq!(history.len(), 2 * (turn + 1));
        assert_eq!(history.last_user_message(), Some(*message));
    }

    let last_request = completion.call(3);
    assert_eq!(last_request[0].role(), MessageRole::System);
    assert_eq!(last_request[1].content(), "Salut ! Tu aimes le sport ?");
    assert_eq!(last_user(&last_request), "Chaque semaine.");
    assert_eq!(last_request.len(), 1 + 1 + 4 + 1);

    let reply = session.respond(" Quit ").await.unwrap();
    assert_eq!(reply.content(), CONVERSATION_ENDED_MESSAGE);
    assert_eq!(completion.call_count(), 4);
}

#[tokio::test]
async fn service_failure_leaves_state_untouched() {
    let completion = RecordingCompletion::with_replies([
        Ok("Où habites-tu ?".to_owned()),
        Err(AdapterError::response(Some(503), "overloaded")),
        Ok("Bravo !".to_owned()),
    ]);
    let mut session = session(&completion);
    session
        .reset("home", ExerciseKind::QuestionAnswer)
        .await
        .unwrap();

    let reply = session.respond("À Lyon.").await.unwrap();
    assert!(reply.is_error());
    assert_eq!(reply.content(), INTERNAL_ERROR_MESSAGE);
    assert_eq!(session.state(), DialogueState::AwaitingAnswer);
    assert_eq!(
        session.exercise().unwrap().task().original_task_text(),
        "Où habites-tu ?"
    );

    let reply = session.respond("À Lyon.").await.unwrap();
    assert_eq!(reply.content(), "Bravo !");
    assert_eq!(session.state(), DialogueState::Standby);
}

#[tokio::test]
async fn failed_conversation_turn_keeps_history() {
    let completion = RecordingCompletion::with_replies([
        Ok("Bonjour !".to_owned()),
        Err(AdapterError::EmptyResponse),
    ]);
    let mut session = session(&completion);
    session
        .reset("", ExerciseKind::Conversation)
        .await
        .unwrap();

    let reply = session.respond("Salut").await.unwrap();
    assert_eq!(reply.outcome(), ReplyOutcome::ServiceError);
    assert_eq!(reply.state(), DialogueState::InConversation);
    assert!(session.exercise().unwrap().history().is_empty());
}

#[tokio::test]
async fn user_text_is_forwarded_verbatim() {
    let completion = RecordingCompletion::texts(&["Il ___ un {livre}.", "Ok."]);
    let mut session = session(&completion);
    session.reset("", ExerciseKind::FillBlank).await.unwrap();

    let answer = "  lit {original}\n";
    session.respond(answer).await.unwrap();
    let body = last_user(&completion.call(1)).to_owned();
    assert!(body.contains("Original exercise: Il ___ un {livre}.\n"));
    assert!(body.contains(&format!("User's answer: {answer}\nProvide")));
}

#[tokio::test]
async fn params_are_forwarded_on_every_call() {
    let completion = RecordingCompletion::texts(&["Question ?", "Réponse."]);
    let params = CompletionParams {
        max_tokens: 64,
        temperature: 0.2,
    };
    let mut session =
        SessionController::new(Arc::clone(&completion) as Arc<dyn CompletionService>, params);
    session
        .reset("", ExerciseKind::QuestionAnswer)
        .await
        .unwrap();
    session.respond("oui").await.unwrap();

    assert_eq!(completion.params(0), params);
    assert_eq!(completion.params(1), params);
}

struct StaticAdapter {
    metadata: AdapterMetadata,
    responses: Mutex<VecDeque<AdapterResult<&'static str>>>,
}

impl StaticAdapter {
    fn new(responses: Vec<AdapterResult<&'static str>>) -> Self {
        Self {
            metadata: AdapterMetadata::new("static", "static-model"),
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl ModelAdapter for StaticAdapter {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn infer(&self, _request: InferenceRequest) -> AdapterResult<AdapterStream> {
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(AdapterError::EmptyResponse))?;
        let chunk = InferenceChunk::new(next, true);
        Ok(Box::pin(stream::once(async move { Ok(chunk) })))
    }
}

#[tokio::test]
async fn session_runs_over_adapter_with_retry() {
    let adapter = StaticAdapter::new(vec![
        Err(AdapterError::transport("connection reset")),
        Ok("  Comment t'appelles-tu ?\n"),
        Ok("Parfait."),
    ]);
    let completion = AdapterCompletion::new(Arc::new(adapter)).with_policy(
        RetryPolicy::new(Duration::from_secs(5)).with_backoff(Duration::from_millis(1)),
    );
    let mut session = SessionController::new(Arc::new(completion), CompletionParams::default());

    let reply = session
        .reset("présentations", ExerciseKind::QuestionAnswer)
        .await
        .unwrap();
    assert_eq!(reply.content(), "--- Q&A Task ---\nComment t'appelles-tu ?");

    let reply = session.respond("Je m'appelle Léa.").await.unwrap();
    assert_eq!(reply.content(), "Parfait.");
    assert_eq!(reply.state(), DialogueState::Standby);
}
