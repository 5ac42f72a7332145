//! Prompt library for the four exercise kinds.
//!
//! Every builder is pure: it only assembles role-tagged messages for the
//! completion service.

use tutor_adapters::traits::PromptMessage;
use tutor_primitives::{ExerciseKind, GradedKind, Topic};

use crate::history::ConversationHistory;
use crate::template::{PromptTemplate, TemplateResult};

/// Marker replaced by the topic clause in initiation instructions.
const TOPIC_MARKER: &str = "{topic}";

const FILL_BLANK_SYSTEM: &str = "You are a creative French language tutor who generates \
     fill-in-the-blank exercises. Do not reveal the answer to the user.";
const FILL_BLANK_USER: &str = "Generate exactly one French fill-in-the-blank sentence {topic}. \
     Replace exactly one word with a blank written as ___. Keep the correct answer hidden: \
     do not include it anywhere in your response.";

const QA_SYSTEM: &str = "You are a French language tutor who creates engaging Q&A questions.";
const QA_USER: &str = "Generate one simple French question {topic} that can be answered with a \
     single word or a short phrase. Output only the question, without the answer.";

const CONVERSATION_SYSTEM: &str = "You are a friendly French tutor. Initiate a conversation by \
     providing a conversation starter or a scene context in French.";
const CONVERSATION_USER: &str = "Start a conversation in French {topic}.";

const VOCAB_MATCH_SYSTEM: &str =
    "You are a creative French language tutor who generates vocabulary matching exercises.";
const VOCAB_MATCH_USER: &str = "Generate a vocabulary matching task in French {topic}. Provide a \
     numbered list of exactly 5 French words and a scrambled list of their 5 English \
     translations. Do not reveal which pair is correct.";

/// System instruction sent with every verification request.
pub const VERIFICATION_SYSTEM: &str = "You are a patient French language tutor. You review a \
     learner's answer to an exercise you created and give clear, encouraging feedback.";

/// System instruction prepended to every conversation turn.
pub const CONVERSATION_TURN_SYSTEM: &str = "You are a friendly French tutor holding a \
     conversation in French. Keep your replies short and written in French. If the learner \
     replies in a language other than French, gently redirect them to continue in French.";

/// Feedback request for fill-in-the-blank answers.
pub const FILL_BLANK_VERIFICATION: &str = "Task: Fill in the blank (French).\nOriginal exercise: {original}\nUser's answer: {answer}\nProvide feedback on whether the user's answer is correct and explain why.";

/// Feedback request for Q&A answers.
pub const QA_VERIFICATION: &str = "Task: Q&A (French).\nQuestion: {original}\nUser's answer: {answer}\nProvide feedback on whether the user's answer is correct and explain briefly.";

/// Feedback request for vocabulary matching answers.
pub const VOCAB_MATCH_VERIFICATION: &str = "Task: Vocabulary Matching (French).\nExercise: {original}\nUser's matching: {answer}\nFirst, output the correct matching of french words and english words, making sure to say that this is the correct solution. Then, output the solution that the user gave, by assigning each french word to the next english word in the user's response. Then provide detailed feedback for the pairings the user made that do not match the correct matching.";

/// Builds the request that generates a fill-in-the-blank exercise.
#[must_use]
pub fn fill_blank_initiation(topic: &Topic) -> Vec<PromptMessage> {
    initiation_pair(FILL_BLANK_SYSTEM, FILL_BLANK_USER, topic)
}

/// Builds the request that generates a short-answer question.
#[must_use]
pub fn qa_initiation(topic: &Topic) -> Vec<PromptMessage> {
    initiation_pair(QA_SYSTEM, QA_USER, topic)
}

/// Builds the request that generates a conversation starter.
#[must_use]
pub fn conversation_initiation(topic: &Topic) -> Vec<PromptMessage> {
    initiation_pair(CONVERSATION_SYSTEM, CONVERSATION_USER, topic)
}

/// Builds the request that generates a vocabulary matching exercise.
#[must_use]
pub fn vocab_match_initiation(topic: &Topic) -> Vec<PromptMessage> {
    initiation_pair(VOCAB_MATCH_SYSTEM, VOCAB_MATCH_USER, topic)
}

/// Builds the initiation request for `kind`.
#[must_use]
pub fn initiation(kind: ExerciseKind, topic: &Topic) -> Vec<PromptMessage> {
    match kind {
        ExerciseKind::FillBlank => fill_blank_initiation(topic),
        ExerciseKind::QuestionAnswer => qa_initiation(topic),
        ExerciseKind::Conversation => conversation_initiation(topic),
        ExerciseKind::VocabMatch => vocab_match_initiation(topic),
    }
}

/// Returns the verification template for a graded exercise.
#[must_use]
pub fn verification_template(kind: GradedKind) -> PromptTemplate {
    let text = match kind {
        GradedKind::FillBlank => FILL_BLANK_VERIFICATION,
        GradedKind::QuestionAnswer => QA_VERIFICATION,
        GradedKind::VocabMatch => VOCAB_MATCH_VERIFICATION,
    };
    PromptTemplate::builder(text)
        .with_required_variable("original")
        .with_required_variable("answer")
        .build()
}

/// Builds the feedback request for a learner's answer.
///
/// `original` and `answer` are substituted verbatim; the answer is forwarded
/// as free text, without parsing.
///
/// # Errors
///
/// Returns [`TemplateError`](crate::template::TemplateError) if the template
/// declares a variable that is not supplied here.
pub fn verification_request(
    kind: GradedKind,
    original: &str,
    answer: &str,
) -> TemplateResult<Vec<PromptMessage>> {
    let body = verification_template(kind)
        .render_with(&[("original", original), ("answer", answer)])?;
    Ok(vec![
        PromptMessage::system(VERIFICATION_SYSTEM),
        PromptMessage::user(body),
    ])
}

/// Builds the next conversation request: the fixed system instruction, the
/// accumulated history, then `new_user_message`.
#[must_use]
pub fn conversation_turn(
    history: &ConversationHistory,
    new_user_message: &str,
) -> Vec<PromptMessage> {
    let mut messages = Vec::with_capacity(history.total_messages() + 2);
    messages.push(PromptMessage::system(CONVERSATION_TURN_SYSTEM));
    messages.extend(history.iter().cloned());
    messages.push(PromptMessage::user(new_user_message));
    messages
}

fn initiation_pair(system: &str, user: &str, topic: &Topic) -> Vec<PromptMessage> {
    vec![
        PromptMessage::system(system),
        PromptMessage::user(user.replacen(TOPIC_MARKER, &topic_clause(topic), 1)),
    ]
}

fn topic_clause(topic: &Topic) -> String {
    if topic.is_open() {
        "about a topic of your choice".to_owned()
    } else {
        format!("about \"{}\"", topic.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tutor_adapters::traits::MessageRole;

    fn roles(messages: &[PromptMessage]) -> Vec<MessageRole> {
        messages.iter().map(PromptMessage::role).collect()
    }

    #[test]
    fn initiations_are_system_then_user() {
        let topic = Topic::new("Paris travel");
        for kind in ExerciseKind::ALL {
            let messages = initiation(kind, &topic);
            assert_eq!(roles(&messages), vec![MessageRole::System, MessageRole::User]);
            assert!(
                messages[1].content().contains("Paris travel"),
                "{kind} prompt should embed the topic"
            );
            assert!(!messages[1].content().contains(TOPIC_MARKER));
        }
    }

    #[test]
    fn open_topic_defers_choice_to_service() {
        for kind in ExerciseKind::ALL {
            let messages = initiation(kind, &Topic::open());
            let user = messages[1].content();
            assert!(user.contains("a topic of your choice"));
            assert!(!user.contains("about \"\""));
            assert!(!user.contains("about ."));
        }
    }

    #[test]
    fn fill_blank_withholds_answer() {
        let messages = fill_blank_initiation(&Topic::new("cuisine"));
        assert!(messages[0].content().contains("Do not reveal the answer"));
        assert!(messages[1].content().contains("exactly one"));
    }

    #[test]
    fn vocab_match_asks_for_five_words() {
        let messages = vocab_match_initiation(&Topic::open());
        let user = messages[1].content();
        assert!(user.contains("exactly 5 French words"));
        assert!(user.contains("scrambled"));
        assert!(user.contains("Do not reveal which pair is correct"));
    }

    #[test]
    fn fill_blank_verification_matches_literal() {
        let messages =
            verification_request(GradedKind::FillBlank, "Je ___ un chat.", "suis").unwrap();
        assert_eq!(roles(&messages), vec![MessageRole::System, MessageRole::User]);
        assert_eq!(
            messages[1].content(),
            "Task: Fill in the blank (French).\nOriginal exercise: Je ___ un chat.\nUser's answer: suis\nProvide feedback on whether the user's answer is correct and explain why."
        );
    }

    #[test]
    fn qa_verification_matches_literal() {
        let messages =
            verification_request(GradedKind::QuestionAnswer, "Quelle est la capitale ?", "Paris")
                .unwrap();
        assert_eq!(
            messages[1].content(),
            "Task: Q&A (French).\nQuestion: Quelle est la capitale ?\nUser's answer: Paris\nProvide feedback on whether the user's answer is correct and explain briefly."
        );
    }

    #[test]
    fn vocab_match_verification_explains_positional_pairing() {
        let messages = verification_request(
            GradedKind::VocabMatch,
            "1) chat 2) chien",
            "dog, cat",
        )
        .unwrap();
        assert_eq!(
            messages[1].content(),
            "Task: Vocabulary Matching (French).\nExercise: 1) chat 2) chien\nUser's matching: dog, cat\nFirst, output the correct matching of french words and english words, making sure to say that this is the correct solution. Then, output the solution that the user gave, by assigning each french word to the next english word in the user's response. Then provide detailed feedback for the pairings the user made that do not match the correct matching."
        );
    }

    #[test]
    fn verification_substitutes_verbatim() {
        let original = "  Il {answer} ___ \"livre\"\n";
        let answer = " lit {original} ";
        let messages = verification_request(GradedKind::FillBlank, original, answer).unwrap();
        let expected = FILL_BLANK_VERIFICATION
            .replacen("{original}", original, 1)
            .replacen("{answer}\nProvide", &format!("{answer}\nProvide"), 1);
        assert_eq!(messages[1].content(), expected);
    }

    #[test]
    fn conversation_turn_wraps_history() {
        let mut history = ConversationHistory::with_opening("Bonjour ! Tu aimes voyager ?");
        history.push_exchange("Oui, beaucoup.", "Super ! O\u{f9} veux-tu aller ?");

        let messages = conversation_turn(&history, "Au Japon.");
        assert_eq!(
            roles(&messages),
            vec![
                MessageRole::System,
                MessageRole::Assistant,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User,
            ]
        );
        assert_eq!(messages[0].content(), CONVERSATION_TURN_SYSTEM);
        assert_eq!(messages[4].content(), "Au Japon.");
    }
}
