//! French language tutor built on a hosted chat-completion API.
//!
//! This crate bundles the workspace crates behind feature flags. The usual
//! entry point is [`kernel::SessionController`], driven by a
//! [`adapters::completion::CompletionService`]:
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use std::sync::Arc;
//!
//! use lingua_tutor::prelude::*;
//!
//! let adapter = OpenAiAdapter::new(OpenAiConfig::from_env("gpt-4o-mini"))?;
//! let completion = AdapterCompletion::new(Arc::new(adapter));
//! let mut session = SessionController::new(Arc::new(completion), CompletionParams::default());
//!
//! let task = session.reset("Paris travel", ExerciseKind::FillBlank).await?;
//! println!("{task}");
//! let feedback = session.respond("suis").await?;
//! println!("{feedback}");
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, clippy::pedantic)]

/// Exercise kinds, topics and session identifiers.
pub use tutor_primitives as primitives;

/// Dialogue state machine and session controller (enabled by `kernel` feature).
#[cfg(feature = "kernel")]
pub use tutor_kernel as kernel;

/// Completion service and the `OpenAI` adapter (enabled by `adapters` feature).
#[cfg(feature = "adapters")]
pub use tutor_adapters as adapters;

/// Exercise prompts and conversation history (enabled by `prompts` feature).
#[cfg(feature = "prompts")]
pub use tutor_prompts as prompts;

/// Layered configuration (enabled by `config` feature).
#[cfg(feature = "config")]
pub use tutor_config as config;

/// Tracing setup (enabled by `telemetry` feature).
#[cfg(feature = "telemetry")]
pub use tutor_telemetry as telemetry;

/// Types needed to run a session.
pub mod prelude {
    pub use tutor_primitives::{ExerciseKind, GradedKind, SessionId, Topic};

    #[cfg(feature = "adapters")]
    pub use tutor_adapters::completion::{
        AdapterCompletion, CompletionParams, CompletionService, RetryPolicy,
    };
    #[cfg(feature = "adapters")]
    pub use tutor_adapters::openai::{OpenAiAdapter, OpenAiConfig};

    #[cfg(feature = "kernel")]
    pub use tutor_kernel::{DialogueState, Reply, ReplyOutcome, SessionController};
}
