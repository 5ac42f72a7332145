//! Completion service adapters used by the tutor.
//!
//! Provider implementations share the streaming [`traits::ModelAdapter`]
//! interface. The dialogue core talks to the narrower
//! [`completion::CompletionService`] contract, which collects a provider
//! stream into text and applies a timeout and a single retry.

#![warn(missing_docs, clippy::pedantic)]

pub mod completion;
pub mod openai;
pub mod traits;

mod http_client;
