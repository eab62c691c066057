//! Prep-brief generation for DemoGenie.
//!
//! - `llm` is the completion-service seam: the `LlmClient` trait and an
//!   OpenAI-compatible HTTP client.
//! - `prep_brief` renders the prompt, calls the client, parses the answer
//!   and falls back to the template brief from `demogenie-core` on any
//!   failure.
//!
//! # Safety Principle
//!
//! The LLM only writes prose for the AE. It never decides which AE takes a
//! booking or when; assignment stays in the deterministic scheduler.

pub mod llm;
pub mod prep_brief;

pub use llm::{CompletionRequest, LlmClient, LlmError, LlmErrorKind, OpenAiChatClient};
pub use prep_brief::{BriefGenerationError, GenerationSettings, PrepBriefGenerator};
