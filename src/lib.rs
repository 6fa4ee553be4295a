//! `stockai-completion` is an async chat-completion client for OpenRouter and
//! OpenAI-compatible endpoints.
//!
//! Requests that hit `429 Too Many Requests` or a 5xx status are retried with
//! exponential backoff (or the upstream's `Retry-After` hint). Rate limits
//! surface as [`CompletionError::RateLimited`], distinct from other failures.
//!
//! Entry points:
//! - [`CompletionClient::complete`]
//! - [`CompletionClient::generate_report`]
//! - [`CompletionClient::translate`]

pub mod backoff;
mod client;
mod config;
mod error;
mod options;
mod provider;
pub mod report;
pub mod translate;
mod types;
mod wire;

pub use client::CompletionClient;
pub use config::Config;
pub use error::CompletionError;
pub use options::RetryPolicy;
pub use provider::{Provider, OPENAI_CHAT_URL, OPENROUTER_CHAT_URL};
pub use report::ReportInput;
pub use translate::Translation;
pub use types::{Attempt, ChatMessage, CompletionRequest, CompletionResult, Role};

pub type Result<T> = std::result::Result<T, CompletionError>;
