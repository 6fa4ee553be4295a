use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Chat-completion request body, sent as-is to the upstream endpoint.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl CompletionRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens: 800,
            temperature: 0.7,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    /// Clamped into `[0, 2]`.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }
}

/// One network call made by the retry loop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attempt {
    /// 1-indexed.
    pub number: usize,
    pub status: u16,
    /// Wait scheduled before the next attempt; `None` for the last one.
    pub delay: Option<Duration>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionResult {
    /// First choice's message content; `None` when the upstream sent no
    /// choices or a null content.
    pub content: Option<String>,
    pub total_tokens: Option<u64>,
    pub attempts: Vec<Attempt>,
}

impl CompletionResult {
    /// Content, or an empty string when absent.
    pub fn text(&self) -> &str {
        self.content.as_deref().unwrap_or_default()
    }

    pub fn into_text(self) -> String {
        self.content.unwrap_or_default()
    }

    /// Number of retries spent before the successful call.
    pub fn retries(&self) -> usize {
        self.attempts.len().saturating_sub(1)
    }

    /// Sum of all backoff waits.
    pub fn total_delay(&self) -> Duration {
        self.attempts.iter().filter_map(|attempt| attempt.delay).sum()
    }
}
