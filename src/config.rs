use std::fmt;

use crate::{Provider, RetryPolicy};

const DEFAULT_MAX_TOKENS: u32 = 800;

/// Everything a [`crate::CompletionClient`] needs, passed in explicitly.
#[derive(Clone, PartialEq)]
pub struct Config {
    pub provider: Provider,
    pub api_key: String,
    pub model: String,
    /// Token budget for generated reports.
    pub max_tokens: u32,
    pub retry: RetryPolicy,
    /// Per-request timeout; `None` waits for the upstream indefinitely.
    pub timeout_ms: Option<u64>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("provider", &self.provider)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("retry", &self.retry)
            .field("timeout_ms", &self.timeout_ms)
            .finish()
    }
}

impl Config {
    /// Config with the provider's default model and retry policy.
    pub fn new(provider: Provider, api_key: impl Into<String>) -> Self {
        Self {
            model: provider.default_model().to_owned(),
            retry: provider.default_retry_policy(),
            provider,
            api_key: api_key.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout_ms: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = Some(timeout_ms);
        self
    }

    /// Reads an OpenRouter config from the process environment.
    ///
    /// Reads:
    /// - `OPENROUTER_API_KEY`, falling back to `OPENAI_API_KEY`
    /// - `OPENROUTER_MODEL` / `OPENAI_MODEL` (default `openrouter/auto`)
    /// - `OPENROUTER_MAX_RETRIES` / `OPENAI_MAX_RETRIES` (default 3)
    /// - `OPENROUTER_MAX_TOKENS` / `OPENAI_MAX_TOKENS` (default 800)
    /// - `OPENROUTER_REFERER`, `OPENROUTER_TITLE` (optional headers)
    ///
    /// Returns an error if no API key is set.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use stockai_completion::Config;
    ///
    /// let config = Config::from_env().expect("missing OPENROUTER_API_KEY");
    /// ```
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let first = |keys: &[&str]| keys.iter().find_map(|key| non_empty(lookup(*key)));

        let api_key = first(&["OPENROUTER_API_KEY", "OPENAI_API_KEY"])
            .ok_or_else(|| "missing OPENROUTER_API_KEY environment variable".to_owned())?;
        let provider = Provider::OpenRouter {
            referer: first(&["OPENROUTER_REFERER"]),
            title: first(&["OPENROUTER_TITLE"]),
        };
        let mut config = Self::new(provider, api_key);

        if let Some(model) = first(&["OPENROUTER_MODEL", "OPENAI_MODEL"]) {
            config.model = model;
        }
        config.retry.max_retries = parse_or(
            first(&["OPENROUTER_MAX_RETRIES", "OPENAI_MAX_RETRIES"]),
            config.retry.max_retries,
        );
        config.max_tokens = parse_or(
            first(&["OPENROUTER_MAX_TOKENS", "OPENAI_MAX_TOKENS"]),
            DEFAULT_MAX_TOKENS,
        );
        Ok(config)
    }

    /// Reads an OpenAI config from the process environment.
    ///
    /// Reads `OPENAI_API_KEY` (required), `OPENAI_MODEL`
    /// (default `gpt-3.5-turbo`), `OPENAI_MAX_RETRIES` and
    /// `OPENAI_MAX_TOKENS`.
    pub fn openai_from_env() -> Result<Self, String> {
        Self::openai_from_lookup(|key| std::env::var(key).ok())
    }

    pub fn openai_from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));

        let api_key = get("OPENAI_API_KEY")
            .ok_or_else(|| "missing OPENAI_API_KEY environment variable".to_owned())?;
        let mut config = Self::new(Provider::OpenAi, api_key);

        if let Some(model) = get("OPENAI_MODEL") {
            config.model = model;
        }
        config.retry.max_retries = parse_or(get("OPENAI_MAX_RETRIES"), config.retry.max_retries);
        config.max_tokens = parse_or(get("OPENAI_MAX_TOKENS"), DEFAULT_MAX_TOKENS);
        Ok(config)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
