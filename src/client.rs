use std::fmt;
use std::time::Duration;

use reqwest::header;
use tokio::time::sleep;

use crate::{
    backoff::{classify_status, parse_retry_after, retry_delay, StatusClass},
    wire::ChatCompletionResponse,
    Attempt, CompletionError, CompletionRequest, CompletionResult, Config, Provider, Result,
    RetryPolicy,
};

#[derive(Clone)]
/// Chat-completion client with retry/backoff on 429 and 5xx responses.
///
/// Cloning is cheap and clones share the connection pool; every call runs
/// its own retry loop.
pub struct CompletionClient {
    http: reqwest::Client,
    authorization: String,
    config: Config,
}

impl fmt::Debug for CompletionClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompletionClient")
            .field("chat_url", &self.config.provider.chat_url())
            .field("authorization", &"<redacted>")
            .field("config", &self.config)
            .finish()
    }
}

impl CompletionClient {
    /// Creates a client from an explicit configuration.
    pub fn new(config: Config) -> Self {
        Self::with_http_client(reqwest::Client::new(), config)
    }

    /// Creates a client that reuses an existing `reqwest::Client`.
    pub fn with_http_client(http: reqwest::Client, config: Config) -> Self {
        Self {
            http,
            authorization: normalize_bearer_authorization(&config.api_key),
            config,
        }
    }

    /// Creates an OpenRouter client from environment variables.
    ///
    /// See [`Config::from_env`] for the variables read.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use stockai_completion::CompletionClient;
    ///
    /// let client = CompletionClient::from_env().expect("missing OPENROUTER_API_KEY");
    /// ```
    pub fn from_env() -> std::result::Result<Self, String> {
        Config::from_env().map(Self::new)
    }

    /// Replaces the retry policy used by [`CompletionClient::complete`].
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn provider(&self) -> &Provider {
        &self.config.provider
    }

    /// Sends `request` using the client's retry policy.
    pub async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResult> {
        self.complete_with_policy(request, &self.config.retry).await
    }

    /// Sends `request`, retrying 429 and 5xx responses according to `policy`.
    ///
    /// Other non-success statuses and transport failures are returned
    /// immediately. A 2xx response without choices yields an empty result.
    pub async fn complete_with_policy(
        &self,
        request: &CompletionRequest,
        policy: &RetryPolicy,
    ) -> Result<CompletionResult> {
        let mut attempts: Vec<Attempt> = Vec::new();
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            let response = self
                .build_request(request)
                .send()
                .await
                .map_err(CompletionError::Transport)?;

            let status = response.status();
            match classify_status(status) {
                StatusClass::Success => {
                    attempts.push(Attempt {
                        number: attempt,
                        status: status.as_u16(),
                        delay: None,
                    });
                    let body = response.text().await.map_err(CompletionError::Transport)?;
                    return Self::decode_success(&body, attempts);
                }
                StatusClass::Retryable => {
                    let retry_after_secs = parse_retry_after(response.headers());
                    if attempt > policy.max_retries {
                        let body = response.text().await.unwrap_or_default();
                        return Err(self.exhausted(status, body, retry_after_secs, policy));
                    }

                    let delay = retry_delay(policy, attempt, retry_after_secs);
                    #[cfg(feature = "tracing")]
                    tracing::warn!(
                        provider = self.config.provider.name(),
                        status = status.as_u16(),
                        attempt,
                        max_retries = policy.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "chat completion failed, retrying"
                    );
                    attempts.push(Attempt {
                        number: attempt,
                        status: status.as_u16(),
                        delay: Some(delay),
                    });
                    drop(response);
                    sleep(delay).await;
                }
                StatusClass::Fatal => {
                    let body = response.text().await.unwrap_or_default();
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        provider = self.config.provider.name(),
                        status = status.as_u16(),
                        attempt,
                        "chat completion rejected"
                    );
                    return Err(CompletionError::Upstream {
                        status: status.as_u16(),
                        body,
                        retries: attempt - 1,
                    });
                }
            }
        }
    }

    fn build_request(&self, request: &CompletionRequest) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .post(self.config.provider.chat_url())
            .header(header::AUTHORIZATION, &self.authorization)
            .header(header::CONTENT_TYPE, "application/json");
        for (name, value) in self.config.provider.extra_headers() {
            builder = builder.header(name, value);
        }
        if let Some(timeout_ms) = self.config.timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }
        builder.json(request)
    }

    fn exhausted(
        &self,
        status: reqwest::StatusCode,
        body: String,
        retry_after_secs: Option<u64>,
        policy: &RetryPolicy,
    ) -> CompletionError {
        #[cfg(feature = "tracing")]
        tracing::debug!(
            provider = self.config.provider.name(),
            status = status.as_u16(),
            retries = policy.max_retries,
            "chat completion retries exhausted"
        );
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            CompletionError::RateLimited {
                retry_after_secs,
                retries: policy.max_retries,
            }
        } else {
            CompletionError::Upstream {
                status: status.as_u16(),
                body,
                retries: policy.max_retries,
            }
        }
    }

    fn decode_success(body: &str, attempts: Vec<Attempt>) -> Result<CompletionResult> {
        let parsed = serde_json::from_str::<ChatCompletionResponse>(body).map_err(|err| {
            CompletionError::Decode(format!(
                "invalid chat completion JSON: {err}; body: {body}"
            ))
        })?;
        let total_tokens = parsed.usage.as_ref().and_then(|usage| usage.total_tokens);
        Ok(CompletionResult {
            content: parsed.into_first_content(),
            total_tokens,
            attempts,
        })
    }
}

fn normalize_bearer_authorization(token: &str) -> String {
    let trimmed = token.trim();
    let prefix = trimmed.get(..7);
    if prefix.is_some_and(|value| value.eq_ignore_ascii_case("bearer ")) {
        trimmed.to_owned()
    } else {
        format!("Bearer {trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::{normalize_bearer_authorization, CompletionClient};
    use crate::{Config, Provider};

    #[test]
    fn normalize_bearer_adds_prefix_when_missing() {
        assert_eq!(
            normalize_bearer_authorization("sk-abc123"),
            "Bearer sk-abc123".to_owned()
        );
    }

    #[test]
    fn normalize_bearer_keeps_existing_prefix() {
        assert_eq!(
            normalize_bearer_authorization("bEaReR sk-abc123"),
            "bEaReR sk-abc123".to_owned()
        );
    }

    #[test]
    fn debug_redacts_authorization_value() {
        let client = CompletionClient::new(Config::new(Provider::OpenAi, "secret-token"));
        let debug = format!("{client:?}");
        assert!(debug.contains("<redacted>"));
        assert!(!debug.contains("secret-token"));
    }
}
