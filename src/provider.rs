use crate::RetryPolicy;

pub const OPENROUTER_CHAT_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
pub const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Upstream chat-completion provider.
///
/// All variants speak the same OpenAI-style protocol and differ only in
/// endpoint and extra headers. OpenAI also gets a lower backoff cap.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Provider {
    OpenRouter {
        /// Sent as `HTTP-Referer`.
        referer: Option<String>,
        /// Sent as `X-Title`.
        title: Option<String>,
    },
    OpenAi,
    /// Any OpenAI-compatible endpoint, e.g. a local gateway or a test server.
    Custom {
        url: String,
        /// Sent verbatim with every request.
        headers: Vec<(String, String)>,
    },
}

impl Default for Provider {
    fn default() -> Self {
        Self::OpenRouter {
            referer: None,
            title: None,
        }
    }
}

impl Provider {
    pub fn chat_url(&self) -> &str {
        match self {
            Self::OpenRouter { .. } => OPENROUTER_CHAT_URL,
            Self::OpenAi => OPENAI_CHAT_URL,
            Self::Custom { url, .. } => url,
        }
    }

    /// Provider-specific headers, skipping unset or blank values.
    pub fn extra_headers(&self) -> Vec<(&str, &str)> {
        let mut headers = Vec::new();
        match self {
            Self::OpenRouter { referer, title } => {
                if let Some(referer) = non_blank(referer) {
                    headers.push(("HTTP-Referer", referer));
                }
                if let Some(title) = non_blank(title) {
                    headers.push(("X-Title", title));
                }
            }
            Self::Custom { headers: custom, .. } => {
                headers.extend(
                    custom
                        .iter()
                        .map(|(name, value)| (name.as_str(), value.as_str())),
                );
            }
            Self::OpenAi => {}
        }
        headers
    }

    /// OpenAI-compatible endpoint at `url` without extra headers.
    pub fn custom(url: impl Into<String>) -> Self {
        Self::Custom {
            url: url.into(),
            headers: Vec::new(),
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenRouter { .. } | Self::Custom { .. } => "openrouter/auto",
            Self::OpenAi => "gpt-3.5-turbo",
        }
    }

    /// OpenAI caps exponential backoff at 5s, everything else at 6s.
    pub fn default_retry_policy(&self) -> RetryPolicy {
        match self {
            Self::OpenAi => RetryPolicy::default().with_max_delay_ms(5_000),
            Self::OpenRouter { .. } | Self::Custom { .. } => RetryPolicy::default(),
        }
    }

    #[cfg_attr(not(feature = "tracing"), allow(dead_code))]
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::OpenRouter { .. } => "openrouter",
            Self::OpenAi => "openai",
            Self::Custom { .. } => "custom",
        }
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::{Provider, OPENAI_CHAT_URL, OPENROUTER_CHAT_URL};

    #[test]
    fn openrouter_sends_only_configured_headers() {
        let provider = Provider::OpenRouter {
            referer: Some("https://stocks.example".to_owned()),
            title: Some("  ".to_owned()),
        };
        assert_eq!(provider.chat_url(), OPENROUTER_CHAT_URL);
        assert_eq!(
            provider.extra_headers(),
            vec![("HTTP-Referer", "https://stocks.example")]
        );
    }

    #[test]
    fn openai_has_no_extra_headers_and_lower_cap() {
        let provider = Provider::OpenAi;
        assert_eq!(provider.chat_url(), OPENAI_CHAT_URL);
        assert!(provider.extra_headers().is_empty());
        assert_eq!(provider.default_retry_policy().max_delay_ms, 5_000);
        assert_eq!(Provider::default().default_retry_policy().max_delay_ms, 6_000);
    }

    #[test]
    fn custom_endpoint_passes_headers_through() {
        let provider = Provider::Custom {
            url: "http://127.0.0.1:9/v1/chat/completions".to_owned(),
            headers: vec![("X-Team".to_owned(), "research".to_owned())],
        };
        assert_eq!(provider.chat_url(), "http://127.0.0.1:9/v1/chat/completions");
        assert_eq!(provider.extra_headers(), vec![("X-Team", "research")]);
        assert!(Provider::custom("http://localhost").extra_headers().is_empty());
    }
}
