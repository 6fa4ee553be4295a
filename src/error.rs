/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// Upstream kept answering `429 Too Many Requests` after all retries.
    #[error("rate limit exceeded after {retries} retries")]
    RateLimited {
        /// Wait hint from the last `Retry-After` header, in seconds.
        retry_after_secs: Option<u64>,
        /// Number of retries spent before giving up.
        retries: usize,
    },
    /// Non-success HTTP status code with raw response body.
    #[error("upstream error {status} after {retries} retries: {body}")]
    Upstream {
        status: u16,
        body: String,
        /// Zero for statuses that are never retried.
        retries: usize,
    },
    /// Network or request execution error from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// Successful response whose body is not a chat-completion document.
    #[error("decode error: {0}")]
    Decode(String),
    /// Rejected locally before any network call.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl CompletionError {
    /// Returns `true` for errors the end user may retry later.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Advisory wait, suitable for forwarding as a `Retry-After` header.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            Self::RateLimited {
                retry_after_secs, ..
            } => *retry_after_secs,
            _ => None,
        }
    }

    /// Status an HTTP front-end should answer with: 429 for rate limits,
    /// 400 for locally rejected input, 500 for everything else.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::RateLimited { .. } => 429,
            Self::InvalidRequest(_) => 400,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::CompletionError;

    #[test]
    fn rate_limit_maps_to_429_with_hint() {
        let err = CompletionError::RateLimited {
            retry_after_secs: Some(12),
            retries: 3,
        };
        assert!(err.is_rate_limit());
        assert_eq!(err.http_status(), 429);
        assert_eq!(err.retry_after_secs(), Some(12));
    }

    #[test]
    fn invalid_request_maps_to_400() {
        let err = CompletionError::InvalidRequest("same language".to_owned());
        assert_eq!(err.http_status(), 400);
        assert!(!err.is_rate_limit());
    }

    #[test]
    fn upstream_maps_to_500_without_hint() {
        let err = CompletionError::Upstream {
            status: 404,
            body: "not found".to_owned(),
            retries: 0,
        };
        assert!(!err.is_rate_limit());
        assert_eq!(err.http_status(), 500);
        assert_eq!(err.retry_after_secs(), None);
        assert_eq!(
            err.to_string(),
            "upstream error 404 after 0 retries: not found"
        );
    }
}
