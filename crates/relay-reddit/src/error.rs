use relay_core::FeedError;
use thiserror::Error;

/// Errors returned by the Reddit API client.
#[derive(Debug, Error)]
pub enum RedditError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Reddit answered with a non-2xx status.
    #[error("{context} returned HTTP {status}")]
    Status {
        context: String,
        status: u16,
        retry_after_secs: Option<u64>,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    BaseUrl { url: String, reason: String },
}

impl From<RedditError> for FeedError {
    fn from(err: RedditError) -> Self {
        match &err {
            RedditError::Status { status: 401 | 403, .. } => FeedError::Auth(err.to_string()),
            RedditError::Status {
                status: 429,
                retry_after_secs,
                ..
            } => FeedError::RateLimited {
                retry_after_secs: *retry_after_secs,
            },
            _ => FeedError::Request(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(status: u16) -> RedditError {
        RedditError::Status {
            context: "top listing".to_string(),
            status,
            retry_after_secs: Some(12),
        }
    }

    #[test]
    fn auth_statuses_map_to_auth() {
        assert!(matches!(FeedError::from(status(401)), FeedError::Auth(_)));
        assert!(matches!(FeedError::from(status(403)), FeedError::Auth(_)));
    }

    #[test]
    fn too_many_requests_keeps_retry_hint() {
        assert!(matches!(
            FeedError::from(status(429)),
            FeedError::RateLimited {
                retry_after_secs: Some(12)
            }
        ));
    }

    #[test]
    fn other_statuses_are_request_failures() {
        let err = FeedError::from(status(503));
        assert!(matches!(err, FeedError::Request(ref m) if m.contains("503")));
    }
}
