use relay_core::{PublishError, RejectionKind};
use thiserror::Error;

/// Errors returned by the Twitter client.
#[derive(Debug, Error)]
pub enum TwitterError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API refused a request, or media processing ended in `failed`.
    #[error("{context} rejected ({kind}, HTTP {status}): {message}")]
    Api {
        context: String,
        status: u16,
        kind: RejectionKind,
        message: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("media {media_id} still processing after {polls} status checks")]
    ProcessingTimeout { media_id: String, polls: u32 },

    #[error("request signing failed: {0}")]
    Signing(String),

    #[error("invalid base URL '{url}': {reason}")]
    BaseUrl { url: String, reason: String },
}

impl From<TwitterError> for PublishError {
    fn from(err: TwitterError) -> Self {
        match err {
            TwitterError::Api {
                status,
                kind,
                message,
                ..
            } => PublishError::Rejected {
                kind,
                status,
                message,
            },
            other => PublishError::Unexpected(other.to_string()),
        }
    }
}

/// v1.1 error codes: 88 rate limit, 32/89 bad or expired token, 324/325 media.
pub(crate) fn classify_rejection(status: u16, code: Option<i64>, message: &str) -> RejectionKind {
    let lowered = message.to_ascii_lowercase();
    if status == 429 || code == Some(88) {
        RejectionKind::RateLimited
    } else if status == 401 || matches!(code, Some(32 | 89)) {
        RejectionKind::AuthExpired
    } else if status == 413
        || lowered.contains("too large")
        || lowered.contains("size exceeds")
        || lowered.contains("filesizeexceeded")
    {
        RejectionKind::MediaTooLarge
    } else {
        RejectionKind::Other
    }
}
