use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config file is not valid JSON: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("account '{0}' not found in config file")]
    UnknownAccount(String),

    #[error("account '{account}' is missing required field '{field}'")]
    MissingField { account: String, field: String },

    #[error("account '{account}' has invalid field '{field}': {reason}")]
    InvalidField {
        account: String,
        field: String,
        reason: String,
    },

    #[error(
        "message ceiling {ceiling} leaves no room for a {link_width}-character link, separator and ellipsis"
    )]
    MessageCeiling { ceiling: usize, link_width: usize },
}

/// Why a URL was not accepted as direct media.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotMediaReason {
    NoPath,
    NoExtension,
    UnsupportedExtension(String),
    HostNotAccepted(String),
}

impl std::fmt::Display for NotMediaReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NotMediaReason::NoPath => write!(f, "URL has no path"),
            NotMediaReason::NoExtension => write!(f, "final path segment has no extension"),
            NotMediaReason::UnsupportedExtension(ext) => {
                write!(f, "extension '{ext}' is not a supported media type")
            }
            NotMediaReason::HostNotAccepted(host) => {
                write!(f, "host '{host}' is not an accepted media host")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not a media URL: {url} ({reason})")]
pub struct NotMedia {
    pub url: String,
    pub reason: NotMediaReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no media found in the first {examined} candidates")]
pub struct NoMediaFound {
    pub examined: usize,
}

/// Failures reported by a [`crate::FeedSource`].
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed authentication failed: {0}")]
    Auth(String),

    #[error("feed rate limited the request")]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("feed request failed: {0}")]
    Request(String),
}

/// Failures reported by a [`crate::ByteFetcher`].
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("download of {url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("download of {url} failed: {reason}")]
    Transport { url: String, reason: String },
}

/// Platform-specific classification of a rejected upload or post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionKind {
    RateLimited,
    MediaTooLarge,
    AuthExpired,
    Other,
}

impl std::fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionKind::RateLimited => write!(f, "rate limited"),
            RejectionKind::MediaTooLarge => write!(f, "media too large"),
            RejectionKind::AuthExpired => write!(f, "auth expired"),
            RejectionKind::Other => write!(f, "rejected"),
        }
    }
}

/// Failures reported by a [`crate::Publisher`].
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("platform rejected the request ({kind}, HTTP {status}): {message}")]
    Rejected {
        kind: RejectionKind,
        status: u16,
        message: String,
    },

    #[error("unexpected publish failure: {0}")]
    Unexpected(String),
}
