use serde::{Deserialize, Serialize};

/// Response to `INIT`, `FINALIZE` and `STATUS`.
#[derive(Debug, Deserialize)]
pub(crate) struct MediaResponse {
    pub(crate) media_id_string: String,
    pub(crate) processing_info: Option<ProcessingInfo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProcessingInfo {
    /// `pending`, `in_progress`, `succeeded` or `failed`.
    pub(crate) state: String,
    pub(crate) check_after_secs: Option<u64>,
    pub(crate) error: Option<ProcessingError>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProcessingError {
    pub(crate) code: Option<i64>,
    pub(crate) name: Option<String>,
    pub(crate) message: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateTweet<'a> {
    pub(crate) text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) media: Option<TweetMedia<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct TweetMedia<'a> {
    pub(crate) media_ids: Vec<&'a str>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateTweetResponse {
    pub(crate) data: CreatedTweet,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreatedTweet {
    pub(crate) id: String,
}

/// Error envelope; v1.1 uses `errors[]`, v2 uses `title`/`detail`.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub(crate) errors: Vec<ErrorEntry>,
    pub(crate) title: Option<String>,
    pub(crate) detail: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEntry {
    pub(crate) code: Option<i64>,
    pub(crate) message: Option<String>,
}

impl ErrorBody {
    /// First error code and a human-readable message, falling back to the raw body.
    pub(crate) fn summarize(raw: &str) -> (Option<i64>, String) {
        let parsed: ErrorBody = serde_json::from_str(raw).unwrap_or_default();
        if let Some(first) = parsed.errors.first() {
            return (
                first.code,
                first.message.clone().unwrap_or_else(|| raw.to_string()),
            );
        }
        let message = match (parsed.title, parsed.detail) {
            (_, Some(detail)) => detail,
            (Some(title), None) => title,
            (None, None) if raw.trim().is_empty() => "empty response body".to_string(),
            (None, None) => raw.trim().to_string(),
        };
        (None, message)
    }
}
