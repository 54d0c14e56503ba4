use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::media_url::{MediaUrlResolver, DEFAULT_MEDIA_HOSTS};
use crate::message::{MessageComposer, DEFAULT_LINK_LENGTH, DEFAULT_MAX_MESSAGE_LENGTH};
use crate::types::{RedditCredentials, Timeframe, TwitterCredentials};

/// Largest media upload the platform accepts, in bytes.
pub const DEFAULT_MAX_MEDIA_BYTES: u64 = 3_072_000;
pub const DEFAULT_MAX_VIDEO_SECS: u64 = 30;
pub const DEFAULT_CANDIDATE_LIMIT: usize = 10;

/// Immutable per-account settings, read once at startup.
#[derive(Debug, Clone)]
pub struct AccountConfig {
    pub account: String,
    pub twitter: TwitterCredentials,
    pub reddit: RedditCredentials,
    pub hashtags: Vec<String>,
    pub error_message: String,
    pub subreddit: String,
    pub update_rate: Timeframe,
    pub candidate_limit: usize,
    pub media_hosts: Vec<String>,
    pub max_media_bytes: u64,
    pub max_message_length: usize,
    pub link_length: usize,
    pub max_video_secs: u64,
    pub work_dir: PathBuf,
    pub request_timeout_secs: u64,
    pub run_timeout_secs: u64,
    pub fallback_on_error: bool,
}

impl AccountConfig {
    /// # Errors
    ///
    /// Returns [`ConfigError::MessageCeiling`] if the ceiling is too small;
    /// configs built by [`parse_account_config`] have already been checked.
    pub fn message_composer(&self) -> Result<MessageComposer, ConfigError> {
        MessageComposer::new(self.max_message_length, self.link_length)
    }

    #[must_use]
    pub fn media_resolver(&self) -> MediaUrlResolver {
        MediaUrlResolver::new(self.media_hosts.iter().cloned())
    }
}

/// Load the settings for `account` from the JSON config file at `path`.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read or parsed, the account is
/// absent, or any required field is missing or invalid.
pub fn load_account_config(path: &Path, account: &str) -> Result<AccountConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_account_config(&content, account)
}

/// Parse the settings for `account` out of a config document.
///
/// The document is an object keyed by account name; each value holds that
/// account's credentials and options.
///
/// # Errors
///
/// Same as [`load_account_config`], minus I/O.
pub fn parse_account_config(content: &str, account: &str) -> Result<AccountConfig, ConfigError> {
    let document: Value = serde_json::from_str(content).map_err(ConfigError::Parse)?;
    let entry = document
        .get(account)
        .and_then(Value::as_object)
        .ok_or_else(|| ConfigError::UnknownAccount(account.to_string()))?;
    build_account_config(account, entry)
}

fn build_account_config(
    account: &str,
    entry: &Map<String, Value>,
) -> Result<AccountConfig, ConfigError> {
    let missing = |field: &str| ConfigError::MissingField {
        account: account.to_string(),
        field: field.to_string(),
    };
    let invalid = |field: &str, reason: String| ConfigError::InvalidField {
        account: account.to_string(),
        field: field.to_string(),
        reason,
    };
    let present = |field: &str| entry.get(field).filter(|v| !v.is_null());

    let require_str = |field: &str| -> Result<String, ConfigError> {
        match present(field) {
            None => Err(missing(field)),
            Some(Value::String(s)) if s.trim().is_empty() => {
                Err(invalid(field, "must not be empty".to_string()))
            }
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Err(invalid(
                field,
                format!("expected a string, got {}", json_type(other)),
            )),
        }
    };

    let str_list = |field: &str, value: &Value| -> Result<Vec<String>, ConfigError> {
        let Value::Array(items) = value else {
            return Err(invalid(
                field,
                format!("expected a list of strings, got {}", json_type(value)),
            ));
        };
        items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_owned).ok_or_else(|| {
                    invalid(
                        field,
                        format!("expected a list of strings, found {}", json_type(item)),
                    )
                })
            })
            .collect()
    };

    let optional_u64 = |field: &str, default: u64| -> Result<u64, ConfigError> {
        present(field).map_or(Ok(default), |v| {
            v.as_u64()
                .filter(|n| *n > 0)
                .ok_or_else(|| invalid(field, format!("expected a positive integer, got {v}")))
        })
    };

    let optional_usize = |field: &str, default: usize| -> Result<usize, ConfigError> {
        let raw = optional_u64(field, default as u64)?;
        usize::try_from(raw).map_err(|e| invalid(field, e.to_string()))
    };

    let consumer_key = require_str("consumer_key")?;
    let consumer_secret = require_str("secret_consumer_key")?;
    let access_token = require_str("access_token")?;
    let access_token_secret = require_str("secret_access_token")?;

    let hashtags = match present("hashtags") {
        None => return Err(missing("hashtags")),
        Some(v) => str_list("hashtags", v)?,
    };
    let error_message = require_str("error_message")?;
    let subreddit = require_str("subreddit")?;
    let update_rate = require_str("update_rate")?
        .parse::<Timeframe>()
        .map_err(|reason| invalid("update_rate", reason))?;

    let client_id = require_str("reddit_client_id")?;
    let client_secret = require_str("reddit_client_secret")?;
    let user_agent = require_str("reddit_user_agent")?;

    let candidate_limit = optional_usize("candidate_limit", DEFAULT_CANDIDATE_LIMIT)?;
    let media_hosts = match present("media_hosts") {
        None => DEFAULT_MEDIA_HOSTS.iter().map(ToString::to_string).collect(),
        Some(v) => str_list("media_hosts", v)?,
    };
    let max_media_bytes = optional_u64("max_media_bytes", DEFAULT_MAX_MEDIA_BYTES)?;
    let max_message_length = optional_usize("max_message_length", DEFAULT_MAX_MESSAGE_LENGTH)?;
    let link_length = optional_usize("link_length", DEFAULT_LINK_LENGTH)?;
    let max_video_secs = optional_u64("max_video_secs", DEFAULT_MAX_VIDEO_SECS)?;
    let request_timeout_secs = optional_u64("request_timeout_secs", 30)?;
    let run_timeout_secs = optional_u64("run_timeout_secs", 300)?;

    let work_dir = match present("work_dir") {
        None => std::env::temp_dir(),
        Some(Value::String(s)) if !s.trim().is_empty() => PathBuf::from(s),
        Some(other) => {
            return Err(invalid(
                "work_dir",
                format!("expected a directory path, got {other}"),
            ))
        }
    };

    let fallback_on_error = match present("fallback_on_error") {
        None => false,
        Some(Value::Bool(b)) => *b,
        Some(other) => {
            return Err(invalid(
                "fallback_on_error",
                format!("expected a boolean, got {}", json_type(other)),
            ))
        }
    };

    // Reject ceilings that could not hold any title before a run starts.
    MessageComposer::new(max_message_length, link_length)?;

    // The fallback is posted verbatim, so it must fit the same ceiling.
    let error_message_length = error_message.chars().count();
    if error_message_length > max_message_length {
        return Err(invalid(
            "error_message",
            format!(
                "{error_message_length} characters exceeds max_message_length {max_message_length}"
            ),
        ));
    }

    Ok(AccountConfig {
        account: account.to_string(),
        twitter: TwitterCredentials {
            consumer_key,
            consumer_secret,
            access_token,
            access_token_secret,
        },
        reddit: RedditCredentials {
            client_id,
            client_secret,
            user_agent,
        },
        hashtags,
        error_message,
        subreddit,
        update_rate,
        candidate_limit,
        media_hosts,
        max_media_bytes,
        max_message_length,
        link_length,
        max_video_secs,
        work_dir,
        request_timeout_secs,
        run_timeout_secs,
        fallback_on_error,
    })
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
