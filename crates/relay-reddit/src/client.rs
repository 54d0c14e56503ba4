//! HTTP client for Reddit's app-only OAuth API.
//!
//! Every listing request exchanges the client credentials for a fresh bearer
//! token first. A run reads a single listing, so nothing is cached.

use std::time::Duration;

use relay_core::{Candidate, FeedError, FeedSource, RedditCredentials, Timeframe};
use reqwest::{Client, Response, Url};

use crate::error::RedditError;
use crate::types::{Listing, PostData, TokenResponse};

const DEFAULT_AUTH_BASE_URL: &str = "https://www.reddit.com/";
const DEFAULT_API_BASE_URL: &str = "https://oauth.reddit.com/";
const SHORTLINK_BASE: &str = "https://redd.it/";

/// Client for Reddit listings.
///
/// Use [`RedditClient::new`] for production or [`RedditClient::with_base_urls`]
/// to point at a mock server in tests.
pub struct RedditClient {
    client: Client,
    credentials: RedditCredentials,
    auth_base: Url,
    api_base: Url,
}

fn parse_base(url: &str) -> Result<Url, RedditError> {
    let normalised = format!("{}/", url.trim_end_matches('/'));
    Url::parse(&normalised).map_err(|e| RedditError::BaseUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

fn retry_after_secs(response: &Response) -> Option<u64> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Converts a listing entry into a candidate linked by its shortlink.
fn to_candidate(post: PostData) -> Candidate {
    Candidate {
        permalink: format!("{SHORTLINK_BASE}{}", post.id),
        title: post.title,
        raw_media_url: post.url.unwrap_or_default(),
    }
}

impl RedditClient {
    /// Creates a client pointed at the production Reddit endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`RedditError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(credentials: RedditCredentials, timeout_secs: u64) -> Result<Self, RedditError> {
        Self::with_base_urls(
            credentials,
            timeout_secs,
            DEFAULT_AUTH_BASE_URL,
            DEFAULT_API_BASE_URL,
        )
    }

    /// Creates a client with custom token and API base URLs (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`RedditError::Http`] if the HTTP client cannot be built, or
    /// [`RedditError::BaseUrl`] if either base URL does not parse.
    pub fn with_base_urls(
        credentials: RedditCredentials,
        timeout_secs: u64,
        auth_base: &str,
        api_base: &str,
    ) -> Result<Self, RedditError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(credentials.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            credentials,
            auth_base: parse_base(auth_base)?,
            api_base: parse_base(api_base)?,
        })
    }

    async fn fetch_token(&self) -> Result<String, RedditError> {
        let url = self
            .auth_base
            .join("api/v1/access_token")
            .map_err(|e| RedditError::BaseUrl {
                url: self.auth_base.to_string(),
                reason: e.to_string(),
            })?;

        let response = self
            .client
            .post(url)
            .basic_auth(
                &self.credentials.client_id,
                Some(&self.credentials.client_secret),
            )
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let body = Self::checked_body(response, "token exchange").await?;
        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| RedditError::Deserialize {
                context: "token exchange".to_string(),
                source: e,
            })?;
        Ok(token.access_token)
    }

    /// Builds `/r/{subreddit}/top` with the timeframe and limit query.
    pub(crate) fn top_listing_url(
        &self,
        subreddit: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Url, RedditError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| RedditError::BaseUrl {
                url: self.api_base.to_string(),
                reason: "cannot be a base".to_string(),
            })?
            .pop_if_empty()
            .extend(["r", subreddit, "top"]);
        url.query_pairs_mut()
            .append_pair("t", timeframe.as_str())
            .append_pair("limit", &limit.to_string())
            .append_pair("raw_json", "1");
        Ok(url)
    }

    /// Fetches the top posts of `subreddit`, in rank order.
    ///
    /// # Errors
    ///
    /// - [`RedditError::Status`] on a non-2xx response from either endpoint.
    /// - [`RedditError::Http`] on network failure.
    /// - [`RedditError::Deserialize`] if a body does not match the expected shape.
    pub async fn top_posts(
        &self,
        subreddit: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candidate>, RedditError> {
        let token = self.fetch_token().await?;
        let url = self.top_listing_url(subreddit, timeframe, limit)?;

        let response = self.client.get(url).bearer_auth(token).send().await?;
        let context = format!("top listing of r/{subreddit}");
        let body = Self::checked_body(response, &context).await?;
        let listing: Listing =
            serde_json::from_str(&body).map_err(|e| RedditError::Deserialize { context, source: e })?;

        let candidates: Vec<Candidate> = listing
            .data
            .children
            .into_iter()
            .map(|post| to_candidate(post.data))
            .collect();

        tracing::info!(
            subreddit,
            timeframe = %timeframe,
            count = candidates.len(),
            "fetched reddit listing"
        );
        Ok(candidates)
    }

    async fn checked_body(response: Response, context: &str) -> Result<String, RedditError> {
        let status = response.status();
        if !status.is_success() {
            return Err(RedditError::Status {
                context: context.to_string(),
                status: status.as_u16(),
                retry_after_secs: retry_after_secs(&response),
            });
        }
        Ok(response.text().await?)
    }
}

impl FeedSource for RedditClient {
    async fn fetch_top_candidates(
        &self,
        subreddit: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> Result<Vec<Candidate>, FeedError> {
        self.top_posts(subreddit, timeframe, limit)
            .await
            .map_err(FeedError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> RedditCredentials {
        RedditCredentials {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            user_agent: "relaybot-test/0.1".to_string(),
        }
    }

    #[test]
    fn top_listing_url_has_expected_query() {
        let client = RedditClient::with_base_urls(
            credentials(),
            30,
            "https://www.reddit.com",
            "https://oauth.reddit.com/",
        )
        .expect("client construction should not fail");

        let url = client.top_listing_url("aww", Timeframe::Day, 10).unwrap();

        assert_eq!(
            url.as_str(),
            "https://oauth.reddit.com/r/aww/top?t=day&limit=10&raw_json=1"
        );
    }

    #[test]
    fn subreddit_name_is_path_encoded() {
        let client = RedditClient::new(credentials(), 30).unwrap();
        let url = client
            .top_listing_url("a/b c", Timeframe::All, 5)
            .unwrap();
        assert!(url.path().starts_with("/r/a%2Fb%20c/top"), "{url}");
    }

    #[test]
    fn candidate_uses_shortlink_and_keeps_url() {
        let candidate = to_candidate(PostData {
            id: "abc123".to_string(),
            title: "A cat".to_string(),
            url: Some("https://i.imgur.com/x.jpg".to_string()),
        });

        assert_eq!(candidate.permalink, "https://redd.it/abc123");
        assert_eq!(candidate.title, "A cat");
        assert_eq!(candidate.raw_media_url, "https://i.imgur.com/x.jpg");
    }

    #[test]
    fn missing_url_becomes_empty() {
        let candidate = to_candidate(PostData {
            id: "q".to_string(),
            title: String::new(),
            url: None,
        });
        assert!(candidate.raw_media_url.is_empty());
    }
}
