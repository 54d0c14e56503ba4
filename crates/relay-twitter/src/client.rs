//! HTTP client for media upload and post creation.

use std::time::Duration;

use relay_core::{MediaHandle, PostId, PublishError, Publisher, TwitterCredentials};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Url};

use crate::error::{classify_rejection, TwitterError};
use crate::oauth::OAuthSigner;
use crate::types::{CreateTweet, CreateTweetResponse, ErrorBody, MediaResponse, TweetMedia};

const DEFAULT_UPLOAD_BASE_URL: &str = "https://upload.twitter.com/";
const DEFAULT_API_BASE_URL: &str = "https://api.twitter.com/";

/// Largest `APPEND` segment.
pub const CHUNK_SIZE: usize = 1024 * 1024;
const MAX_STATUS_POLLS: u32 = 60;
const DEFAULT_CHECK_AFTER_SECS: u64 = 1;

/// Client for the Twitter media upload and v2 post endpoints.
///
/// Use [`TwitterClient::new`] for production or [`TwitterClient::with_base_urls`]
/// to point at a mock server in tests.
pub struct TwitterClient {
    client: Client,
    signer: OAuthSigner,
    upload_url: Url,
    tweets_url: Url,
}

fn endpoint(base: &str, path: &str) -> Result<Url, TwitterError> {
    let normalised = format!("{}/", base.trim_end_matches('/'));
    Url::parse(&normalised)
        .and_then(|url| url.join(path))
        .map_err(|e| TwitterError::BaseUrl {
            url: base.to_string(),
            reason: e.to_string(),
        })
}

/// `media_category` for a MIME type.
fn media_category(content_type: &str) -> &'static str {
    if content_type.starts_with("video/") {
        "tweet_video"
    } else if content_type == "image/gif" {
        "tweet_gif"
    } else {
        "tweet_image"
    }
}

impl TwitterClient {
    /// Creates a client pointed at the production endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`TwitterError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(credentials: TwitterCredentials, timeout_secs: u64) -> Result<Self, TwitterError> {
        Self::with_base_urls(
            credentials,
            timeout_secs,
            DEFAULT_UPLOAD_BASE_URL,
            DEFAULT_API_BASE_URL,
        )
    }

    /// Creates a client with custom upload and API base URLs (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`TwitterError::Http`] if the HTTP client cannot be built, or
    /// [`TwitterError::BaseUrl`] if either base URL does not parse.
    pub fn with_base_urls(
        credentials: TwitterCredentials,
        timeout_secs: u64,
        upload_base: &str,
        api_base: &str,
    ) -> Result<Self, TwitterError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(concat!("relaybot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            signer: OAuthSigner::new(credentials),
            upload_url: endpoint(upload_base, "1.1/media/upload.json")?,
            tweets_url: endpoint(api_base, "2/tweets")?,
        })
    }

    /// Uploads `bytes` with the chunked protocol and waits for server-side
    /// processing to finish.
    ///
    /// # Errors
    ///
    /// - [`TwitterError::Api`] when a step is refused or processing fails.
    /// - [`TwitterError::ProcessingTimeout`] when processing never settles.
    /// - [`TwitterError::Http`] / [`TwitterError::Deserialize`] on transport or
    ///   parse failures.
    pub async fn upload(&self, bytes: &[u8], content_type: &str) -> Result<String, TwitterError> {
        let media_id = self.upload_init(bytes.len(), content_type).await?;

        for (segment_index, chunk) in bytes.chunks(CHUNK_SIZE).enumerate() {
            self.upload_append(&media_id, segment_index, chunk).await?;
        }

        let finalized = self.upload_finalize(&media_id).await?;
        if finalized.processing_info.is_some() {
            self.await_processing(finalized).await?;
        }

        tracing::info!(
            media_id = %media_id,
            bytes = bytes.len(),
            content_type,
            "uploaded media"
        );
        Ok(media_id)
    }

    async fn upload_init(
        &self,
        total_bytes: usize,
        content_type: &str,
    ) -> Result<String, TwitterError> {
        let params = [
            ("command", "INIT".to_string()),
            ("total_bytes", total_bytes.to_string()),
            ("media_type", content_type.to_string()),
            ("media_category", media_category(content_type).to_string()),
        ];
        let request = self.signed_post(&self.upload_url, &params)?.form(&params);
        let body = self.send_checked(request, "media INIT").await?;
        let response: MediaResponse = parse(&body, "media INIT")?;
        Ok(response.media_id_string)
    }

    async fn upload_append(
        &self,
        media_id: &str,
        segment_index: usize,
        chunk: &[u8],
    ) -> Result<(), TwitterError> {
        let form = Form::new()
            .text("command", "APPEND")
            .text("media_id", media_id.to_string())
            .text("segment_index", segment_index.to_string())
            .part("media", Part::bytes(chunk.to_vec()).file_name("media"));

        let no_params: [(&str, &str); 0] = [];
        let request = self.signed_post(&self.upload_url, &no_params)?.multipart(form);
        self.send_checked(request, "media APPEND").await?;

        tracing::debug!(media_id, segment_index, len = chunk.len(), "appended segment");
        Ok(())
    }

    async fn upload_finalize(&self, media_id: &str) -> Result<MediaResponse, TwitterError> {
        let params = [
            ("command", "FINALIZE".to_string()),
            ("media_id", media_id.to_string()),
        ];
        let request = self.signed_post(&self.upload_url, &params)?.form(&params);
        let body = self.send_checked(request, "media FINALIZE").await?;
        parse(&body, "media FINALIZE")
    }

    async fn await_processing(&self, mut current: MediaResponse) -> Result<(), TwitterError> {
        let media_id = current.media_id_string.clone();

        for _ in 0..MAX_STATUS_POLLS {
            let Some(info) = current.processing_info else {
                return Ok(());
            };
            match info.state.as_str() {
                "succeeded" => return Ok(()),
                "failed" => {
                    let (code, message) = info.error.map_or((None, String::new()), |e| {
                        let text = [e.name, e.message]
                            .into_iter()
                            .flatten()
                            .collect::<Vec<_>>()
                            .join(": ");
                        (e.code, text)
                    });
                    return Err(TwitterError::Api {
                        context: "media processing".to_string(),
                        status: 200,
                        kind: classify_rejection(200, code, &message),
                        message,
                    });
                }
                state => {
                    let wait = info.check_after_secs.unwrap_or(DEFAULT_CHECK_AFTER_SECS);
                    tracing::debug!(media_id = %media_id, state, wait, "media still processing");
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                }
            }
            current = self.upload_status(&media_id).await?;
        }

        Err(TwitterError::ProcessingTimeout {
            media_id,
            polls: MAX_STATUS_POLLS,
        })
    }

    async fn upload_status(&self, media_id: &str) -> Result<MediaResponse, TwitterError> {
        let params = [("command", "STATUS"), ("media_id", media_id)];
        let header = self
            .signer
            .authorization_header("GET", self.upload_url.as_str(), &params)?;
        let request = self
            .client
            .get(self.upload_url.clone())
            .query(&params)
            .header(reqwest::header::AUTHORIZATION, header);
        let body = self.send_checked(request, "media STATUS").await?;
        parse(&body, "media STATUS")
    }

    /// Creates a post, attaching `media_id` when given.
    ///
    /// # Errors
    ///
    /// - [`TwitterError::Api`] when the post is refused.
    /// - [`TwitterError::Http`] / [`TwitterError::Deserialize`] on transport or
    ///   parse failures.
    pub async fn create_post(
        &self,
        text: &str,
        media_id: Option<&str>,
    ) -> Result<String, TwitterError> {
        let payload = CreateTweet {
            text,
            media: media_id.map(|id| TweetMedia {
                media_ids: vec![id],
            }),
        };
        let no_params: [(&str, &str); 0] = [];
        let request = self.signed_post(&self.tweets_url, &no_params)?.json(&payload);
        let body = self.send_checked(request, "post creation").await?;
        let created: CreateTweetResponse = parse(&body, "post creation")?;

        tracing::info!(post_id = %created.data.id, with_media = media_id.is_some(), "created post");
        Ok(created.data.id)
    }

    fn signed_post<K, V>(&self, url: &Url, params: &[(K, V)]) -> Result<RequestBuilder, TwitterError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let header = self
            .signer
            .authorization_header("POST", url.as_str(), params)?;
        Ok(self
            .client
            .post(url.clone())
            .header(reqwest::header::AUTHORIZATION, header))
    }

    /// Sends the request and returns the body of a 2xx response.
    async fn send_checked(
        &self,
        request: RequestBuilder,
        context: &str,
    ) -> Result<String, TwitterError> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return Ok(body);
        }

        let (code, message) = ErrorBody::summarize(&body);
        let kind = classify_rejection(status.as_u16(), code, &message);
        tracing::warn!(context, status = status.as_u16(), %kind, message = %message, "twitter rejected request");
        Err(TwitterError::Api {
            context: context.to_string(),
            status: status.as_u16(),
            kind,
            message,
        })
    }
}

fn parse<T: serde::de::DeserializeOwned>(body: &str, context: &str) -> Result<T, TwitterError> {
    serde_json::from_str(body).map_err(|e| TwitterError::Deserialize {
        context: context.to_string(),
        source: e,
    })
}

impl Publisher for TwitterClient {
    async fn upload_media(
        &self,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<MediaHandle, PublishError> {
        self.upload(bytes, content_type)
            .await
            .map(MediaHandle)
            .map_err(PublishError::from)
    }

    async fn publish(
        &self,
        text: &str,
        media: Option<&MediaHandle>,
    ) -> Result<PostId, PublishError> {
        self.create_post(text, media.map(|m| m.0.as_str()))
            .await
            .map(PostId)
            .map_err(PublishError::from)
    }
}
