//! Collaborator traits consumed by the publish pipeline.
//!
//! Implementations live in `relay-reddit`, `relay-twitter` and the CLI's HTTP
//! fetcher. None of them retry on failure; a failed run is retried as a whole
//! by the external scheduler.

use std::future::Future;

use crate::error::{FeedError, FetchError, PublishError};
use crate::types::{Candidate, MediaHandle, PostId, Timeframe};

/// Source of ranked candidates.
pub trait FeedSource {
    /// Fetches up to `limit` top posts of `subreddit` for `timeframe`, in rank order.
    fn fetch_top_candidates(
        &self,
        subreddit: &str,
        timeframe: Timeframe,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Candidate>, FeedError>> + Send;
}

/// Downloads raw media bytes.
pub trait ByteFetcher {
    /// Non-2xx responses surface as [`FetchError::Status`].
    fn fetch_bytes(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, FetchError>> + Send;
}

/// Destination platform.
pub trait Publisher {
    fn upload_media(
        &self,
        bytes: &[u8],
        content_type: &str,
    ) -> impl Future<Output = Result<MediaHandle, PublishError>> + Send;

    /// Creates a post; `media` is `None` for text-only posts.
    fn publish(
        &self,
        text: &str,
        media: Option<&MediaHandle>,
    ) -> impl Future<Output = Result<PostId, PublishError>> + Send;
}
