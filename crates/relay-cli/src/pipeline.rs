//! One publish run: select, fetch, reduce, compose, upload, post.
//!
//! Each run gets its own scratch directory under the configured `work_dir`.
//! The directory is a [`TempDir`], so it is removed when the run returns,
//! fails, or is dropped by the caller's timeout.

use std::path::{Path, PathBuf};

use relay_core::{
    select_candidate, AccountConfig, ByteFetcher, ConfigError, FeedError, FeedSource, FetchError,
    MediaUrlResolver, MessageComposer, NoMediaFound, PostId, PublishError, Publisher, Timeframe,
};
use relay_media::{MediaBlob, MediaError, MediaKind, MediaSizeReducer, ReducerLimits, VideoTranscoder};
use tempfile::TempDir;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Prepare,
    Feed,
    Select,
    Fetch,
    Reduce,
    Upload,
    Publish,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Prepare => "prepare",
            Stage::Feed => "feed",
            Stage::Select => "select",
            Stage::Fetch => "fetch",
            Stage::Reduce => "reduce",
            Stage::Upload => "upload",
            Stage::Publish => "publish",
        };
        f.write_str(name)
    }
}

/// Underlying cause of a failed run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("could not create scratch directory: {0}")]
    Workspace(#[source] std::io::Error),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error(transparent)]
    NoMedia(#[from] NoMediaFound),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Publish(#[from] PublishError),
}

/// A failed run, tagged with the stage that failed.
///
/// `message` is set once composition has happened, so the operator can see
/// what would have been posted.
#[derive(Debug, Error)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    pub message: Option<String>,
    #[source]
    pub source: RunError,
}

impl PipelineError {
    fn at(stage: Stage, source: impl Into<RunError>) -> Self {
        Self {
            stage,
            message: None,
            source: source.into(),
        }
    }

    fn with_message(mut self, message: &str) -> Self {
        self.message = Some(message.to_string());
        self
    }
}

/// Outcome of a successful run. `post_id` is `None` for dry runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostResult {
    pub post_id: Option<PostId>,
    pub message: String,
    pub media_bytes: u64,
}

/// Orchestrates a run over the feed, fetcher and publisher ports.
pub struct PublishPipeline<F, B, P, T> {
    feed: F,
    fetcher: B,
    publisher: P,
    reducer: MediaSizeReducer<T>,
    resolver: MediaUrlResolver,
    composer: MessageComposer,
    subreddit: String,
    timeframe: Timeframe,
    candidate_limit: usize,
    hashtags: Vec<String>,
    error_message: String,
    work_dir: PathBuf,
    fallback_on_error: bool,
    dry_run: bool,
}

impl<F, B, P, T> PublishPipeline<F, B, P, T>
where
    F: FeedSource + Sync,
    B: ByteFetcher + Sync,
    P: Publisher + Sync,
    T: VideoTranscoder + Sync,
{
    /// # Errors
    ///
    /// Returns [`ConfigError::MessageCeiling`] if the configured message
    /// ceiling cannot hold a link.
    pub fn new(
        config: &AccountConfig,
        feed: F,
        fetcher: B,
        publisher: P,
        transcoder: T,
    ) -> Result<Self, ConfigError> {
        #[allow(clippy::cast_precision_loss)] // seconds, far below 2^52
        let max_video_secs = config.max_video_secs as f64;
        let limits = ReducerLimits {
            max_bytes: config.max_media_bytes,
            max_video_secs,
            ..ReducerLimits::default()
        };

        Ok(Self {
            feed,
            fetcher,
            publisher,
            reducer: MediaSizeReducer::new(limits, transcoder),
            resolver: config.media_resolver(),
            composer: config.message_composer()?,
            subreddit: config.subreddit.clone(),
            timeframe: config.update_rate,
            candidate_limit: config.candidate_limit,
            hashtags: config.hashtags.clone(),
            error_message: config.error_message.clone(),
            work_dir: config.work_dir.clone(),
            fallback_on_error: config.fallback_on_error,
            dry_run: false,
        })
    }

    /// Stop after composition: nothing is uploaded or posted.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Runs once. Failures are logged here with their stage before being
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError`] naming the failed [`Stage`].
    pub async fn run(&self) -> Result<PostResult, PipelineError> {
        let result = match tempfile::Builder::new()
            .prefix("relaybot-")
            .tempdir_in(&self.work_dir)
        {
            Ok(scratch) => self.run_in(&scratch).await,
            Err(e) => Err(PipelineError::at(Stage::Prepare, RunError::Workspace(e))),
        };

        if let Err(err) = &result {
            tracing::error!(
                stage = %err.stage,
                composed = err.message.as_deref().unwrap_or(""),
                error = %err.source,
                "run failed"
            );
        }
        result
    }

    async fn run_in(&self, scratch: &TempDir) -> Result<PostResult, PipelineError> {
        let candidates = self
            .feed
            .fetch_top_candidates(&self.subreddit, self.timeframe, self.candidate_limit)
            .await
            .map_err(|e| PipelineError::at(Stage::Feed, e))?;

        let selected = select_candidate(candidates, self.candidate_limit, &self.resolver)
            .map_err(|e| PipelineError::at(Stage::Select, e))?;
        tracing::info!(
            title = %selected.candidate.title,
            url = %selected.media.canonical_url,
            "selected candidate"
        );

        let bytes = self
            .fetcher
            .fetch_bytes(&selected.media.canonical_url)
            .await
            .map_err(|e| PipelineError::at(Stage::Fetch, e))?;

        let blob = MediaBlob::new(bytes, selected.media.extension.clone());
        let kind = MediaKind::detect(&blob);
        let blob = self.reduce(blob, kind, scratch.path()).await?;

        let message = self.composer.compose(
            &selected.candidate.title,
            &selected.candidate.permalink,
            &self.hashtags,
        );
        tracing::info!(text = %message, %kind, bytes = blob.len(), "composed post");

        if self.dry_run {
            tracing::info!("dry run: skipping upload and publish");
            return Ok(PostResult {
                post_id: None,
                media_bytes: blob.len(),
                message,
            });
        }

        let handle = match self
            .publisher
            .upload_media(&blob.bytes, blob.content_type())
            .await
        {
            Ok(handle) => handle,
            Err(e) => {
                self.fallback().await;
                return Err(PipelineError::at(Stage::Upload, e).with_message(&message));
            }
        };

        let post_id = match self.publisher.publish(&message, Some(&handle)).await {
            Ok(id) => id,
            Err(e) => {
                self.fallback().await;
                return Err(PipelineError::at(Stage::Publish, e).with_message(&message));
            }
        };

        tracing::info!(post_id = %post_id, "published");
        Ok(PostResult {
            post_id: Some(post_id),
            media_bytes: blob.len(),
            message,
        })
    }

    async fn reduce(
        &self,
        blob: MediaBlob,
        kind: MediaKind,
        scratch: &Path,
    ) -> Result<MediaBlob, PipelineError> {
        self.reducer
            .reduce(blob, kind, scratch)
            .await
            .map_err(|e| PipelineError::at(Stage::Reduce, e))
    }

    /// Posts the operator's error message as text, when enabled.
    async fn fallback(&self) {
        if !self.fallback_on_error {
            return;
        }
        match self.publisher.publish(&self.error_message, None).await {
            Ok(id) => tracing::warn!(post_id = %id, "published fallback error message"),
            Err(e) => tracing::error!(error = %e, "fallback error message failed"),
        }
    }
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
