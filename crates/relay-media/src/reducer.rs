use std::path::Path;

use crate::blob::{MediaBlob, MediaKind};
use crate::error::MediaError;
use crate::picture::reduce_image;
use crate::video::{reduce_video, FfmpegTranscoder, VideoTranscoder};

pub const DEFAULT_MIN_VIDEO_DIMENSION: u32 = 32;
pub const DEFAULT_VIDEO_SCALE: f64 = 0.7;

/// Bounds for the reduction loops.
#[derive(Debug, Clone, PartialEq)]
pub struct ReducerLimits {
    /// Upload ceiling in bytes; output is at most this size.
    pub max_bytes: u64,
    /// Over-long videos keep only their last `max_video_secs`.
    pub max_video_secs: f64,
    pub min_video_dimension: u32,
    pub video_scale: f64,
}

impl Default for ReducerLimits {
    fn default() -> Self {
        Self {
            max_bytes: 3_072_000,
            max_video_secs: 30.0,
            min_video_dimension: DEFAULT_MIN_VIDEO_DIMENSION,
            video_scale: DEFAULT_VIDEO_SCALE,
        }
    }
}

/// Brings media under the upload ceiling, dispatching on [`MediaKind`].
#[derive(Debug, Clone)]
pub struct MediaSizeReducer<T = FfmpegTranscoder> {
    limits: ReducerLimits,
    transcoder: T,
}

impl<T: VideoTranscoder + Sync> MediaSizeReducer<T> {
    pub fn new(limits: ReducerLimits, transcoder: T) -> Self {
        Self { limits, transcoder }
    }

    #[must_use]
    pub fn limits(&self) -> &ReducerLimits {
        &self.limits
    }

    /// Returns `blob` unchanged when it already fits, otherwise a reduced copy.
    ///
    /// Image decoding and resizing run on the blocking pool. Video
    /// intermediates are written under `work_dir`, which the caller owns
    /// and cleans up.
    ///
    /// # Errors
    ///
    /// Returns [`MediaError`] if the media cannot be brought under the ceiling.
    pub async fn reduce(
        &self,
        blob: MediaBlob,
        kind: MediaKind,
        work_dir: &Path,
    ) -> Result<MediaBlob, MediaError> {
        let ceiling = self.limits.max_bytes;
        if blob.len() <= ceiling {
            return Ok(blob);
        }

        let before = blob.len();
        let reduced = match kind {
            MediaKind::Image => {
                tokio::task::spawn_blocking(move || reduce_image(blob, ceiling)).await??
            }
            MediaKind::Video => {
                reduce_video(&self.transcoder, blob, &self.limits, work_dir).await?
            }
        };

        tracing::info!(
            %kind,
            before,
            after = reduced.len(),
            ceiling,
            "reduced media under upload ceiling"
        );
        Ok(reduced)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, RgbImage};
    use tempfile::TempDir;

    use super::*;
    use crate::video::VideoProbe;

    /// Fails every call; used where the video path must not be taken.
    struct UnusedTranscoder;

    impl VideoTranscoder for UnusedTranscoder {
        async fn probe(&self, _input: &Path) -> Result<VideoProbe, MediaError> {
            Err(MediaError::Transcode("unexpected probe".to_string()))
        }

        async fn trim_to_tail(&self, _: &Path, _: &Path, _: f64) -> Result<(), MediaError> {
            Err(MediaError::Transcode("unexpected trim".to_string()))
        }

        async fn scale(&self, _: &Path, _: &Path, _: u32, _: u32) -> Result<(), MediaError> {
            Err(MediaError::Transcode("unexpected scale".to_string()))
        }
    }

    fn noisy_png(size: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(size, size, |x, y| {
            let v = (x.wrapping_mul(0x9E37_79B1) ^ y.wrapping_mul(0x85EB_CA77))
                .wrapping_mul(0x2C1B_3C6D);
            let [r, g, b, _] = (v ^ (v >> 13)).to_le_bytes();
            image::Rgb([r, g, b])
        });
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    fn reducer(max_bytes: u64) -> MediaSizeReducer<UnusedTranscoder> {
        MediaSizeReducer::new(
            ReducerLimits {
                max_bytes,
                ..ReducerLimits::default()
            },
            UnusedTranscoder,
        )
    }

    #[test]
    fn default_limits() {
        let limits = ReducerLimits::default();
        assert_eq!(limits.max_bytes, 3_072_000);
        assert!((limits.max_video_secs - 30.0).abs() < f64::EPSILON);
        assert_eq!(limits.min_video_dimension, 32);
    }

    #[tokio::test]
    async fn small_blob_passes_through_either_kind() {
        let dir = TempDir::new().unwrap();
        let blob = MediaBlob::new(vec![1, 2, 3], ".mp4");

        let out = reducer(10)
            .reduce(blob.clone(), MediaKind::Video, dir.path())
            .await
            .unwrap();

        assert_eq!(out, blob);
    }

    #[tokio::test]
    async fn image_kind_uses_image_path() {
        let dir = TempDir::new().unwrap();
        let blob = MediaBlob::new(noisy_png(256), ".png");
        let ceiling = blob.len() / 2;

        let out = reducer(ceiling)
            .reduce(blob, MediaKind::Image, dir.path())
            .await
            .unwrap();

        assert!(out.len() <= ceiling);
        assert_eq!(out.extension, ".jpg");
    }

    #[tokio::test]
    async fn video_kind_uses_transcoder() {
        let dir = TempDir::new().unwrap();
        let blob = MediaBlob::new(vec![0; 64], ".mp4");

        let err = reducer(10)
            .reduce(blob, MediaKind::Video, dir.path())
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::Transcode(ref m) if m.contains("probe")));
    }
}
