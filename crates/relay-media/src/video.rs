//! Video reduction through an external transcoder.
//!
//! The loop trims an over-long clip to its last `max_video_secs` once, then
//! only scales. Scaling stops with [`MediaError::SizeNotConvergent`] before
//! the smaller dimension would fall under the configured minimum.

use std::future::Future;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::blob::MediaBlob;
use crate::error::MediaError;
use crate::reducer::ReducerLimits;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoProbe {
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
}

/// Operations the reduction loop needs from a transcoder.
///
/// Outputs are written to a new path in the same container as the input.
pub trait VideoTranscoder {
    fn probe(&self, input: &Path) -> impl Future<Output = Result<VideoProbe, MediaError>> + Send;

    /// Writes the part of `input` from `start_secs` to the end.
    fn trim_to_tail(
        &self,
        input: &Path,
        output: &Path,
        start_secs: f64,
    ) -> impl Future<Output = Result<(), MediaError>> + Send;

    fn scale(
        &self,
        input: &Path,
        output: &Path,
        width: u32,
        height: u32,
    ) -> impl Future<Output = Result<(), MediaError>> + Send;
}

/// `ffmpeg`/`ffprobe` subprocess transcoder.
#[derive(Debug, Clone)]
pub struct FfmpegTranscoder {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg", "ffprobe")
    }
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
    format: ProbeFormat,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeFormat {
    duration: Option<String>,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg: impl Into<PathBuf>, ffprobe: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
            ffprobe: ffprobe.into(),
        }
    }

    async fn run_ffmpeg(&self, args: Vec<String>) -> Result<(), MediaError> {
        let output = tokio::process::Command::new(&self.ffmpeg)
            .args(["-y", "-v", "error"])
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MediaError::Transcode(format!("ffmpeg subprocess error: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MediaError::Transcode(format!(
                "ffmpeg exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

fn parse_probe(stdout: &[u8]) -> Result<VideoProbe, MediaError> {
    let parsed: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| MediaError::Transcode(format!("ffprobe output parse error: {e}")))?;

    let stream = parsed
        .streams
        .iter()
        .find(|s| s.width.is_some() && s.height.is_some())
        .ok_or_else(|| MediaError::Transcode("ffprobe found no video stream".to_string()))?;

    let duration_secs = parsed
        .format
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .ok_or_else(|| MediaError::Transcode("ffprobe reported no duration".to_string()))?;

    Ok(VideoProbe {
        duration_secs,
        width: stream.width.unwrap_or_default(),
        height: stream.height.unwrap_or_default(),
    })
}

impl VideoTranscoder for FfmpegTranscoder {
    async fn probe(&self, input: &Path) -> Result<VideoProbe, MediaError> {
        let output = tokio::process::Command::new(&self.ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-show_entries",
                "stream=width,height:format=duration",
                "-of",
                "json",
            ])
            .arg(input)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MediaError::Transcode(format!("ffprobe subprocess error: {e}")))?;

        if !output.status.success() {
            return Err(MediaError::Transcode(format!(
                "ffprobe exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_probe(&output.stdout)
    }

    async fn trim_to_tail(
        &self,
        input: &Path,
        output: &Path,
        start_secs: f64,
    ) -> Result<(), MediaError> {
        self.run_ffmpeg(trim_args(input, output, start_secs)).await
    }

    async fn scale(
        &self,
        input: &Path,
        output: &Path,
        width: u32,
        height: u32,
    ) -> Result<(), MediaError> {
        self.run_ffmpeg(scale_args(input, output, width, height)).await
    }
}

/// Input seek: `-ss` before `-i` so everything from `start_secs` on is kept.
fn trim_args(input: &Path, output: &Path, start_secs: f64) -> Vec<String> {
    vec![
        "-ss".to_string(),
        format!("{start_secs:.3}"),
        "-i".to_string(),
        input.display().to_string(),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-c:a".to_string(),
        "aac".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        output.display().to_string(),
    ]
}

fn scale_args(input: &Path, output: &Path, width: u32, height: u32) -> Vec<String> {
    vec![
        "-i".to_string(),
        input.display().to_string(),
        "-vf".to_string(),
        format!("scale={width}:{height}"),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-c:a".to_string(),
        "copy".to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        output.display().to_string(),
    ]
}

/// Scales both dimensions by `factor`, rounding down to even values as
/// required by H.264.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // factor is in (0, 1)
pub fn scaled_dimensions(width: u32, height: u32, factor: f64) -> (u32, u32) {
    let scale = |d: u32| {
        let scaled = (f64::from(d) * factor).floor() as u32;
        scaled - scaled % 2
    };
    (scale(width), scale(height))
}

async fn file_len(path: &Path) -> Result<u64, MediaError> {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.len())
        .map_err(|e| MediaError::io(path, e))
}

/// Shrinks a video until it is at most `limits.max_bytes`.
///
/// # Errors
///
/// - [`MediaError::SizeNotConvergent`] when the next scale step would go under
///   `limits.min_video_dimension`.
/// - [`MediaError::Transcode`] / [`MediaError::Io`] on transcoder or file failures.
pub async fn reduce_video<T: VideoTranscoder>(
    transcoder: &T,
    blob: MediaBlob,
    limits: &ReducerLimits,
    work_dir: &Path,
) -> Result<MediaBlob, MediaError> {
    let ceiling = limits.max_bytes;
    let extension = blob.extension.clone();
    let current = work_dir.join(format!("reduce-current{extension}"));
    let next = work_dir.join(format!("reduce-next{extension}"));

    tokio::fs::write(&current, &blob.bytes)
        .await
        .map_err(|e| MediaError::io(&current, e))?;
    let mut size = blob.len();
    drop(blob);

    let mut trimmed = false;
    while size > ceiling {
        let probe = transcoder.probe(&current).await?;

        if !trimmed && probe.duration_secs > limits.max_video_secs {
            let start_secs = probe.duration_secs - limits.max_video_secs;
            tracing::debug!(
                duration_secs = probe.duration_secs,
                start_secs,
                "trimming video to its tail"
            );
            transcoder.trim_to_tail(&current, &next, start_secs).await?;
            trimmed = true;
        } else {
            let (width, height) =
                scaled_dimensions(probe.width, probe.height, limits.video_scale);
            if width.min(height) < limits.min_video_dimension {
                return Err(MediaError::SizeNotConvergent {
                    ceiling,
                    size,
                    reason: format!(
                        "scaling {}x{} would drop below {} px",
                        probe.width, probe.height, limits.min_video_dimension
                    ),
                });
            }
            tracing::debug!(
                from = %format!("{}x{}", probe.width, probe.height),
                to = %format!("{width}x{height}"),
                "downscaling video"
            );
            transcoder.scale(&current, &next, width, height).await?;
        }

        tokio::fs::rename(&next, &current)
            .await
            .map_err(|e| MediaError::io(&next, e))?;
        size = file_len(&current).await?;
    }

    let bytes = tokio::fs::read(&current)
        .await
        .map_err(|e| MediaError::io(&current, e))?;
    if let Err(e) = tokio::fs::remove_file(&current).await {
        tracing::warn!(path = %current.display(), error = %e, "failed to remove scratch video");
    }

    Ok(MediaBlob { bytes, extension })
}

#[cfg(test)]
#[path = "video_test.rs"]
mod tests;
