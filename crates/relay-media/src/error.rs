use thiserror::Error;

#[derive(Debug, Error)]
pub enum MediaError {
    #[error("media could not be reduced to {ceiling} bytes (stuck at {size} bytes): {reason}")]
    SizeNotConvergent {
        ceiling: u64,
        size: u64,
        reason: String,
    },

    #[error("image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("transcoder error: {0}")]
    Transcode(String),

    #[error("image worker task failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

impl MediaError {
    pub(crate) fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        MediaError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}
