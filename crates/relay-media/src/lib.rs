//! Media conditioning for relaybot.
//!
//! Shrinks downloaded images and videos until they fit under the destination
//! platform's upload ceiling. Images are halved and re-encoded in memory;
//! videos are trimmed and scaled through an external transcoder, with
//! intermediate files kept in a caller-owned scratch directory.

pub mod blob;
pub mod error;
pub mod picture;
pub mod reducer;
pub mod video;

pub use blob::{MediaBlob, MediaKind};
pub use error::MediaError;
pub use reducer::{MediaSizeReducer, ReducerLimits};
pub use video::{FfmpegTranscoder, VideoProbe, VideoTranscoder};
