//! Core types and algorithms for relaybot.
//!
//! Holds the account configuration loader, media URL normalization, candidate
//! selection, and message composition. Network-facing collaborators are
//! described by the traits in [`ports`] and implemented in sibling crates.

pub mod config;
pub mod error;
pub mod media_url;
pub mod message;
pub mod ports;
pub mod select;
pub mod types;

pub use config::{load_account_config, parse_account_config, AccountConfig};
pub use error::{
    ConfigError, FeedError, FetchError, NoMediaFound, NotMedia, NotMediaReason, PublishError,
    RejectionKind,
};
pub use media_url::{normalize_media_url, MediaUrlResolver};
pub use message::MessageComposer;
pub use ports::{ByteFetcher, FeedSource, Publisher};
pub use select::select_candidate;
pub use types::{
    Candidate, MediaHandle, PostId, RedditCredentials, ResolvedMedia, SelectedCandidate,
    Timeframe, TwitterCredentials,
};
