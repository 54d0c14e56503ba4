//! Reddit listing client for relaybot.
//!
//! Exchanges application credentials for an app-only OAuth token and reads a
//! subreddit's top listing, turning each post into a [`relay_core::Candidate`].

pub mod client;
pub mod error;
pub(crate) mod types;

pub use client::RedditClient;
pub use error::RedditError;
