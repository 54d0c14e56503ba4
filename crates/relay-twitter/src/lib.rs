//! Twitter/X publishing client for relaybot.
//!
//! Signs requests with OAuth 1.0a user credentials, uploads media through the
//! chunked `media/upload` protocol, and creates posts through the v2 API.

pub mod client;
pub mod error;
pub mod oauth;
pub(crate) mod types;

pub use client::TwitterClient;
pub use error::TwitterError;
pub use oauth::OAuthSigner;
