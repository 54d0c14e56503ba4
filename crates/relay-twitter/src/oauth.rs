//! OAuth 1.0a request signing (HMAC-SHA1).
//!
//! Only parameters that travel in the query string or in an
//! `application/x-www-form-urlencoded` body take part in the signature.
//! Multipart and JSON bodies are signed with the `oauth_*` parameters alone.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use relay_core::TwitterCredentials;
use sha1::Sha1;

use crate::error::TwitterError;

type HmacSha1 = Hmac<Sha1>;

/// RFC 3986 unreserved characters stay literal; everything else is escaped.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

fn encode(s: &str) -> String {
    utf8_percent_encode(s, OAUTH_ENCODE_SET).to_string()
}

fn new_nonce() -> String {
    rand::random::<[u8; 16]>()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[derive(Debug, Clone)]
pub struct OAuthSigner {
    credentials: TwitterCredentials,
}

impl OAuthSigner {
    pub fn new(credentials: TwitterCredentials) -> Self {
        Self { credentials }
    }

    /// Builds the `Authorization` header for a request, with a fresh nonce and
    /// the current timestamp.
    ///
    /// `base_url` must not carry a query string; query and form parameters go
    /// in `params`.
    ///
    /// # Errors
    ///
    /// Returns [`TwitterError::Signing`] if the HMAC cannot be keyed.
    pub fn authorization_header<K, V>(
        &self,
        method: &str,
        base_url: &str,
        params: &[(K, V)],
    ) -> Result<String, TwitterError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorization_header_with(method, base_url, params, &new_nonce(), &timestamp)
    }

    pub(crate) fn authorization_header_with<K, V>(
        &self,
        method: &str,
        base_url: &str,
        params: &[(K, V)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String, TwitterError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let oauth_params = [
            ("oauth_consumer_key", self.credentials.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp),
            ("oauth_token", self.credentials.access_token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let mut encoded: Vec<(String, String)> = oauth_params
            .iter()
            .map(|(k, v)| (encode(k), encode(v)))
            .chain(
                params
                    .iter()
                    .map(|(k, v)| (encode(k.as_ref()), encode(v.as_ref()))),
            )
            .collect();
        encoded.sort();

        let parameter_string = encoded
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");
        let base_string = format!(
            "{}&{}&{}",
            method.to_ascii_uppercase(),
            encode(base_url),
            encode(&parameter_string)
        );
        let signing_key = format!(
            "{}&{}",
            encode(&self.credentials.consumer_secret),
            encode(&self.credentials.access_token_secret)
        );

        let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
            .map_err(|e| TwitterError::Signing(e.to_string()))?;
        mac.update(base_string.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        let header = oauth_params
            .iter()
            .map(|(k, v)| (*k, *v))
            .chain(std::iter::once(("oauth_signature", signature.as_str())))
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(", ");
        Ok(format!("OAuth {header}"))
    }
}
