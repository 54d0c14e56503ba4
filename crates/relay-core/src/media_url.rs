//! Media URL normalization.
//!
//! Turns a raw post URL into a canonical, directly fetchable media address.
//! Pure string handling; nothing here touches the network.

use crate::error::{NotMedia, NotMediaReason};
use crate::types::ResolvedMedia;

/// Extensions accepted as direct media after normalization.
const MEDIA_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".webp", ".mp4", ".mov"];

/// Default hosts whose links are considered media-bearing.
pub const DEFAULT_MEDIA_HOSTS: &[&str] = &["imgur.com", "redd.it", "reddituploads.com"];

/// Normalizes `raw_url` to a canonical direct-media URL.
///
/// Query strings and fragments are dropped, the extension is lowercased, and
/// `.gifv` (an HTML wrapper) is rewritten to the co-hosted `.mp4`. A final path
/// segment without an extension is rejected rather than guessed.
///
/// # Errors
///
/// Returns [`NotMedia`] when the URL has no path, no extension, or an
/// extension outside the supported media set.
pub fn normalize_media_url(raw_url: &str) -> Result<ResolvedMedia, NotMedia> {
    let not_media = |reason| NotMedia {
        url: raw_url.to_string(),
        reason,
    };

    let trimmed = strip_query(raw_url.trim());
    let authority_start = trimmed.find("://").map_or(0, |i| i + 3);
    if !trimmed[authority_start..].contains('/') {
        return Err(not_media(NotMediaReason::NoPath));
    }

    // `rfind` cannot land inside the authority since a path slash exists.
    let last_slash = trimmed.rfind('/').unwrap_or(authority_start);
    let (domain, segment) = trimmed.split_at(last_slash);

    let Some(dot) = segment.rfind('.') else {
        return Err(not_media(NotMediaReason::NoExtension));
    };
    let (stem, extension) = segment.split_at(dot);
    if stem == "/" {
        return Err(not_media(NotMediaReason::NoExtension));
    }

    let mut extension = extension.to_ascii_lowercase();
    if extension == ".gifv" {
        extension = ".mp4".to_string();
    }
    if !MEDIA_EXTENSIONS.contains(&extension.as_str()) {
        return Err(not_media(NotMediaReason::UnsupportedExtension(extension)));
    }

    Ok(ResolvedMedia {
        canonical_url: format!("{domain}{stem}{extension}"),
        extension,
    })
}

/// Returns the lowercase host of `url`, without userinfo or port.
#[must_use]
pub fn host_of(url: &str) -> Option<String> {
    let without_scheme = url.split_once("://").map_or(url, |(_, rest)| rest);
    let authority = without_scheme
        .split(['/', '?', '#'])
        .next()
        .filter(|a| !a.is_empty())?;
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, h)| h);
    let host = host_port.split(':').next().unwrap_or(host_port);
    (!host.is_empty()).then(|| host.to_ascii_lowercase())
}

fn strip_query(url: &str) -> &str {
    url.find(['?', '#']).map_or(url, |i| &url[..i])
}

/// Resolves candidate URLs against an accepted-host policy.
///
/// A URL is media when its host is one of `accepted_hosts` (or a subdomain of
/// one) and [`normalize_media_url`] accepts it. An empty host list accepts any
/// host.
#[derive(Debug, Clone)]
pub struct MediaUrlResolver {
    accepted_hosts: Vec<String>,
}

impl Default for MediaUrlResolver {
    fn default() -> Self {
        Self::new(DEFAULT_MEDIA_HOSTS.iter().map(ToString::to_string))
    }
}

impl MediaUrlResolver {
    pub fn new<I, S>(accepted_hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            accepted_hosts: accepted_hosts
                .into_iter()
                .map(|h| {
                    let h: String = h.into();
                    h.trim().trim_start_matches('.').to_ascii_lowercase()
                })
                .filter(|h| !h.is_empty())
                .collect(),
        }
    }

    /// # Errors
    ///
    /// Returns [`NotMedia`] if the host is not accepted or the URL does not
    /// normalize to a supported media extension.
    pub fn resolve(&self, raw_url: &str) -> Result<ResolvedMedia, NotMedia> {
        if !self.accepted_hosts.is_empty() {
            let host = host_of(raw_url).unwrap_or_default();
            let accepted = self
                .accepted_hosts
                .iter()
                .any(|h| host == *h || host.ends_with(&format!(".{h}")));
            if !accepted {
                return Err(NotMedia {
                    url: raw_url.to_string(),
                    reason: NotMediaReason::HostNotAccepted(host),
                });
            }
        }
        normalize_media_url(raw_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_direct_jpg() {
        let media = normalize_media_url("https://i.imgur.com/6u8CtM9.jpg").unwrap();
        assert_eq!(media.canonical_url, "https://i.imgur.com/6u8CtM9.jpg");
        assert_eq!(media.extension, ".jpg");
    }

    #[test]
    fn keeps_gif_extension() {
        let media = normalize_media_url("https://i.imgur.com/6u8CtM9.gif").unwrap();
        assert_eq!(media.canonical_url, "https://i.imgur.com/6u8CtM9.gif");
        assert_eq!(media.extension, ".gif");
    }

    #[test]
    fn rewrites_gifv_to_mp4() {
        let media = normalize_media_url("https://i.imgur.com/QTCeiNM.gifv").unwrap();
        assert_eq!(media.canonical_url, "https://i.imgur.com/QTCeiNM.mp4");
        assert_eq!(media.extension, ".mp4");
    }

    #[test]
    fn lowercases_extension() {
        let media = normalize_media_url("https://i.redd.it/AbCd.JPEG").unwrap();
        assert_eq!(media.canonical_url, "https://i.redd.it/AbCd.jpeg");
        assert_eq!(media.extension, ".jpeg");
    }

    #[test]
    fn strips_query_and_fragment() {
        let media = normalize_media_url("https://i.redd.it/abc.png?width=640&s=deadbeef#top")
            .unwrap();
        assert_eq!(media.canonical_url, "https://i.redd.it/abc.png");
    }

    #[test]
    fn extensionless_url_is_not_media() {
        let err = normalize_media_url(
            "https://i.reddituploads.com/f560a6cffcf548b78bf19a0939dedb7d?fit=max&h=1536&w=1536",
        )
        .unwrap_err();
        assert_eq!(err.reason, NotMediaReason::NoExtension);
    }

    #[test]
    fn short_extensionless_url_is_not_media() {
        let err = normalize_media_url("https://i.reddituploads.com/abcd?x=1").unwrap_err();
        assert_eq!(err.reason, NotMediaReason::NoExtension);
    }

    #[test]
    fn bare_host_is_not_media() {
        let err = normalize_media_url("https://imgur.com").unwrap_err();
        assert_eq!(err.reason, NotMediaReason::NoPath);
    }

    #[test]
    fn html_page_is_not_media() {
        let err = normalize_media_url("https://imgur.com/gallery/abc.html").unwrap_err();
        assert_eq!(
            err.reason,
            NotMediaReason::UnsupportedExtension(".html".to_string())
        );
    }

    #[test]
    fn dot_only_in_domain_is_not_media() {
        let err = normalize_media_url("https://imgur.com/a/XyZ").unwrap_err();
        assert_eq!(err.reason, NotMediaReason::NoExtension);
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in [
            "https://i.imgur.com/QTCeiNM.gifv",
            "https://i.redd.it/abc.PNG?s=1",
            "https://i.imgur.com/6u8CtM9.jpg",
            "http://example.com/some/dir/clip.mov#t=3",
        ] {
            let once = normalize_media_url(raw).unwrap();
            let twice = normalize_media_url(&once.canonical_url).unwrap();
            assert_eq!(once, twice, "normalization of {raw} is not idempotent");
        }
    }

    #[test]
    fn host_of_strips_port_and_userinfo() {
        assert_eq!(
            host_of("https://user:pw@I.Imgur.com:443/x.jpg").as_deref(),
            Some("i.imgur.com")
        );
        assert_eq!(host_of("https:///x.jpg"), None);
    }

    #[test]
    fn resolver_accepts_subdomains_of_configured_hosts() {
        let resolver = MediaUrlResolver::default();
        assert!(resolver.resolve("https://i.imgur.com/abc.jpg").is_ok());
        assert!(resolver.resolve("https://i.redd.it/abc.png").is_ok());
    }

    #[test]
    fn resolver_rejects_foreign_host() {
        let resolver = MediaUrlResolver::default();
        let err = resolver
            .resolve("https://example.com/abc.jpg")
            .unwrap_err();
        assert_eq!(
            err.reason,
            NotMediaReason::HostNotAccepted("example.com".to_string())
        );
    }

    #[test]
    fn resolver_does_not_match_host_suffix_without_dot() {
        let resolver = MediaUrlResolver::new(["imgur.com"]);
        assert!(resolver.resolve("https://notimgur.com/abc.jpg").is_err());
    }

    #[test]
    fn empty_host_list_accepts_any_host() {
        let resolver = MediaUrlResolver::new(Vec::<String>::new());
        assert!(resolver.resolve("https://example.com/abc.jpg").is_ok());
    }
}
