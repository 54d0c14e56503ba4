//! First-match search over ranked feed candidates.

use crate::error::NoMediaFound;
use crate::media_url::MediaUrlResolver;
use crate::types::{Candidate, SelectedCandidate};

/// Returns the first of at most `limit` candidates whose URL resolves to media.
///
/// Candidates are consumed lazily in rank order; nothing past the match is
/// pulled from the iterator.
///
/// # Errors
///
/// Returns [`NoMediaFound`] if none of the examined candidates resolve.
pub fn select_candidate<I>(
    candidates: I,
    limit: usize,
    resolver: &MediaUrlResolver,
) -> Result<SelectedCandidate, NoMediaFound>
where
    I: IntoIterator<Item = Candidate>,
{
    let mut examined = 0usize;

    for candidate in candidates.into_iter().take(limit) {
        examined += 1;
        match resolver.resolve(&candidate.raw_media_url) {
            Ok(media) => {
                tracing::debug!(
                    rank = examined,
                    title = %candidate.title,
                    url = %media.canonical_url,
                    "selected candidate"
                );
                return Ok(SelectedCandidate { candidate, media });
            }
            Err(e) => {
                tracing::debug!(rank = examined, reason = %e.reason, url = %e.url, "skipping candidate");
            }
        }
    }

    Err(NoMediaFound { examined })
}
