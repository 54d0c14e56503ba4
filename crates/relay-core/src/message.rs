//! Status text composition under a fixed character ceiling.
//!
//! A composed message is `title [#tag ...] via <link>`. The link is counted at
//! a fixed display width regardless of its real length, matching how the
//! platform shortens URLs. Lengths are Unicode scalar value counts.

use crate::error::ConfigError;

/// Separator placed between the text and the link.
pub const VIA: &str = " via ";

/// Marker appended to a truncated title.
pub const ELLIPSIS: &str = "...";

pub const DEFAULT_MAX_MESSAGE_LENGTH: usize = 140;

/// Display width the platform assigns to any link.
pub const DEFAULT_LINK_LENGTH: usize = 23;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageComposer {
    ceiling: usize,
    link_width: usize,
}

impl Default for MessageComposer {
    fn default() -> Self {
        Self {
            ceiling: DEFAULT_MAX_MESSAGE_LENGTH,
            link_width: DEFAULT_LINK_LENGTH,
        }
    }
}

impl MessageComposer {
    /// Creates a composer for a `ceiling`-character platform.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MessageCeiling`] if the ceiling cannot fit the
    /// separator, the link and an ellipsis, since no title could then be
    /// represented without overflowing.
    pub fn new(ceiling: usize, link_width: usize) -> Result<Self, ConfigError> {
        if ceiling < VIA.len() + link_width + ELLIPSIS.len() {
            return Err(ConfigError::MessageCeiling {
                ceiling,
                link_width,
            });
        }
        Ok(Self {
            ceiling,
            link_width,
        })
    }

    #[must_use]
    pub fn ceiling(&self) -> usize {
        self.ceiling
    }

    /// Characters available for the title and hashtags.
    fn budget(&self) -> usize {
        self.ceiling - VIA.len() - self.link_width
    }

    /// Builds the status text for `title`, linking to `link`.
    ///
    /// A title longer than the budget is cut and suffixed with `...`, and no
    /// hashtags are added. Otherwise hashtags are appended in order while the
    /// next one still fits (landing exactly on the ceiling counts as fitting);
    /// the first one that does not fit ends the walk.
    #[must_use]
    pub fn compose<S: AsRef<str>>(&self, title: &str, link: &str, hashtags: &[S]) -> String {
        let budget = self.budget();
        let title_len = title.chars().count();

        let mut message = if title_len > budget {
            let mut truncated: String = title.chars().take(budget - ELLIPSIS.len()).collect();
            truncated.push_str(ELLIPSIS);
            truncated
        } else {
            let mut message = title.to_owned();
            let mut used = title_len;
            for tag in hashtags {
                let tag = tag.as_ref();
                let needed = 1 + tag.chars().count();
                if used + needed > budget {
                    break;
                }
                message.push(' ');
                message.push_str(tag);
                used += needed;
            }
            message
        };

        message.push_str(VIA);
        message.push_str(link);
        message
    }

    /// Length of `composed` as the platform counts it, with a trailing `link`
    /// weighed at the fixed link width.
    #[must_use]
    pub fn platform_length(&self, composed: &str, link: &str) -> usize {
        match composed.strip_suffix(link) {
            Some(prefix) if !link.is_empty() => prefix.chars().count() + self.link_width,
            _ => composed.chars().count(),
        }
    }
}

#[cfg(test)]
#[path = "message_test.rs"]
mod tests;
