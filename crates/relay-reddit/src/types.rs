use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub(crate) access_token: String,
}

/// `/r/{subreddit}/top` listing wrapper.
#[derive(Debug, Deserialize)]
pub(crate) struct Listing {
    pub(crate) data: ListingData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ListingData {
    #[serde(default)]
    pub(crate) children: Vec<Post>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Post {
    pub(crate) data: PostData,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PostData {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) title: String,
    /// Link target; self posts point back at their own permalink.
    pub(crate) url: Option<String>,
}
