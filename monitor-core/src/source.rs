use crate::{CoreError, PostSort, RedditPost};
use async_trait::async_trait;

/// Anything that can list recent posts for a subreddit.
///
/// The Reddit client implements this; scans only depend on this trait.
#[async_trait]
pub trait PostSource: Send + Sync {
    /// Fetch up to `limit` posts from `subreddit` in `sort` order, in the order returned.
    async fn fetch_posts(
        &self,
        subreddit: &str,
        sort: PostSort,
        limit: u32,
    ) -> Result<Vec<RedditPost>, CoreError>;
}
