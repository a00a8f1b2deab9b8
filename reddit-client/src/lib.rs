pub mod api;
pub mod auth;
pub mod rate_limiter;


pub use api::{RedditApiClient, RedditListing, RedditPostData, MAX_PAGE_SIZE};
pub use auth::{RedditAuth, RedditToken};

use async_trait::async_trait;
use monitor_core::{
    strip_subreddit_prefix, CoreError, PostSort, PostSource, RedditApiError, RedditCredentials,
    RedditPost,
};
use std::future::Future;
use tracing::{debug, info};

/// Authenticated Reddit client for a "script" app.
pub struct RedditClient {
    api: RedditApiClient,
    auth: RedditAuth,
}

impl RedditClient {
    /// Builds the client without contacting Reddit.
    pub fn new(credentials: &RedditCredentials) -> Result<Self, CoreError> {
        credentials.validate()?;

        let http = api::build_http_client(&credentials.user_agent)?;
        let auth = RedditAuth::new(credentials, http.clone())?;
        let api = RedditApiClient::new(http)?;

        Ok(Self { api, auth })
    }

    /// Builds the client and authenticates immediately, so bad credentials fail up front.
    pub async fn connect(credentials: &RedditCredentials) -> Result<Self, CoreError> {
        let client = Self::new(credentials)?;
        client.authenticate().await?;
        info!("Authenticated with Reddit");
        Ok(client)
    }

    pub async fn authenticate(&self) -> Result<(), CoreError> {
        self.auth.access_token().await.map(|_| ())
    }

    pub async fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated().await
    }

    pub async fn set_token(&self, token: RedditToken) {
        self.auth.set_token(token).await;
    }

    pub async fn get_rate_limit_status(&self) -> rate_limiter::RateLimitStatus {
        self.api.get_rate_limit_status().await
    }

    /// Fetches up to `limit` posts, following `after` cursors in pages of at most 100.
    pub async fn get_posts(
        &self,
        subreddit: &str,
        sort: PostSort,
        limit: u32,
    ) -> Result<Vec<RedditPost>, CoreError> {
        let subreddit = normalize_subreddit_name(subreddit)?;

        paginate(limit, |after, page_size| async move {
            let access_token = self.auth.access_token().await?;
            let listing = match self
                .api
                .get_subreddit_posts(&access_token, subreddit, sort, page_size, after.as_deref())
                .await
            {
                Ok(listing) => listing,
                Err(e @ CoreError::RedditApi(RedditApiError::InvalidToken)) => {
                    self.auth.invalidate().await;
                    return Err(e);
                }
                Err(e) => return Err(e),
            };

            let page: Vec<RedditPost> = listing
                .data
                .children
                .into_iter()
                .map(|child| RedditPost::from(child.data))
                .collect();
            Ok::<_, CoreError>((page, listing.data.after))
        })
        .await
    }
}

/// Collects up to `limit` posts from a cursor-paged listing.
///
/// `fetch_page` receives the `after` cursor and the page size to request. Paging stops
/// once `limit` posts are collected, the listing has no next cursor, or a page is empty.
pub(crate) async fn paginate<F, Fut>(limit: u32, mut fetch_page: F) -> Result<Vec<RedditPost>, CoreError>
where
    F: FnMut(Option<String>, u32) -> Fut,
    Fut: Future<Output = Result<(Vec<RedditPost>, Option<String>), CoreError>>,
{
    let mut posts: Vec<RedditPost> = Vec::with_capacity(limit.min(MAX_PAGE_SIZE) as usize);
    let mut after: Option<String> = None;

    while (posts.len() as u32) < limit {
        let page_size = (limit - posts.len() as u32).min(MAX_PAGE_SIZE);
        let (page, next) = fetch_page(after.take(), page_size).await?;
        let page_len = page.len();
        posts.extend(page);

        match next {
            Some(cursor) if page_len > 0 => {
                debug!("{} posts so far, continuing after {}", posts.len(), cursor);
                after = Some(cursor);
            }
            _ => break,
        }
    }

    // Stickied posts can push a page past the requested size
    posts.truncate(limit as usize);
    Ok(posts)
}

#[async_trait]
impl PostSource for RedditClient {
    async fn fetch_posts(
        &self,
        subreddit: &str,
        sort: PostSort,
        limit: u32,
    ) -> Result<Vec<RedditPost>, CoreError> {
        self.get_posts(subreddit, sort, limit).await
    }
}

/// Strips an `r/` prefix and checks the name against Reddit's naming rules.
pub fn normalize_subreddit_name(name: &str) -> Result<&str, CoreError> {
    let bare = strip_subreddit_prefix(name);

    let valid_length = (2..=21).contains(&bare.len());
    let valid_chars = bare.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid_length && valid_chars {
        Ok(bare)
    } else {
        Err(CoreError::InvalidInput {
            message: format!("invalid subreddit name '{}'", name),
        })
    }
}
