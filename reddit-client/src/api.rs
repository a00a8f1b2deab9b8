use crate::rate_limiter::{RateLimitConfig, RateLimitStatus, RateLimiter};
use monitor_core::{CoreError, PostSort, RedditApiError, RedditPost};
use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::Url;

const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

/// Reddit never returns more than this many posts per listing request.
pub const MAX_PAGE_SIZE: u32 = 100;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub author: String,
    pub subreddit: String,
    pub permalink: String,
    pub created_utc: f64,
    pub score: i64,
}

impl From<RedditPostData> for RedditPost {
    fn from(post_data: RedditPostData) -> Self {
        Self {
            id: post_data.id,
            title: post_data.title,
            selftext: post_data.selftext,
            author: post_data.author,
            subreddit: post_data.subreddit,
            permalink: post_data.permalink,
            score: post_data.score,
            created_utc: post_data.created_utc,
        }
    }
}

pub fn build_http_client(user_agent: &str) -> Result<Client, CoreError> {
    // Unknown subreddits redirect to a search page; surface that as an error instead.
    let client = Client::builder()
        .user_agent(user_agent)
        .timeout(REQUEST_TIMEOUT)
        .redirect(reqwest::redirect::Policy::none())
        .build()?;
    Ok(client)
}

/// Maps a listing response status onto the error taxonomy.
pub fn check_status(
    status: StatusCode,
    retry_after: Option<&str>,
    subreddit: &str,
) -> Result<(), RedditApiError> {
    if status.is_success() {
        return Ok(());
    }

    let error = match status.as_u16() {
        429 => RedditApiError::RateLimitExceeded {
            retry_after: retry_after
                .and_then(|value| value.trim().parse::<f64>().ok())
                .map(|seconds| seconds.ceil() as u64)
                .unwrap_or(60),
        },
        401 => RedditApiError::InvalidToken,
        403 => RedditApiError::Forbidden {
            resource: format!("r/{}", subreddit),
        },
        404 => RedditApiError::SubredditNotFound {
            subreddit: subreddit.to_string(),
        },
        _ if status.is_redirection() => RedditApiError::SubredditNotFound {
            subreddit: subreddit.to_string(),
        },
        _ if status.is_server_error() => RedditApiError::ServerError {
            status_code: status.as_u16(),
        },
        _ => RedditApiError::InvalidResponse {
            details: format!("unexpected status {}", status),
        },
    };
    Err(error)
}

#[derive(Debug)]
pub struct RedditApiClient {
    http_client: Client,
    rate_limiter: Arc<RateLimiter>,
    base_url: Url,
}

impl RedditApiClient {
    pub fn new(http_client: Client) -> Result<Self, CoreError> {
        let base_url = Url::parse(REDDIT_API_BASE).map_err(|e| CoreError::Internal {
            message: format!("invalid API base URL: {}", e),
        })?;

        Ok(Self {
            http_client,
            rate_limiter: Arc::new(RateLimiter::new(RateLimitConfig::reddit_oauth())),
            base_url,
        })
    }

    pub fn listing_url(
        &self,
        subreddit: &str,
        sort: PostSort,
        limit: u32,
        after: Option<&str>,
    ) -> Result<Url, CoreError> {
        let mut url = self
            .base_url
            .join(&format!("/r/{}/{}", subreddit, sort.as_path()))
            .map_err(|e| CoreError::InvalidInput {
                message: format!("cannot build listing URL for r/{}: {}", subreddit, e),
            })?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("limit", &limit.to_string());
            query.append_pair("raw_json", "1");
            if let Some(cursor) = after {
                query.append_pair("after", cursor);
            }
        }
        Ok(url)
    }

    async fn get(&self, url: Url, access_token: &str, subreddit: &str) -> Result<Response, CoreError> {
        let _permit = self.rate_limiter.acquire_permit().await?;
        debug!("Making Reddit API request: GET {}", url.path());

        let response = self
            .http_client
            .get(url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| {
                error!("Network error for r/{}: {}", subreddit, e);
                if e.is_timeout() {
                    CoreError::RedditApi(RedditApiError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })?;

        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok());
        if let Err(e) = check_status(response.status(), retry_after, subreddit) {
            warn!("Request for r/{} failed with status {}", subreddit, response.status());
            return Err(CoreError::RedditApi(e));
        }

        Ok(response)
    }

    pub async fn get_subreddit_posts(
        &self,
        access_token: &str,
        subreddit: &str,
        sort: PostSort,
        limit: u32,
        after: Option<&str>,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let url = self.listing_url(subreddit, sort, limit, after)?;
        let response = self.get(url, access_token, subreddit).await?;

        let body = response.text().await?;
        let listing: RedditListing<RedditPostData> = serde_json::from_str(&body).map_err(|e| {
            error!("Failed to parse subreddit posts: {}", e);
            CoreError::RedditApi(RedditApiError::InvalidResponse {
                details: format!("Failed to parse posts for r/{}", subreddit),
            })
        })?;

        info!(
            "Retrieved {} posts from r/{}",
            listing.data.children.len(),
            subreddit
        );
        Ok(listing)
    }

    pub async fn get_rate_limit_status(&self) -> RateLimitStatus {
        self.rate_limiter.status().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_url() {
        let client = RedditApiClient::new(Client::new()).unwrap();
        let url = client
            .listing_url("webdev", PostSort::Hot, 25, None)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://oauth.reddit.com/r/webdev/hot?limit=25&raw_json=1"
        );

        let url = client
            .listing_url("rust", PostSort::New, 100, Some("t3_abc"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://oauth.reddit.com/r/rust/new?limit=100&raw_json=1&after=t3_abc"
        );
    }

    #[test]
    fn test_reddit_post_conversion() {
        let post_data = RedditPostData {
            id: "test123".to_string(),
            title: "Test Post".to_string(),
            selftext: "This is test content".to_string(),
            author: "test_user".to_string(),
            subreddit: "test".to_string(),
            permalink: "/r/test/comments/test123".to_string(),
            created_utc: 1640995200.0,
            score: 42,
        };

        let reddit_post: RedditPost = post_data.into();
        assert_eq!(reddit_post.id, "test123");
        assert_eq!(reddit_post.title, "Test Post");
        assert_eq!(reddit_post.selftext, "This is test content");
        assert_eq!(reddit_post.permalink, "/r/test/comments/test123");
        assert_eq!(reddit_post.score, 42);
    }

    #[tokio::test]
    async fn test_api_client_creation() {
        let client = RedditApiClient::new(build_http_client("test-user-agent/1.0").unwrap()).unwrap();
        let status = client.get_rate_limit_status().await;
        assert!(status.available_tokens > 0);
    }
}
