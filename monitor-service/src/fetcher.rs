use monitor_core::{strip_subreddit_prefix, KeywordMatcher, MatchedPost, PostSort, PostSource};
use tracing::{debug, error, info};

/// Fetches `limit` posts from `subreddit` and keeps those mentioning any keyword.
///
/// Never fails: errors are logged and yield an empty result, so one bad
/// subreddit cannot abort a scan.
pub async fn fetch_and_filter<S, K>(
    source: &S,
    subreddit: &str,
    keywords: &[K],
    sort: PostSort,
    limit: u32,
) -> Vec<MatchedPost>
where
    S: PostSource + ?Sized,
    K: AsRef<str>,
{
    let matcher = KeywordMatcher::new(keywords);
    fetch_matching(source, subreddit, &matcher, sort, limit).await
}

pub async fn fetch_matching<S>(
    source: &S,
    subreddit: &str,
    matcher: &KeywordMatcher,
    sort: PostSort,
    limit: u32,
) -> Vec<MatchedPost>
where
    S: PostSource + ?Sized,
{
    let subreddit = strip_subreddit_prefix(subreddit);
    info!("Fetching posts from r/{}...", subreddit);

    let posts = match source.fetch_posts(subreddit, sort, limit).await {
        Ok(posts) => posts,
        Err(e) => {
            error!("Error fetching posts from r/{}: {}", subreddit, e);
            return Vec::new();
        }
    };

    let fetched = posts.len();
    let matched: Vec<MatchedPost> = posts
        .iter()
        .filter(|post| matcher.matches(&post.title, Some(post.selftext.as_str())))
        .map(|post| MatchedPost::from_post(subreddit, post))
        .collect();

    debug!(
        "r/{}: {} of {} posts matched",
        subreddit,
        matched.len(),
        fetched
    );
    matched
}
