use async_trait::async_trait;
use monitor_core::{
    CoreError, PostSort, PostSource, RedditApiError, RedditPost,
};
use monitor_service::{fetch_and_filter, Monitor, ScanPlan};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

enum Listing {
    Posts(Vec<RedditPost>),
    NetworkFailure,
}

/// In-memory stand-in for the Reddit client.
#[derive(Default)]
struct StubSource {
    listings: HashMap<String, Listing>,
    delays: HashMap<String, Duration>,
    requests: Mutex<Vec<(String, PostSort, u32)>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl StubSource {
    fn with_posts(mut self, subreddit: &str, posts: Vec<RedditPost>) -> Self {
        self.listings
            .insert(subreddit.to_string(), Listing::Posts(posts));
        self
    }

    fn failing(mut self, subreddit: &str) -> Self {
        self.listings
            .insert(subreddit.to_string(), Listing::NetworkFailure);
        self
    }

    fn with_delay(mut self, subreddit: &str, millis: u64) -> Self {
        self.delays
            .insert(subreddit.to_string(), Duration::from_millis(millis));
        self
    }

    fn requests(&self) -> Vec<(String, PostSort, u32)> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PostSource for StubSource {
    async fn fetch_posts(
        &self,
        subreddit: &str,
        sort: PostSort,
        limit: u32,
    ) -> Result<Vec<RedditPost>, CoreError> {
        self.requests
            .lock()
            .unwrap()
            .push((subreddit.to_string(), sort, limit));

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(subreddit) {
            tokio::time::sleep(*delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match self.listings.get(subreddit) {
            Some(Listing::Posts(posts)) => Ok(posts.iter().take(limit as usize).cloned().collect()),
            Some(Listing::NetworkFailure) => Err(CoreError::RedditApi(RedditApiError::RequestTimeout)),
            None => Err(CoreError::RedditApi(RedditApiError::SubredditNotFound {
                subreddit: subreddit.to_string(),
            })),
        }
    }
}

fn post(id: &str, subreddit: &str, title: &str, selftext: &str) -> RedditPost {
    RedditPost {
        id: id.to_string(),
        title: title.to_string(),
        selftext: selftext.to_string(),
        author: format!("author_{}", id),
        subreddit: subreddit.to_string(),
        permalink: format!("/r/{}/comments/{}/", subreddit, id),
        score: 10,
        created_utc: 1640995200.0,
    }
}

fn plan(subreddits: &[&str], keywords: &[&str], posts_limit: u32) -> ScanPlan {
    ScanPlan {
        subreddits: subreddits.iter().map(|s| s.to_string()).collect(),
        keywords: keywords.iter().map(|k| k.to_string()).collect(),
        posts_limit,
        sort: PostSort::Hot,
        concurrency: 1,
    }
}

#[tokio::test]
async fn test_fetch_and_filter_preserves_api_order() {
    let source = StubSource::default().with_posts(
        "webdev",
        vec![
            post("p1", "webdev", "React 19 released", ""),
            post("p2", "webdev", "CSS tricks", "flexbox and grid"),
            post("p3", "webdev", "Weekly thread", "Moving our app to TypeScript"),
        ],
    );

    let matched = fetch_and_filter(&source, "webdev", &["react", "typescript"], PostSort::Hot, 25).await;

    let titles: Vec<&str> = matched.iter().map(|m| m.title.as_str()).collect();
    assert_eq!(titles, vec!["React 19 released", "Weekly thread"]);
    assert_eq!(matched[1].url, "https://reddit.com/r/webdev/comments/p3/");
    assert_eq!(matched[1].author, "author_p3");
}

#[tokio::test]
async fn test_fetch_and_filter_absorbs_failures() {
    let source = StubSource::default().failing("webdev");

    let matched = fetch_and_filter(&source, "webdev", &["react"], PostSort::Hot, 25).await;
    assert!(matched.is_empty());

    let matched = fetch_and_filter(&source, "doesnotexist", &["react"], PostSort::Hot, 25).await;
    assert!(matched.is_empty());
}

#[tokio::test]
async fn test_fetch_and_filter_passes_sort_and_limit() {
    let source = StubSource::default().with_posts("rust", vec![]);

    fetch_and_filter(&source, "rust", &["async"], PostSort::Top, 7).await;
    assert_eq!(source.requests(), vec![("rust".to_string(), PostSort::Top, 7)]);
}

#[tokio::test]
async fn test_end_to_end_single_match() {
    let source = StubSource::default().with_posts(
        "webdev",
        vec![
            post("ts", "webdev", "Learning TypeScript basics", ""),
            post("css", "webdev", "CSS tricks", ""),
        ],
    );
    let monitor = Monitor::new(&source, plan(&["webdev"], &["typescript"], 2));

    let mut out = Vec::new();
    let matched = monitor.run(&mut out).await.unwrap();
    let report = String::from_utf8(out).unwrap();

    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].title, "Learning TypeScript basics");
    assert_eq!(matched[0].url, "https://reddit.com/r/webdev/comments/ts/");
    assert!(report.starts_with("Tech Monitor - Reddit API Integration\n"));
    assert!(report.contains("Found 1 matching posts"));
    assert!(report.contains("1. [r/webdev] Learning TypeScript basics"));
    assert!(!report.contains("CSS tricks"));
    assert!(report.trim_end().ends_with("Done!"));
}

#[tokio::test]
async fn test_end_to_end_no_subreddits() {
    let source = StubSource::default();
    let monitor = Monitor::new(&source, plan(&[], &["typescript"], 25));

    let mut out = Vec::new();
    let matched = monitor.run(&mut out).await.unwrap();
    let report = String::from_utf8(out).unwrap();

    assert!(matched.is_empty());
    assert!(report.contains("Found 0 matching posts"));
    assert!(report.contains("No posts found matching the specified keywords."));
    assert!(source.requests().is_empty());
}

#[tokio::test]
async fn test_failing_subreddit_does_not_abort_scan() {
    let source = StubSource::default()
        .with_posts("webdev", vec![post("a", "webdev", "react tips", "")])
        .failing("reactjs")
        .with_posts("nextjs", vec![post("b", "nextjs", "Next.js and React", "")]);
    let monitor = Monitor::new(&source, plan(&["webdev", "reactjs", "nextjs"], &["react"], 25));

    let matched = monitor.scan().await;

    let subreddits: Vec<&str> = matched.iter().map(|m| m.subreddit.as_str()).collect();
    assert_eq!(subreddits, vec!["webdev", "nextjs"]);
    assert_eq!(source.requests().len(), 3);
}

#[tokio::test]
async fn test_sequential_scan_runs_one_fetch_at_a_time() {
    let source = StubSource::default()
        .with_posts("one", vec![post("1", "one", "react", "")])
        .with_posts("two", vec![post("2", "two", "react", "")])
        .with_delay("one", 20)
        .with_delay("two", 20);
    let monitor = Monitor::new(&source, plan(&["one", "two"], &["react"], 25));

    monitor.scan().await;

    assert_eq!(source.max_in_flight.load(Ordering::SeqCst), 1);
    let order: Vec<String> = source.requests().into_iter().map(|(s, _, _)| s).collect();
    assert_eq!(order, vec!["one", "two"]);
}

#[tokio::test]
async fn test_concurrent_scan_keeps_configured_order() {
    let source = StubSource::default()
        .with_posts("slow", vec![post("s", "slow", "react slow", "")])
        .with_posts("medium", vec![post("m", "medium", "react medium", "")])
        .with_posts("fast", vec![post("f", "fast", "react fast", "")])
        .with_delay("slow", 80)
        .with_delay("medium", 40)
        .with_delay("fast", 0);
    let mut scan_plan = plan(&["slow", "medium", "fast"], &["react"], 25);
    scan_plan.concurrency = 3;
    let monitor = Monitor::new(&source, scan_plan);

    let matched = monitor.scan().await;

    let subreddits: Vec<&str> = matched.iter().map(|m| m.subreddit.as_str()).collect();
    assert_eq!(subreddits, vec!["slow", "medium", "fast"]);
    assert!(source.max_in_flight.load(Ordering::SeqCst) > 1);
}

#[tokio::test]
async fn test_limit_bounds_posts_not_matches() {
    let source = StubSource::default().with_posts(
        "webdev",
        vec![
            post("1", "webdev", "css only", ""),
            post("2", "webdev", "more css", ""),
            post("3", "webdev", "react at last", ""),
        ],
    );
    let monitor = Monitor::new(&source, plan(&["webdev"], &["react"], 2));

    assert!(monitor.scan().await.is_empty());
}

#[tokio::test]
async fn test_prefixed_subreddit_is_reported_once_prefixed() {
    let source = StubSource::default().with_posts(
        "webdev",
        vec![post("ts", "webdev", "Learning TypeScript basics", "")],
    );
    let monitor = Monitor::new(&source, plan(&["r/webdev"], &["typescript"], 25));

    let mut out = Vec::new();
    let matched = monitor.run(&mut out).await.unwrap();
    let report = String::from_utf8(out).unwrap();

    assert_eq!(source.requests(), vec![("webdev".to_string(), PostSort::Hot, 25)]);
    assert_eq!(matched[0].subreddit, "webdev");
    assert!(report.contains("1. [r/webdev] Learning TypeScript basics"));
    assert!(!report.contains("r/r/"));
}

#[tokio::test]
async fn test_run_prints_banner_once_before_report() {
    let source = StubSource::default().with_posts("webdev", vec![]);
    let monitor = Monitor::new(&source, plan(&["webdev"], &["react", "typescript"], 25));

    let mut out = Vec::new();
    monitor.run(&mut out).await.unwrap();
    let report = String::from_utf8(out).unwrap();

    let banner_end = report.find("Subreddits: r/webdev\n").unwrap();
    let found = report.find("Found 0 matching posts").unwrap();
    assert!(report.starts_with("Tech Monitor - Reddit API Integration\n"));
    assert!(report.contains("Searching for keywords: react, typescript\n"));
    assert!(banner_end < found);
    assert_eq!(report.matches("Tech Monitor - Reddit API Integration").count(), 1);
}
