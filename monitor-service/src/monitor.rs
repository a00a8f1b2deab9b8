use crate::fetcher::fetch_matching;
use crate::report;
use futures::stream::{self, StreamExt};
use monitor_core::{AppConfig, CoreError, KeywordMatcher, MatchedPost, PostSort, PostSource};
use std::io::Write;
use tracing::info;

/// What a single run scans, independent of credentials.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub subreddits: Vec<String>,
    pub keywords: Vec<String>,
    pub posts_limit: u32,
    pub sort: PostSort,
    pub concurrency: usize,
}

impl ScanPlan {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            subreddits: config.subreddits.clone(),
            keywords: config.keywords.clone(),
            posts_limit: config.posts_limit,
            sort: config.sort,
            concurrency: config.concurrency,
        }
    }
}

pub struct Monitor<'a, S: ?Sized> {
    source: &'a S,
    plan: ScanPlan,
    matcher: KeywordMatcher,
}

impl<'a, S> Monitor<'a, S>
where
    S: PostSource + ?Sized,
{
    pub fn new(source: &'a S, plan: ScanPlan) -> Self {
        let matcher = KeywordMatcher::new(&plan.keywords);
        Self {
            source,
            plan,
            matcher,
        }
    }

    /// Fetches every configured subreddit and concatenates the matches.
    ///
    /// At most `concurrency` fetches run at once; results keep the configured
    /// subreddit order either way.
    pub async fn scan(&self) -> Vec<MatchedPost> {
        let per_subreddit: Vec<Vec<MatchedPost>> = stream::iter(&self.plan.subreddits)
            .map(|subreddit| {
                fetch_matching(
                    self.source,
                    subreddit,
                    &self.matcher,
                    self.plan.sort,
                    self.plan.posts_limit,
                )
            })
            .buffered(self.plan.concurrency.max(1))
            .collect()
            .await;

        per_subreddit.into_iter().flatten().collect()
    }

    /// Writes the banner, scans, then writes the report and the closing line to `out`.
    ///
    /// Takes an already connected source, so a failed login never leaves partial output.
    pub async fn run<W: Write>(&self, out: &mut W) -> Result<Vec<MatchedPost>, CoreError> {
        report::render_banner(out, &self.plan.keywords, &self.plan.subreddits)?;
        out.flush()?;

        let matched = self.scan().await;
        info!(
            "Scan finished: {} matching posts across {} subreddits",
            matched.len(),
            self.plan.subreddits.len()
        );

        report::render_report(out, &matched)?;
        writeln!(out, "\nDone!")?;
        out.flush()?;
        Ok(matched)
    }
}
