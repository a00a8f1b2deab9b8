use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use std::fmt;
use tracing::warn;

pub const REDDIT_WEB_BASE: &str = "https://reddit.com";

#[derive(Debug, Clone, PartialEq)]
pub struct RedditPost {
    pub id: String,
    pub title: String,
    pub selftext: String,
    pub author: String,
    pub subreddit: String,
    pub permalink: String,
    pub score: i64,
    pub created_utc: f64,
}

/// A post that passed the keyword filter, normalized for display.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedPost {
    pub subreddit: String,
    pub title: String,
    pub author: String,
    pub url: String,
    pub score: i64,
    pub created: DateTime<Utc>,
}

impl MatchedPost {
    /// `subreddit` is the name as configured, not the one Reddit echoes back.
    pub fn from_post(subreddit: &str, post: &RedditPost) -> Self {
        Self {
            subreddit: subreddit.to_string(),
            title: post.title.clone(),
            author: post.author.clone(),
            url: format!("{}{}", REDDIT_WEB_BASE, post.permalink),
            score: post.score,
            created: epoch_seconds_to_utc(post.created_utc),
        }
    }

    /// ISO-8601 with millisecond precision, e.g. `2022-01-01T00:00:00.000Z`.
    pub fn created_iso(&self) -> String {
        self.created.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Sub-millisecond digits are dropped, never rounded up into the next millisecond.
pub fn epoch_seconds_to_utc(seconds: f64) -> DateTime<Utc> {
    let millis = (seconds * 1000.0).trunc();
    match DateTime::<Utc>::from_timestamp_millis(millis as i64) {
        Some(created) if millis.is_finite() => created,
        _ => {
            warn!("created_utc {} is out of range, using the Unix epoch", seconds);
            DateTime::<Utc>::default()
        }
    }
}

/// Strips a leading `/r/` or `r/` so names can be configured either way.
pub fn strip_subreddit_prefix(name: &str) -> &str {
    let name = name.trim();
    name.strip_prefix("/r/")
        .or_else(|| name.strip_prefix("r/"))
        .unwrap_or(name)
}

/// Listing order requested from Reddit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostSort {
    #[default]
    Hot,
    New,
    Top,
    Rising,
}

impl PostSort {
    pub fn as_path(&self) -> &'static str {
        match self {
            PostSort::Hot => "hot",
            PostSort::New => "new",
            PostSort::Top => "top",
            PostSort::Rising => "rising",
        }
    }
}

impl fmt::Display for PostSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}
