//! Console rendering of the banner and the match report.

use monitor_core::{strip_subreddit_prefix, MatchedPost};
use std::io::{self, Write};

pub const TITLE: &str = "Tech Monitor - Reddit API Integration";

const RULE_WIDTH: usize = 80;

pub fn render_banner<W: Write>(
    out: &mut W,
    keywords: &[String],
    subreddits: &[String],
) -> io::Result<()> {
    writeln!(out, "{}", TITLE)?;
    writeln!(out, "{}", "=".repeat(TITLE.len() + 1))?;
    writeln!(out)?;
    writeln!(out, "Searching for keywords: {}", keywords.join(", "))?;
    let subreddits: Vec<String> = subreddits
        .iter()
        .map(|s| format!("r/{}", strip_subreddit_prefix(s)))
        .collect();
    writeln!(out, "Subreddits: {}", subreddits.join(", "))?;
    Ok(())
}

pub fn render_report<W: Write>(out: &mut W, posts: &[MatchedPost]) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);

    writeln!(out, "\n\nFound {} matching posts:\n", posts.len())?;
    writeln!(out, "{}", rule)?;

    if posts.is_empty() {
        writeln!(out, "No posts found matching the specified keywords.")?;
    } else {
        for (index, post) in posts.iter().enumerate() {
            render_post(out, index + 1, post)?;
        }
    }

    writeln!(out, "\n{}", rule)?;
    Ok(())
}

fn render_post<W: Write>(out: &mut W, number: usize, post: &MatchedPost) -> io::Result<()> {
    writeln!(out, "\n{}. [r/{}] {}", number, post.subreddit, post.title)?;
    writeln!(out, "   Author: u/{} | Score: {}", post.author, post.score)?;
    writeln!(out, "   URL: {}", post.url)?;
    writeln!(out, "   Posted: {}", post.created_iso())
}
