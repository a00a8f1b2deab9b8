//! Case-insensitive keyword matching over post title and body.
//!
//! Matching is plain substring search on the lowercased text, so `react`
//! also matches `reactor`.

/// Returns true if any keyword occurs in `"{title} {body}"`, ignoring case.
///
/// An absent body is treated as empty. An empty keyword list never matches.
pub fn matches<S: AsRef<str>>(title: &str, body: Option<&str>, keywords: &[S]) -> bool {
    let haystack = search_text(title, body);
    keywords
        .iter()
        .any(|keyword| haystack.contains(&keyword.as_ref().to_lowercase()))
}

fn search_text(title: &str, body: Option<&str>) -> String {
    format!("{} {}", title, body.unwrap_or_default()).to_lowercase()
}

/// Keyword set folded once, for filtering many posts against the same keywords.
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    folded: Vec<String>,
}

impl KeywordMatcher {
    pub fn new<S: AsRef<str>>(keywords: &[S]) -> Self {
        Self {
            folded: keywords.iter().map(|k| k.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn matches(&self, title: &str, body: Option<&str>) -> bool {
        let haystack = search_text(title, body);
        self.folded.iter().any(|keyword| haystack.contains(keyword))
    }
}
