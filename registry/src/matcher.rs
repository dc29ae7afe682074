//! URL matchers for registered handlers.

use std::fmt;

use regex::Regex;

/// Either an exact URL or a pattern that must match the whole URL.
#[derive(Clone)]
pub enum UrlMatcher {
    Exact(String),
    Pattern(Regex),
}

impl UrlMatcher {
    /// Compile `pattern` anchored at both ends, so `https://a\.api/.*`
    /// never matches `http://proxy/?u=https://a.api/x`.
    pub fn pattern(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(&format!("^(?:{pattern})$")).map(UrlMatcher::Pattern)
    }

    pub fn matches(&self, url: &str) -> bool {
        match self {
            UrlMatcher::Exact(expected) => expected == url,
            UrlMatcher::Pattern(re) => re.is_match(url),
        }
    }
}

impl From<&str> for UrlMatcher {
    fn from(url: &str) -> Self {
        UrlMatcher::Exact(url.to_string())
    }
}

impl From<String> for UrlMatcher {
    fn from(url: String) -> Self {
        UrlMatcher::Exact(url)
    }
}

impl fmt::Debug for UrlMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UrlMatcher::Exact(url) => f.debug_tuple("Exact").field(url).finish(),
            UrlMatcher::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_requires_equal_strings() {
        let m = UrlMatcher::from("https://external.api/");
        assert!(m.matches("https://external.api/"));
        assert!(!m.matches("https://external.api"));
        assert!(!m.matches("https://external.api/?q=1"));
    }

    #[test]
    fn pattern_is_a_full_string_test() {
        let m = UrlMatcher::pattern(r"https://external\.api/users/\d+").unwrap();
        assert!(m.matches("https://external.api/users/42"));
        assert!(!m.matches("https://external.api/users/42/posts"));
        assert!(!m.matches("http://proxy/?u=https://external.api/users/42"));
    }

    #[test]
    fn alternation_is_anchored_as_a_whole() {
        let m = UrlMatcher::pattern("https://a/|https://b/").unwrap();
        assert!(m.matches("https://b/"));
        assert!(!m.matches("https://a/x"));
    }

    #[test]
    fn invalid_pattern_is_rejected() {
        assert!(UrlMatcher::pattern("(unclosed").is_err());
    }
}
