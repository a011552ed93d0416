use regex::Regex;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::models::RepoCoordinates;

static HTTPS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(?:www\.)?github\.com/([A-Za-z0-9-]+)/([A-Za-z0-9_.-]+)$")
        .expect("valid regex")
});

static SSH_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^git@github\.com:([A-Za-z0-9-]+)/([A-Za-z0-9_.-]+)$").expect("valid regex")
});

/// Extract owner and repository name from a GitHub URL.
///
/// Accepts `https://github.com/<owner>/<repo>` (optionally `http`, `www.`,
/// a trailing slash and/or `.git`) and `git@github.com:<owner>/<repo>.git`.
pub fn parse_repository_url(url: &str) -> Result<RepoCoordinates> {
    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    let trimmed = trimmed.trim_end_matches('/');

    let captures = HTTPS_URL
        .captures(trimmed)
        .or_else(|| SSH_URL.captures(trimmed))
        .ok_or_else(|| Error::InvalidUrl(url.trim().to_string()))?;

    let owner = &captures[1];
    let repo = &captures[2];

    if repo == "." || repo == ".." {
        return Err(Error::InvalidUrl(url.trim().to_string()));
    }

    Ok(RepoCoordinates::new(owner, repo))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coords(url: &str) -> (String, String) {
        let c = parse_repository_url(url).unwrap();
        (c.owner, c.repo)
    }

    #[test]
    fn test_parse_plain_url() {
        assert_eq!(
            coords("https://github.com/octocat/Hello-World"),
            ("octocat".to_string(), "Hello-World".to_string())
        );
    }

    #[test]
    fn test_parse_url_variants() {
        let expected = ("octocat".to_string(), "Hello-World".to_string());
        for url in [
            "https://github.com/octocat/Hello-World/",
            "https://github.com/octocat/Hello-World.git",
            "https://github.com/octocat/Hello-World.git/",
            "http://github.com/octocat/Hello-World",
            "https://www.github.com/octocat/Hello-World",
            "  https://github.com/octocat/Hello-World  ",
            "git@github.com:octocat/Hello-World.git",
        ] {
            assert_eq!(coords(url), expected, "url: {}", url);
        }
    }

    #[test]
    fn test_repo_names_with_dots_survive() {
        assert_eq!(
            coords("https://github.com/vercel/next.js"),
            ("vercel".to_string(), "next.js".to_string())
        );
        // Only the suffix is stripped, not trailing characters of the name.
        assert_eq!(
            coords("https://github.com/acme/widget.git"),
            ("acme".to_string(), "widget".to_string())
        );
        assert_eq!(
            coords("https://github.com/acme/config-git"),
            ("acme".to_string(), "config-git".to_string())
        );
    }

    #[test]
    fn test_rejects_other_inputs() {
        for url in [
            "",
            "not a url",
            "https://gitlab.com/octocat/Hello-World",
            "https://github.com/octocat",
            "https://github.com/",
            "https://github.com/octocat/Hello-World/tree/main",
            "ftp://github.com/octocat/Hello-World",
            "https://github.com.evil.io/octocat/Hello-World",
            "https://github.com/octocat/..",
        ] {
            assert!(
                matches!(parse_repository_url(url), Err(Error::InvalidUrl(_))),
                "url should be rejected: {:?}",
                url
            );
        }
    }

    #[test]
    fn test_canonical_url() {
        let c = parse_repository_url("git@github.com:octocat/Hello-World.git").unwrap();
        assert_eq!(c.canonical_url(), "https://github.com/octocat/Hello-World");
    }
}
