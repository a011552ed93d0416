use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use futures::future::BoxFuture;
use reqwest::{header, Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

use crate::config::DEFAULT_GITHUB_API_URL;
use crate::error::{Error, Result};
use crate::github::host::RepositoryHost;
use crate::github::rate_limiter::{RateLimitSnapshot, RateLimitTracker};
use crate::models::{
    ContentEntry, EntryKind, FileNode, LanguageStats, ManifestFile, ReadmeFile, RepoCoordinates,
    RepositoryInfo,
};

pub const README_CANDIDATES: &[&str] = &["README.md", "README.rst", "README.txt", "README"];

pub const MANIFEST_FILES: &[&str] = &[
    "package.json",
    "requirements.txt",
    "Pipfile",
    "poetry.lock",
    "Gemfile",
    "composer.json",
    "pom.xml",
    "build.gradle",
    "Cargo.toml",
    "go.mod",
    "pubspec.yaml",
    "Package.swift",
];

/// Directory names never descended into, compared case-insensitively.
const SKIPPED_DIRECTORIES: &[&str] = &[
    ".git",
    ".github",
    "node_modules",
    "__pycache__",
    ".pytest_cache",
    "venv",
    "env",
    ".venv",
    ".env",
    "dist",
    "build",
    ".next",
    "target",
    "vendor",
    ".idea",
    ".vscode",
    ".ds_store",
    "coverage",
    ".coverage",
    ".nyc_output",
    "logs",
    "log",
];

const AUTH_REMEDIATION: &str = "GitHub API authentication required. This could be because:\n\
1. The repository is private and requires a GitHub token\n\
2. You've hit GitHub's API rate limit for unauthenticated requests\n\n\
Solution: set GITHUB_TOKEN to a personal access token:\n\
1. Go to https://github.com/settings/tokens\n\
2. Generate a new token (classic)\n\
3. Select the 'repo' scope for private repos or 'public_repo' for public repos\n\
4. Export it as GITHUB_TOKEN (or add it to your .env file) and restart the server";

pub fn should_skip_directory(name: &str) -> bool {
    let lower = name.to_lowercase();
    name.starts_with('.') || SKIPPED_DIRECTORIES.contains(&lower.as_str())
}

#[derive(Deserialize)]
struct FileContentResponse {
    #[serde(rename = "type")]
    kind: EntryKind,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    encoding: Option<String>,
}

#[derive(Deserialize)]
struct RateLimitResponse {
    resources: RateLimitResources,
}

#[derive(Deserialize)]
struct RateLimitResources {
    core: RateLimitWindow,
}

#[derive(Deserialize)]
struct RateLimitWindow {
    limit: u32,
    remaining: u32,
    reset: i64,
}

/// Decode a base64 `content` field. GitHub wraps the payload at 60 columns.
fn decode_content(encoded: &str) -> Option<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD.decode(compact.as_bytes()).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

pub struct GitHubClient {
    client: Client,
    rate_limiter: RateLimitTracker,
    base_url: String,
    authenticated: bool,
}

impl GitHubClient {
    pub fn new(token: Option<&str>, timeout: Duration) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = token {
            headers.insert(
                header::AUTHORIZATION,
                header::HeaderValue::from_str(&format!("Bearer {}", token))?,
            );
        }
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            header::HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("repoinsight/0.1"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimitTracker::new(),
            base_url: DEFAULT_GITHUB_API_URL.to_string(),
            authenticated: token.is_some(),
        })
    }

    /// Point the client at another API root (GitHub Enterprise, test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn rate_limiter(&self) -> &RateLimitTracker {
        &self.rate_limiter
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}/repos/{}/{}/contents",
            self.base_url, owner, repo
        ))
        .map_err(|e| Error::GitHubApi(format!("Invalid contents URL: {}", e)))?;

        url.path_segments_mut()
            .map_err(|_| Error::GitHubApi("GitHub base URL cannot carry a path".to_string()))?
            .extend(path.split('/').filter(|s| !s.is_empty()));

        Ok(url)
    }

    /// Map a failed metadata response to the error a caller can act on.
    fn classify_failure(&self, status: StatusCode, owner: &str, repo: &str, body: &str) -> Error {
        let snapshot = self.rate_limiter.snapshot();
        match status {
            StatusCode::NOT_FOUND => Error::RepoNotFound(format!("{}/{}", owner, repo)),
            StatusCode::UNAUTHORIZED if self.authenticated => Error::AuthRequired(
                "GitHub API authentication failed. Please check your GITHUB_TOKEN.".to_string(),
            ),
            StatusCode::UNAUTHORIZED => Error::AuthRequired(AUTH_REMEDIATION.to_string()),
            StatusCode::TOO_MANY_REQUESTS => Error::RateLimited(rate_limit_message(&snapshot)),
            StatusCode::FORBIDDEN if snapshot.is_exhausted() => {
                Error::RateLimited(rate_limit_message(&snapshot))
            }
            StatusCode::FORBIDDEN if !self.authenticated => {
                Error::AuthRequired(AUTH_REMEDIATION.to_string())
            }
            StatusCode::FORBIDDEN => Error::AuthRequired(format!(
                "Access to '{}/{}' is forbidden for the configured GITHUB_TOKEN",
                owner, repo
            )),
            _ => Error::GitHubApi(format!(
                "Failed to fetch repository {}/{}: {} - {}",
                owner, repo, status, body
            )),
        }
    }

    pub async fn get_repository(&self, owner: &str, repo: &str) -> Result<RepositoryInfo> {
        let url = format!("{}/repos/{}/{}", self.base_url, owner, repo);
        tracing::info!("Fetching repository: {}/{}", owner, repo);

        let response = self.client.get(&url).send().await?;
        self.rate_limiter.update_from_response(&response);

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(self.classify_failure(status, owner, repo, &body));
        }

        Ok(response.json().await?)
    }

    pub async fn get_contents(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Vec<ContentEntry>> {
        let url = self.contents_url(owner, repo, path)?;
        tracing::debug!("Listing contents: {}/{}:/{}", owner, repo, path);

        let response = self.client.get(url).send().await?;
        self.rate_limiter.update_from_response(&response);

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GitHubApi(format!(
                "Failed to list contents of '{}': {} - {}",
                path, status, body
            )));
        }

        Ok(response.json().await?)
    }

    /// Text of a single file, or `None` when it is missing, not a regular
    /// file, or cannot be decoded.
    pub async fn get_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<Option<String>> {
        let url = self.contents_url(owner, repo, path)?;

        let response = self.client.get(url).send().await?;
        self.rate_limiter.update_from_response(&response);

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GitHubApi(format!(
                "Failed to fetch file '{}': {} - {}",
                path, status, body
            )));
        }

        // Directory paths answer with a JSON array.
        let payload: serde_json::Value = response.json().await?;
        if payload.is_array() {
            return Ok(None);
        }

        let file: FileContentResponse = serde_json::from_value(payload)?;
        if file.kind != EntryKind::File {
            return Ok(None);
        }

        if file.encoding.as_deref().is_some_and(|e| e != "base64") {
            tracing::debug!("Skipping {} with encoding {:?}", path, file.encoding);
            return Ok(None);
        }

        let Some(encoded) = file.content.filter(|c| !c.is_empty()) else {
            return Ok(None);
        };

        let decoded = decode_content(&encoded);
        if decoded.is_none() {
            tracing::warn!("Could not decode content of {}/{}:{}", owner, repo, path);
        }
        Ok(decoded)
    }

    pub async fn get_repo_languages(&self, owner: &str, repo: &str) -> Result<LanguageStats> {
        let url = format!("{}/repos/{}/{}/languages", self.base_url, owner, repo);

        let response = self.client.get(&url).send().await?;
        self.rate_limiter.update_from_response(&response);

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::GitHubApi(format!(
                "Failed to fetch languages for {}/{}: {}",
                owner, repo, status
            )));
        }

        Ok(response.json().await?)
    }

    pub async fn get_readme(&self, owner: &str, repo: &str) -> Result<Option<ReadmeFile>> {
        for candidate in README_CANDIDATES {
            match self.get_file_content(owner, repo, candidate).await {
                Ok(Some(content)) if !content.is_empty() => {
                    tracing::debug!("Found {} in {}/{}", candidate, owner, repo);
                    return Ok(Some(ReadmeFile {
                        filename: candidate.to_string(),
                        content,
                    }));
                }
                Ok(_) => continue,
                Err(e) => {
                    tracing::debug!("README candidate {} failed: {}", candidate, e);
                    continue;
                }
            }
        }
        Ok(None)
    }

    pub async fn get_manifests(&self, owner: &str, repo: &str) -> Result<Vec<ManifestFile>> {
        let mut manifests = Vec::new();
        for filename in MANIFEST_FILES {
            match self.get_file_content(owner, repo, filename).await {
                Ok(Some(content)) if !content.is_empty() => manifests.push(ManifestFile {
                    filename: filename.to_string(),
                    content,
                }),
                Ok(_) => {}
                Err(e) => tracing::debug!("Manifest {} skipped: {}", filename, e),
            }
        }
        tracing::debug!("Found {} manifest files in {}/{}", manifests.len(), owner, repo);
        Ok(manifests)
    }

    /// Directory tree down to `max_depth` levels, pruning well-known
    /// non-source directories.
    pub async fn get_tree(
        &self,
        owner: &str,
        repo: &str,
        max_depth: usize,
    ) -> Result<Vec<FileNode>> {
        if max_depth == 0 {
            return Ok(Vec::new());
        }
        let root = self.get_contents(owner, repo, "").await?;
        Ok(self.walk(owner, repo, root, max_depth, 0).await)
    }

    fn walk<'a>(
        &'a self,
        owner: &'a str,
        repo: &'a str,
        entries: Vec<ContentEntry>,
        max_depth: usize,
        depth: usize,
    ) -> BoxFuture<'a, Vec<FileNode>> {
        Box::pin(async move {
            if depth >= max_depth {
                return Vec::new();
            }

            let mut nodes = Vec::with_capacity(entries.len());
            for entry in entries {
                let descend = entry.kind == EntryKind::Dir
                    && depth + 1 < max_depth
                    && !should_skip_directory(&entry.name);
                let path = entry.path.clone();
                let mut node = FileNode::from(entry);

                if descend {
                    let children = match self.get_contents(owner, repo, &path).await {
                        Ok(sub_entries) => {
                            self.walk(owner, repo, sub_entries, max_depth, depth + 1).await
                        }
                        Err(e) => {
                            tracing::warn!("Failed to get contents for {}: {}", path, e);
                            Vec::new()
                        }
                    };
                    node.children = Some(children);
                }

                nodes.push(node);
            }
            nodes
        })
    }

    pub async fn get_rate_limit(&self) -> Result<RateLimitSnapshot> {
        let url = format!("{}/rate_limit", self.base_url);

        let response = self.client.get(&url).send().await?;
        self.rate_limiter.update_from_response(&response);

        if !response.status().is_success() {
            return Err(Error::GitHubApi(format!(
                "Rate limit probe failed: {}",
                response.status()
            )));
        }

        let body: RateLimitResponse = response.json().await?;
        let core = body.resources.core;
        Ok(RateLimitSnapshot {
            limit: Some(core.limit),
            remaining: Some(core.remaining),
            reset_at: chrono::DateTime::from_timestamp(core.reset, 0),
        })
    }
}

fn rate_limit_message(snapshot: &RateLimitSnapshot) -> String {
    match snapshot.reset_at {
        Some(reset_at) => format!(
            "quota resets at {}. Add a GITHUB_TOKEN or try again later.",
            reset_at.format("%Y-%m-%d %H:%M:%S UTC")
        ),
        None => "Add a GITHUB_TOKEN or try again later.".to_string(),
    }
}

#[async_trait]
impl RepositoryHost for GitHubClient {
    async fn get_repository(&self, coords: &RepoCoordinates) -> Result<RepositoryInfo> {
        GitHubClient::get_repository(self, &coords.owner, &coords.repo).await
    }

    async fn get_languages(&self, coords: &RepoCoordinates) -> Result<LanguageStats> {
        self.get_repo_languages(&coords.owner, &coords.repo).await
    }

    async fn get_readme(&self, coords: &RepoCoordinates) -> Result<Option<ReadmeFile>> {
        GitHubClient::get_readme(self, &coords.owner, &coords.repo).await
    }

    async fn get_manifests(&self, coords: &RepoCoordinates) -> Result<Vec<ManifestFile>> {
        GitHubClient::get_manifests(self, &coords.owner, &coords.repo).await
    }

    async fn get_tree(&self, coords: &RepoCoordinates, max_depth: usize) -> Result<Vec<FileNode>> {
        GitHubClient::get_tree(self, &coords.owner, &coords.repo, max_depth).await
    }

    async fn check_availability(&self) -> Result<RateLimitSnapshot> {
        self.get_rate_limit().await
    }

    fn name(&self) -> &str {
        "github"
    }
}
