use async_trait::async_trait;

use crate::error::Result;
use crate::github::rate_limiter::RateLimitSnapshot;
use crate::models::{
    FileNode, LanguageStats, ManifestFile, ReadmeFile, RepoCoordinates, RepositoryInfo,
};

/// The code-hosting operations the analysis pipeline depends on.
#[async_trait]
pub trait RepositoryHost: Send + Sync {
    /// Core metadata. The only call whose failure aborts an analysis.
    async fn get_repository(&self, coords: &RepoCoordinates) -> Result<RepositoryInfo>;

    async fn get_languages(&self, coords: &RepoCoordinates) -> Result<LanguageStats>;

    /// First README variant that exists, if any.
    async fn get_readme(&self, coords: &RepoCoordinates) -> Result<Option<ReadmeFile>>;

    /// Known dependency manifests present at the repository root.
    async fn get_manifests(&self, coords: &RepoCoordinates) -> Result<Vec<ManifestFile>>;

    async fn get_tree(&self, coords: &RepoCoordinates, max_depth: usize) -> Result<Vec<FileNode>>;

    /// Cheap liveness probe used by health checks.
    async fn check_availability(&self) -> Result<RateLimitSnapshot>;

    fn name(&self) -> &str;
}
