#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use repoinsight::github::RateLimitSnapshot;
use repoinsight::models::{
    EntryKind, FileNode, LanguageStats, ManifestFile, ReadmeFile, RepoCoordinates, RepositoryInfo,
    RepositoryOwner,
};
use repoinsight::{
    AnalysisPipeline, Error, ExportStore, InsightGenerator, LLMProvider, PipelineConfig,
    RepositoryHost, Result, Storage,
};

/// In-memory stand-in for GitHub.
pub struct FakeHost {
    pub info: Option<RepositoryInfo>,
    pub languages: LanguageStats,
    pub readme: Option<ReadmeFile>,
    pub manifests: Vec<ManifestFile>,
    pub tree: Vec<FileNode>,
    pub metadata_calls: AtomicUsize,
}

impl FakeHost {
    /// A small repository resembling octocat/Hello-World.
    pub fn hello_world() -> Self {
        let mut languages = LanguageStats::new();
        languages.insert("JavaScript".to_string(), 4200);
        languages.insert("CSS".to_string(), 800);

        Self {
            info: Some(RepositoryInfo {
                name: "Hello-World".to_string(),
                full_name: "octocat/Hello-World".to_string(),
                owner: RepositoryOwner {
                    login: "octocat".to_string(),
                },
                description: Some("My first repository on GitHub!".to_string()),
                stargazers_count: 2500,
                forks_count: 1900,
                language: Some("JavaScript".to_string()),
                topics: vec!["demo".to_string()],
                ..Default::default()
            }),
            languages,
            readme: Some(ReadmeFile {
                filename: "README.md".to_string(),
                content: "# Hello World\n\nA greeting app.\n\nRun `npm start` to begin.\n"
                    .to_string(),
            }),
            manifests: vec![ManifestFile {
                filename: "package.json".to_string(),
                content: r#"{"name":"hello","dependencies":{"express":"^4.18.0"}}"#.to_string(),
            }],
            tree: vec![
                file("README.md"),
                file("package.json"),
                dir("src", vec![file("src/index.js"), file("src/style.css")]),
                dir("tests", vec![file("tests/index.test.js")]),
            ],
            metadata_calls: AtomicUsize::new(0),
        }
    }

    /// A repository with metadata only.
    pub fn bare() -> Self {
        let mut host = Self::hello_world();
        host.readme = None;
        host.manifests = Vec::new();
        host.tree = Vec::new();
        host.languages = LanguageStats::new();
        host
    }

    /// Every metadata lookup answers 404.
    pub fn missing() -> Self {
        let mut host = Self::hello_world();
        host.info = None;
        host
    }

    pub fn metadata_calls(&self) -> usize {
        self.metadata_calls.load(Ordering::SeqCst)
    }
}

pub fn file(path: &str) -> FileNode {
    FileNode {
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        path: path.to_string(),
        kind: EntryKind::File,
        size: 128,
        download_url: None,
        children: None,
    }
}

pub fn dir(path: &str, children: Vec<FileNode>) -> FileNode {
    FileNode {
        name: path.rsplit('/').next().unwrap_or(path).to_string(),
        path: path.to_string(),
        kind: EntryKind::Dir,
        size: 0,
        download_url: None,
        children: Some(children),
    }
}

#[async_trait]
impl RepositoryHost for FakeHost {
    async fn get_repository(&self, coords: &RepoCoordinates) -> Result<RepositoryInfo> {
        self.metadata_calls.fetch_add(1, Ordering::SeqCst);
        self.info
            .clone()
            .ok_or_else(|| Error::RepoNotFound(coords.full_name()))
    }

    async fn get_languages(&self, _coords: &RepoCoordinates) -> Result<LanguageStats> {
        Ok(self.languages.clone())
    }

    async fn get_readme(&self, _coords: &RepoCoordinates) -> Result<Option<ReadmeFile>> {
        Ok(self.readme.clone())
    }

    async fn get_manifests(&self, _coords: &RepoCoordinates) -> Result<Vec<ManifestFile>> {
        Ok(self.manifests.clone())
    }

    async fn get_tree(
        &self,
        _coords: &RepoCoordinates,
        _max_depth: usize,
    ) -> Result<Vec<FileNode>> {
        Ok(self.tree.clone())
    }

    async fn check_availability(&self) -> Result<RateLimitSnapshot> {
        Ok(RateLimitSnapshot {
            limit: Some(60),
            remaining: Some(59),
            reset_at: None,
        })
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Language model that answers every prompt from a fixed script.
pub struct CannedLLM;

#[async_trait]
impl LLMProvider for CannedLLM {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if prompt.starts_with("Analyze this repository's technology stack") {
            Ok(r#"```json
{"primary_languages": ["JavaScript"], "frameworks": ["Express"], "package_managers": ["npm"]}
```"#
                .to_string())
        } else if prompt.starts_with("Generate comprehensive setup") {
            Ok("1. Clone the repository\n2. Run npm install\n3. Run npm start".to_string())
        } else {
            Ok("Hello-World is a minimal greeting app.".to_string())
        }
    }

    fn model(&self) -> &str {
        "canned-model"
    }

    fn name(&self) -> &str {
        "Canned"
    }
}

pub struct Harness {
    pub pipeline: AnalysisPipeline,
    pub host: Arc<FakeHost>,
    pub dir: TempDir,
}

pub fn harness(host: FakeHost, insights: InsightGenerator, eager_exports: bool) -> Harness {
    let dir = tempfile::tempdir().unwrap();
    let host = Arc::new(host);
    let pipeline = AnalysisPipeline::new(
        host.clone(),
        insights,
        Storage::in_memory().unwrap(),
        ExportStore::new(dir.path()),
        PipelineConfig {
            max_tree_depth: 3,
            eager_exports,
        },
    );
    Harness {
        pipeline,
        host,
        dir,
    }
}

pub fn offline(host: FakeHost) -> Harness {
    harness(host, InsightGenerator::offline(), false)
}

pub fn with_model(host: FakeHost) -> Harness {
    harness(host, InsightGenerator::new(Some(Arc::new(CannedLLM))), false)
}
