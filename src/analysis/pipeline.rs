use indicatif::ProgressBar;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::PipelineConfig;
use crate::error::{Error, Result};
use crate::export::ExportRenderer;
use crate::github::{parse_repository_url, RepositoryHost};
use crate::llm::{InsightGenerator, PromptContext};
use crate::models::{
    Analysis, AnalysisMode, AnalysisStatus, ExportFile, ExportFormat, FileNode, FileStructure,
    LanguageStats, RepoCoordinates, RepositorySnapshot,
};
use crate::storage::{ExportStore, Storage};
use crate::taxonomy::categorize_files;

pub const DEFAULT_LIST_LIMIT: usize = 20;
pub const MAX_LIST_LIMIT: usize = 100;

/// Bytes of an export ready to be sent to a client.
#[derive(Debug, Clone)]
pub struct Download {
    pub export: ExportFile,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceHealth {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ServiceHealth {
    fn available(detail: impl Into<String>) -> Self {
        Self {
            status: "available",
            detail: Some(detail.into()),
        }
    }

    fn unavailable(detail: impl Into<String>) -> Self {
        Self {
            status: "unavailable",
            detail: Some(detail.into()),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == "available"
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub services: BTreeMap<&'static str, ServiceHealth>,
}

/// Result of an analyze request.
#[derive(Debug, Clone)]
pub enum AnalysisOutcome {
    /// An earlier completed analysis was returned unchanged.
    Reused(Analysis),
    Created(Analysis),
}

impl AnalysisOutcome {
    pub fn is_reused(&self) -> bool {
        matches!(self, AnalysisOutcome::Reused(_))
    }

    pub fn into_analysis(self) -> Analysis {
        match self {
            AnalysisOutcome::Reused(analysis) | AnalysisOutcome::Created(analysis) => analysis,
        }
    }
}

/// Runs analyses end to end and owns their persistence.
pub struct AnalysisPipeline {
    host: Arc<dyn RepositoryHost>,
    insights: InsightGenerator,
    storage: Storage,
    exports: ExportStore,
    renderer: ExportRenderer,
    config: PipelineConfig,
    progress: ProgressBar,
}

impl AnalysisPipeline {
    pub fn new(
        host: Arc<dyn RepositoryHost>,
        insights: InsightGenerator,
        storage: Storage,
        exports: ExportStore,
        config: PipelineConfig,
    ) -> Self {
        Self {
            host,
            insights,
            storage,
            exports,
            renderer: ExportRenderer::new(),
            config,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report stage transitions on the given bar.
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    pub fn model(&self) -> Option<&str> {
        self.insights.model()
    }

    pub async fn analyze(&self, url: &str, mode: AnalysisMode) -> Result<Analysis> {
        self.submit(url, mode).await.map(AnalysisOutcome::into_analysis)
    }

    /// Like [`analyze`](Self::analyze), but reports whether the record was reused.
    pub async fn submit(&self, url: &str, mode: AnalysisMode) -> Result<AnalysisOutcome> {
        let coords = parse_repository_url(url)?;

        match mode {
            AnalysisMode::Reuse => {
                let canonical = coords.canonical_url();
                if let Some(existing) = self.storage.latest_completed_for_url(&canonical)? {
                    tracing::info!(
                        analysis_id = %existing.id,
                        "Reusing completed analysis of {}",
                        coords
                    );
                    return Ok(AnalysisOutcome::Reused(existing));
                }
            }
            AnalysisMode::Fresh => self.discard(&coords).await?,
        }

        self.run(coords).await.map(AnalysisOutcome::Created)
    }

    /// Drop every earlier analysis of the repository and start over.
    pub async fn reanalyze(&self, url: &str) -> Result<Analysis> {
        self.analyze(url, AnalysisMode::Fresh).await
    }

    async fn discard(&self, coords: &RepoCoordinates) -> Result<()> {
        let removed = self.storage.delete_by_url(&coords.canonical_url())?;
        for id in &removed {
            if let Err(e) = self.exports.remove_analysis(*id).await {
                tracing::warn!(analysis_id = %id, "Failed to remove export files: {}", e);
            }
        }
        if !removed.is_empty() {
            tracing::info!("Removed {} earlier analyses of {}", removed.len(), coords);
        }
        Ok(())
    }

    async fn run(&self, coords: RepoCoordinates) -> Result<Analysis> {
        let mut analysis = Analysis::new(&coords);
        self.storage.save_analysis(&analysis)?;
        tracing::info!(analysis_id = %analysis.id, "Started analysis of {}", coords);

        if let Err(e) = self.populate(&coords, &mut analysis).await {
            tracing::error!(
                analysis_id = %analysis.id,
                retryable = e.is_retryable(),
                "Analysis of {} failed: {}",
                coords,
                e
            );
            analysis.mark_failed(e.to_string());
            if let Err(save_err) = self.storage.save_analysis(&analysis) {
                tracing::error!(
                    analysis_id = %analysis.id,
                    "Could not record failure: {}",
                    save_err
                );
            }
            self.progress.finish_and_clear();
            return Err(Error::AnalysisFailed {
                analysis_id: analysis.id,
                source: Box::new(e),
            });
        }

        tracing::info!(analysis_id = %analysis.id, "Completed analysis of {}", coords);

        if self.config.eager_exports {
            self.progress.set_message("Rendering exports");
            for format in ExportFormat::ALL {
                if let Err(e) = self.export(analysis.id, format).await {
                    tracing::warn!(analysis_id = %analysis.id, %format, "Export failed: {}", e);
                }
            }
        }

        self.progress.finish_and_clear();
        Ok(analysis)
    }

    async fn populate(&self, coords: &RepoCoordinates, analysis: &mut Analysis) -> Result<()> {
        self.progress.set_message(format!("Fetching {}", coords));
        let info = self.host.get_repository(coords).await?;

        analysis.description = info.description.clone();
        analysis.language = info.language.clone();
        analysis.stars = info.stargazers_count;
        analysis.forks = info.forks_count;

        self.progress.set_message("Collecting languages, README, manifests and tree");
        let (languages, readme, manifests, tree) = tokio::join!(
            self.host.get_languages(coords),
            self.host.get_readme(coords),
            self.host.get_manifests(coords),
            self.host.get_tree(coords, self.config.max_tree_depth),
        );

        let languages = languages.unwrap_or_else(|e| {
            tracing::warn!("Languages unavailable for {}: {}", coords, e);
            LanguageStats::new()
        });
        let readme = readme.unwrap_or_else(|e| {
            tracing::warn!("README unavailable for {}: {}", coords, e);
            None
        });
        let manifests = manifests.unwrap_or_else(|e| {
            tracing::warn!("Manifests unavailable for {}: {}", coords, e);
            Vec::new()
        });
        let tree = tree.unwrap_or_else(|e| {
            tracing::warn!("File tree unavailable for {}: {}", coords, e);
            Vec::new()
        });

        self.progress.set_message("Generating insights");
        let insights = self
            .insights
            .generate(&PromptContext {
                info: &info,
                languages: &languages,
                readme: readme.as_ref(),
                manifests: &manifests,
                tree: &tree,
            })
            .await;

        let breakdown = categorize_files(&tree);
        let total_files = tree.iter().map(FileNode::file_count).sum();

        analysis.repository_data = Some(RepositorySnapshot {
            info,
            languages: languages.clone(),
            readme_file: readme.map(|r| r.filename),
            manifest_files: manifests.into_iter().map(|m| m.filename).collect(),
        });
        analysis.insights = Some(insights);
        analysis.file_structure = Some(FileStructure {
            tree,
            breakdown,
            languages,
            total_files,
        });

        analysis.mark_completed();
        self.storage.save_analysis(analysis)
    }

    pub fn get(&self, id: Uuid) -> Result<Analysis> {
        self.storage
            .get_analysis(id)?
            .ok_or(Error::AnalysisNotFound(id))
    }

    /// Newest first. `limit` defaults to 20 and is capped at 100.
    pub fn list(
        &self,
        limit: Option<usize>,
        status: Option<AnalysisStatus>,
    ) -> Result<(Vec<Analysis>, usize)> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        self.storage.list_analyses(limit, status)
    }

    pub fn exports(&self, id: Uuid) -> Result<Vec<ExportFile>> {
        self.get(id)?;
        self.storage.list_exports(id)
    }

    /// Render, store and record one export of a completed analysis.
    pub async fn export(&self, id: Uuid, format: ExportFormat) -> Result<ExportFile> {
        self.generate(id, format).await.map(|download| download.export)
    }

    /// Stored export bytes, generating them first when missing.
    pub async fn download(&self, id: Uuid, format: ExportFormat) -> Result<Download> {
        if let Some(export) = self.storage.get_export(id, format)? {
            match self.exports.read(id, &export.filename).await? {
                Some(bytes) => {
                    return Ok(Download {
                        export,
                        content_type: format.content_type(),
                        bytes,
                    })
                }
                None => tracing::warn!(
                    analysis_id = %id,
                    %format,
                    "Export file missing on disk, regenerating"
                ),
            }
        }

        self.generate(id, format).await
    }

    async fn generate(&self, id: Uuid, format: ExportFormat) -> Result<Download> {
        let analysis = self.get(id)?;
        if !analysis.is_completed() {
            return Err(Error::InvalidInput(format!(
                "Analysis {} is not completed (status: {})",
                id, analysis.status
            )));
        }

        let rendered = self.renderer.render(&analysis, format)?;
        self.exports.write(id, &rendered.filename, &rendered.bytes).await?;

        let export = self.storage.upsert_export(&ExportFile::new(
            id,
            format,
            rendered.filename,
            rendered.bytes.len() as u64,
        ))?;
        tracing::info!(analysis_id = %id, %format, bytes = export.file_size, "Stored export");

        Ok(Download {
            export,
            content_type: rendered.content_type,
            bytes: rendered.bytes,
        })
    }

    pub async fn health(&self) -> HealthReport {
        let mut services = BTreeMap::new();

        let github = match self.host.check_availability().await {
            Ok(snapshot) => ServiceHealth::available(match (snapshot.remaining, snapshot.limit) {
                (Some(remaining), Some(limit)) => {
                    format!("{}/{} requests remaining", remaining, limit)
                }
                _ => "reachable".to_string(),
            }),
            Err(e) => ServiceHealth::unavailable(e.to_string()),
        };
        services.insert("github", github);

        let gemini = match self.insights.model() {
            Some(model) => ServiceHealth::available(model),
            None => ServiceHealth::unavailable("no model available"),
        };
        services.insert("gemini", gemini);

        let database = match self.storage.ping() {
            Ok(()) => ServiceHealth::available("ok"),
            Err(e) => ServiceHealth::unavailable(e.to_string()),
        };
        services.insert("database", database);

        let status = if services.values().all(ServiceHealth::is_available) {
            "healthy"
        } else {
            "degraded"
        };

        HealthReport { status, services }
    }
}
