use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::repository::{FileNode, LanguageStats, RepoCoordinates, RepositorySnapshot};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    Processing,
    Completed,
    Failed,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for AnalysisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "processing" => Ok(AnalysisStatus::Processing),
            "completed" => Ok(AnalysisStatus::Completed),
            "failed" => Ok(AnalysisStatus::Failed),
            other => Err(Error::InvalidInput(format!(
                "unknown status '{}', expected processing, completed or failed",
                other
            ))),
        }
    }
}

/// How an analyze request treats earlier results for the same repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisMode {
    /// Return the latest completed analysis if one exists.
    #[default]
    Reuse,
    /// Discard earlier analyses and start over.
    Fresh,
}

/// One persisted attempt to analyze a repository.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub id: Uuid,
    pub repository_url: String,
    pub owner: String,
    pub repository_name: String,
    pub status: AnalysisStatus,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub repository_data: Option<RepositorySnapshot>,
    pub insights: Option<Insights>,
    pub file_structure: Option<FileStructure>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Analysis {
    pub fn new(coords: &RepoCoordinates) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            repository_url: coords.canonical_url(),
            owner: coords.owner.clone(),
            repository_name: coords.repo.clone(),
            status: AnalysisStatus::Processing,
            description: None,
            language: None,
            stars: 0,
            forks: 0,
            repository_data: None,
            insights: None,
            file_structure: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repository_name)
    }

    pub fn is_completed(&self) -> bool {
        self.status == AnalysisStatus::Completed
    }

    pub fn mark_completed(&mut self) {
        self.status = AnalysisStatus::Completed;
        self.error_message = None;
        self.updated_at = Utc::now();
    }

    pub fn mark_failed(&mut self, message: impl Into<String>) {
        self.status = AnalysisStatus::Failed;
        self.error_message = Some(message.into());
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechStack {
    #[serde(default)]
    pub primary_languages: Vec<String>,
    #[serde(default)]
    pub frameworks: Vec<String>,
    #[serde(default)]
    pub databases: Vec<String>,
    #[serde(default)]
    pub tools_and_services: Vec<String>,
    #[serde(default)]
    pub deployment: Vec<String>,
    #[serde(default)]
    pub testing: Vec<String>,
    #[serde(default)]
    pub build_tools: Vec<String>,
    #[serde(default)]
    pub package_managers: Vec<String>,
    #[serde(default)]
    pub development_tools: Vec<String>,
    #[serde(default)]
    pub api_technologies: Vec<String>,
}

impl TechStack {
    /// Display label and entries for every category, in a fixed order.
    pub fn categories(&self) -> [(&'static str, &[String]); 10] {
        [
            ("Primary Languages", self.primary_languages.as_slice()),
            ("Frameworks", self.frameworks.as_slice()),
            ("Databases", self.databases.as_slice()),
            ("Tools & Services", self.tools_and_services.as_slice()),
            ("Deployment", self.deployment.as_slice()),
            ("Testing", self.testing.as_slice()),
            ("Build Tools", self.build_tools.as_slice()),
            ("Package Managers", self.package_managers.as_slice()),
            ("Development Tools", self.development_tools.as_slice()),
            ("API Technologies", self.api_technologies.as_slice()),
        ]
    }

    pub fn is_empty(&self) -> bool {
        self.categories().iter().all(|(_, items)| items.is_empty())
    }
}

/// Why a value was produced locally instead of by the language model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum FallbackReason {
    ModelUnavailable,
    RequestFailed(String),
    MalformedResponse(String),
}

impl std::fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FallbackReason::ModelUnavailable => write!(f, "language model unavailable"),
            FallbackReason::RequestFailed(detail) => write!(f, "model request failed: {}", detail),
            FallbackReason::MalformedResponse(detail) => {
                write!(f, "model response could not be parsed: {}", detail)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DerivationSource {
    Model { model: String },
    Heuristic { fallback: FallbackReason },
}

/// A derived value tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Derived<T> {
    pub value: T,
    pub source: DerivationSource,
}

impl<T> Derived<T> {
    pub fn from_model(value: T, model: impl Into<String>) -> Self {
        Self {
            value,
            source: DerivationSource::Model {
                model: model.into(),
            },
        }
    }

    pub fn fallback(value: T, reason: FallbackReason) -> Self {
        Self {
            value,
            source: DerivationSource::Heuristic { fallback: reason },
        }
    }

    pub fn is_model_derived(&self) -> bool {
        matches!(self.source, DerivationSource::Model { .. })
    }

    pub fn fallback_reason(&self) -> Option<&FallbackReason> {
        match &self.source {
            DerivationSource::Heuristic { fallback } => Some(fallback),
            DerivationSource::Model { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub summary: Derived<String>,
    pub tech_stack: Derived<TechStack>,
    pub setup_instructions: Derived<String>,
    /// Set when any insight had to fall back to local heuristics.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Insights {
    pub fn new(
        summary: Derived<String>,
        tech_stack: Derived<TechStack>,
        setup_instructions: Derived<String>,
    ) -> Self {
        let reasons: Vec<String> = [
            ("summary", summary.fallback_reason()),
            ("tech stack", tech_stack.fallback_reason()),
            ("setup instructions", setup_instructions.fallback_reason()),
        ]
        .into_iter()
        .filter_map(|(what, reason)| reason.map(|r| format!("{}: {}", what, r)))
        .collect();

        let error = if reasons.is_empty() {
            None
        } else {
            Some(format!(
                "AI analysis partially unavailable ({})",
                reasons.join("; ")
            ))
        };

        Self {
            summary,
            tech_stack,
            setup_instructions,
            error,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileBreakdown {
    pub directories: Vec<String>,
    pub important_files: Vec<String>,
    pub config_files: Vec<String>,
    pub documentation: Vec<String>,
    pub source_code: Vec<String>,
    pub tests: Vec<String>,
    pub assets: Vec<String>,
}

impl FileBreakdown {
    pub fn buckets(&self) -> [(&'static str, &[String]); 7] {
        [
            ("Directories", self.directories.as_slice()),
            ("Important Files", self.important_files.as_slice()),
            ("Configuration", self.config_files.as_slice()),
            ("Documentation", self.documentation.as_slice()),
            ("Source Code", self.source_code.as_slice()),
            ("Tests", self.tests.as_slice()),
            ("Assets", self.assets.as_slice()),
        ]
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileStructure {
    pub tree: Vec<FileNode>,
    pub breakdown: FileBreakdown,
    #[serde(default)]
    pub languages: LanguageStats,
    pub total_files: usize,
}
