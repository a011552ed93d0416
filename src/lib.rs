pub mod analysis;
pub mod config;
pub mod error;
pub mod export;
pub mod github;
pub mod llm;
pub mod models;
pub mod server;
pub mod storage;
pub mod taxonomy;

pub use analysis::AnalysisPipeline;
pub use config::{Config, PipelineConfig};
pub use error::{Error, Result};
pub use export::ExportRenderer;
pub use github::{GitHubClient, RepositoryHost};
pub use llm::{GeminiProvider, InsightGenerator, LLMProvider};
pub use models::{Analysis, AnalysisMode, AnalysisStatus, ExportFile, ExportFormat};
pub use storage::{ExportStore, Storage};
