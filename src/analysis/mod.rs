pub mod pipeline;

pub use pipeline::{AnalysisOutcome, AnalysisPipeline, Download, HealthReport, ServiceHealth};
