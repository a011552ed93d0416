//! Rendering of completed analyses into downloadable documents.

pub mod docx;
pub mod markdown;
pub mod pdf;
pub mod report;
pub mod text;

use crate::error::Result;
use crate::models::{Analysis, ExportFormat};

pub use report::Report;

#[derive(Debug, Clone)]
pub struct RenderedExport {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

fn sanitize_component(value: &str) -> String {
    value
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// `<repo>_<owner>_analysis.<ext>`, stable for a given record and format.
pub fn export_filename(analysis: &Analysis, format: ExportFormat) -> String {
    format!(
        "{}_{}_analysis.{}",
        sanitize_component(&analysis.repository_name),
        sanitize_component(&analysis.owner),
        format.as_str()
    )
}

/// Pure function from an analysis record to document bytes. Never touches
/// the network or the filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExportRenderer;

impl ExportRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, analysis: &Analysis, format: ExportFormat) -> Result<RenderedExport> {
        let report = Report::from_analysis(analysis);
        let bytes = match format {
            ExportFormat::Markdown => markdown::render(&report).into_bytes(),
            ExportFormat::Text => text::render(&report).into_bytes(),
            ExportFormat::Pdf => pdf::render(&report)?,
            ExportFormat::Docx => docx::render(&report)?,
        };

        tracing::debug!(
            analysis_id = %analysis.id,
            format = %format,
            bytes = bytes.len(),
            "Rendered export"
        );

        Ok(RenderedExport {
            filename: export_filename(analysis, format),
            content_type: format.content_type(),
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        Derived, FallbackReason, FileBreakdown, FileStructure, Insights, LanguageStats,
        RepoCoordinates, TechStack,
    };

    fn completed_analysis() -> Analysis {
        let mut analysis = Analysis::new(&RepoCoordinates::new("octocat", "Hello-World"));
        analysis.description = Some("My first repository on GitHub!".to_string());
        analysis.stars = 42;
        analysis.insights = Some(Insights::new(
            Derived::from_model("A tiny demo repository.".to_string(), "gemini-2.5-flash"),
            Derived::fallback(
                TechStack {
                    primary_languages: vec!["Rust".to_string()],
                    ..Default::default()
                },
                FallbackReason::ModelUnavailable,
            ),
            Derived::from_model("1. Clone\n2. Run".to_string(), "gemini-2.5-flash"),
        ));
        let mut languages = LanguageStats::new();
        languages.insert("Rust".to_string(), 1024);
        analysis.file_structure = Some(FileStructure {
            tree: Vec::new(),
            breakdown: FileBreakdown {
                important_files: vec!["Cargo.toml".to_string()],
                ..Default::default()
            },
            languages,
            total_files: 1,
        });
        analysis.mark_completed();
        analysis
    }

    #[test]
    fn test_filename_pattern() {
        let analysis = completed_analysis();
        assert_eq!(
            export_filename(&analysis, ExportFormat::Markdown),
            "Hello-World_octocat_analysis.md"
        );
        assert_eq!(
            export_filename(&analysis, ExportFormat::Docx),
            "Hello-World_octocat_analysis.docx"
        );
    }

    #[test]
    fn test_text_formats_are_deterministic() {
        let analysis = completed_analysis();
        let renderer = ExportRenderer::new();
        for format in [ExportFormat::Markdown, ExportFormat::Text] {
            let first = renderer.render(&analysis, format).unwrap();
            let second = renderer.render(&analysis, format).unwrap();
            assert_eq!(first.filename, second.filename);
            assert_eq!(first.bytes, second.bytes);
        }
    }

    #[test]
    fn test_markdown_contains_all_sections() {
        let analysis = completed_analysis();
        let md = ExportRenderer::new()
            .render(&analysis, ExportFormat::Markdown)
            .unwrap();
        let md = String::from_utf8(md.bytes).unwrap();
        for heading in [
            "## Repository Overview",
            "## Summary",
            "## Technology Stack",
            "## Setup Instructions",
            "## Languages",
            "## File Structure",
            "## Notes",
        ] {
            assert!(md.contains(heading), "missing {}", heading);
        }
        assert!(md.contains("Generated by gemini-2.5-flash."));
        assert!(md.contains("Derived locally (language model unavailable)."));
    }

    #[test]
    fn test_binary_formats_have_expected_magic() {
        let analysis = completed_analysis();
        let renderer = ExportRenderer::new();

        let pdf = renderer.render(&analysis, ExportFormat::Pdf).unwrap();
        assert!(pdf.bytes.starts_with(b"%PDF"));
        assert_eq!(pdf.content_type, "application/pdf");

        let docx = renderer.render(&analysis, ExportFormat::Docx).unwrap();
        assert!(docx.bytes.starts_with(b"PK"));
    }
}
