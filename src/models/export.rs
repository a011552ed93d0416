use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExportFormat {
    #[serde(rename = "md")]
    Markdown,
    #[serde(rename = "txt")]
    Text,
    #[serde(rename = "pdf")]
    Pdf,
    #[serde(rename = "docx")]
    Docx,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Markdown,
        ExportFormat::Text,
        ExportFormat::Pdf,
        ExportFormat::Docx,
    ];

    /// The token used in URLs, the database and file extensions.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "md",
            ExportFormat::Text => "txt",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Docx => "docx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "text/markdown",
            ExportFormat::Text => "text/plain",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Markdown => "Markdown",
            ExportFormat::Text => "Plain Text",
            ExportFormat::Pdf => "PDF",
            ExportFormat::Docx => "Word Document",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "md" => Ok(ExportFormat::Markdown),
            "txt" => Ok(ExportFormat::Text),
            "pdf" => Ok(ExportFormat::Pdf),
            "docx" => Ok(ExportFormat::Docx),
            other => Err(Error::UnsupportedFormat(other.to_string())),
        }
    }
}

/// A rendered export tracked in the database. The bytes live on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportFile {
    pub id: Uuid,
    pub analysis_id: Uuid,
    pub format: ExportFormat,
    pub filename: String,
    pub file_size: u64,
    pub created_at: DateTime<Utc>,
}

impl ExportFile {
    pub fn new(analysis_id: Uuid, format: ExportFormat, filename: String, file_size: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            analysis_id,
            format,
            filename,
            file_size,
            created_at: Utc::now(),
        }
    }

    pub fn download_path(&self) -> String {
        format!("/api/download/{}/{}", self.format, self.analysis_id)
    }
}
