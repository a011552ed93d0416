use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid GitHub repository URL: {0}")]
    InvalidUrl(String),

    #[error("Unsupported export format '{0}'. Supported formats: md, txt, pdf, docx")]
    UnsupportedFormat(String),

    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    #[error("{0}")]
    AuthRequired(String),

    #[error("GitHub API rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("Repository '{0}' not found. Please check the repository URL and make sure it exists.")]
    RepoNotFound(String),

    #[error("Analysis {0} not found")]
    AnalysisNotFound(Uuid),

    #[error("LLM API error: {0}")]
    LLMApi(String),

    #[error("No working Gemini model found. Last error: {0}")]
    NoModelAvailable(String),

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Export failed: {0}")]
    ExportFailed(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Analysis {analysis_id} failed: {source}")]
    AnalysisFailed {
        analysis_id: Uuid,
        #[source]
        source: Box<Error>,
    },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::RateLimited(_) | Error::Network(_) => true,
            Error::AnalysisFailed { source, .. } => source.is_retryable(),
            _ => false,
        }
    }

    /// Errors that reject the caller's request rather than indicate a fault.
    pub fn is_invalid_input(&self) -> bool {
        match self {
            Error::InvalidInput(_) | Error::InvalidUrl(_) | Error::UnsupportedFormat(_) => true,
            Error::AnalysisFailed { source, .. } => source.is_invalid_input(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            Error::RepoNotFound(_) | Error::AnalysisNotFound(_) => true,
            Error::AnalysisFailed { source, .. } => source.is_not_found(),
            _ => false,
        }
    }

    /// The innermost error, looking through `AnalysisFailed` wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::AnalysisFailed { source, .. } => source.root(),
            other => other,
        }
    }
}
