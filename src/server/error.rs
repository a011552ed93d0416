use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_id: Option<Uuid>,
}

/// Library errors rendered as JSON responses.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        ApiError(Error::InvalidInput(message.into()))
    }

    pub fn status(&self) -> StatusCode {
        match self.0.root() {
            Error::InvalidInput(_) | Error::InvalidUrl(_) | Error::UnsupportedFormat(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::RepoNotFound(_) | Error::AnalysisNotFound(_) => StatusCode::NOT_FOUND,
            Error::AuthRequired(_) => StatusCode::UNAUTHORIZED,
            Error::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            Error::NoModelAvailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self.0.root() {
            Error::InvalidInput(_) => "invalid_input",
            Error::InvalidUrl(_) => "invalid_url",
            Error::UnsupportedFormat(_) => "unsupported_format",
            Error::RepoNotFound(_) => "repository_not_found",
            Error::AnalysisNotFound(_) => "analysis_not_found",
            Error::AuthRequired(_) => "authentication_required",
            Error::RateLimited(_) => "rate_limited",
            Error::NoModelAvailable(_) => "no_model_available",
            Error::GitHubApi(_) | Error::Network(_) => "upstream_error",
            Error::ExportFailed(_) => "export_failed",
            _ => "internal_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let analysis_id = match &self.0 {
            Error::AnalysisFailed { analysis_id, .. } => Some(*analysis_id),
            _ => None,
        };

        if status.is_server_error() {
            tracing::error!(status = %status, "Request failed: {}", self.0);
        } else {
            tracing::debug!(status = %status, "Request rejected: {}", self.0);
        }

        let body = ErrorBody {
            error: self.code(),
            message: self.0.root().to_string(),
            analysis_id,
        };

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;
