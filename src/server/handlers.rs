use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::analysis::HealthReport;
use crate::models::{Analysis, AnalysisMode, AnalysisStatus, ExportFile, ExportFormat};
use crate::server::error::{ApiError, ApiResult};
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct AnalyzeRequest {
    #[serde(default, alias = "github_url")]
    pub repository_url: Option<String>,
    #[serde(default)]
    pub mode: Option<AnalysisMode>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub limit: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub id: Uuid,
    pub status: AnalysisStatus,
    pub repository_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AnalysisSummary {
    pub id: Uuid,
    pub repository_url: String,
    pub owner: String,
    pub repository_name: String,
    pub status: AnalysisStatus,
    pub description: Option<String>,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Analysis> for AnalysisSummary {
    fn from(analysis: Analysis) -> Self {
        Self {
            id: analysis.id,
            repository_url: analysis.repository_url,
            owner: analysis.owner,
            repository_name: analysis.repository_name,
            status: analysis.status,
            description: analysis.description,
            language: analysis.language,
            stars: analysis.stars,
            forks: analysis.forks,
            error_message: analysis.error_message,
            created_at: analysis.created_at,
            updated_at: analysis.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AnalysisList {
    pub results: Vec<AnalysisSummary>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ExportResponse {
    #[serde(flatten)]
    pub export: ExportFile,
    pub download_url: String,
}

impl From<ExportFile> for ExportResponse {
    fn from(export: ExportFile) -> Self {
        let download_url = export.download_path();
        Self {
            export,
            download_url,
        }
    }
}

fn parse_id(raw: &str) -> ApiResult<Uuid> {
    Uuid::parse_str(raw)
        .map_err(|_| ApiError::invalid_input(format!("'{}' is not a valid analysis id", raw)))
}

fn repository_url(
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<(String, Option<AnalysisMode>)> {
    let Json(request) = body.map_err(|e| ApiError::invalid_input(e.body_text()))?;
    let url = request
        .repository_url
        .map(|u| u.trim().to_string())
        .filter(|u| !u.is_empty())
        .ok_or_else(|| ApiError::invalid_input("repository_url is required"))?;
    Ok((url, request.mode))
}

pub async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Analysis>)> {
    let (url, mode) = repository_url(body)?;
    let outcome = state.pipeline.submit(&url, mode.unwrap_or_default()).await?;
    let status = if outcome.is_reused() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    Ok((status, Json(outcome.into_analysis())))
}

pub async fn reanalyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Analysis>)> {
    let (url, _) = repository_url(body)?;
    let analysis = state.pipeline.reanalyze(&url).await?;
    Ok((StatusCode::CREATED, Json(analysis)))
}

pub async fn status(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<StatusResponse>> {
    let analysis = state.pipeline.get(parse_id(&id)?)?;
    Ok(Json(StatusResponse {
        id: analysis.id,
        status: analysis.status,
        repository_url: analysis.repository_url,
        created_at: analysis.created_at,
        updated_at: analysis.updated_at,
        error_message: analysis.error_message,
    }))
}

pub async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Analysis>> {
    Ok(Json(state.pipeline.get(parse_id(&id)?)?))
}

pub async fn list_exports(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ExportResponse>>> {
    let exports = state.pipeline.exports(parse_id(&id)?)?;
    Ok(Json(exports.into_iter().map(ExportResponse::from).collect()))
}

pub async fn list_analyses(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<AnalysisList>> {
    let limit = params
        .limit
        .as_deref()
        .map(|raw| {
            raw.parse::<usize>().map_err(|_| {
                ApiError::invalid_input(format!(
                    "limit must be a positive integer, got '{}'",
                    raw
                ))
            })
        })
        .transpose()?;
    let status = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<AnalysisStatus>)
        .transpose()?;

    let (analyses, count) = state.pipeline.list(limit, status)?;
    Ok(Json(AnalysisList {
        results: analyses.into_iter().map(AnalysisSummary::from).collect(),
        count,
    }))
}

pub async fn export(
    State(state): State<AppState>,
    Path((format, id)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<ExportResponse>)> {
    let format: ExportFormat = format.parse()?;
    let export = state.pipeline.export(parse_id(&id)?, format).await?;
    Ok((StatusCode::CREATED, Json(ExportResponse::from(export))))
}

pub async fn download(
    State(state): State<AppState>,
    Path((format, id)): Path<(String, String)>,
) -> ApiResult<Response> {
    let format: ExportFormat = format.parse()?;
    let download = state.pipeline.download(parse_id(&id)?, format).await?;

    Ok((
        [
            (header::CONTENT_TYPE, download.content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", download.export.filename),
            ),
        ],
        download.bytes,
    )
        .into_response())
}

pub async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(state.pipeline.health().await)
}

pub async fn info() -> Json<Value> {
    Json(json!({
        "name": "repoinsight",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Analyze public GitHub repositories and export AI-assisted reports",
        "features": [
            "Repository metadata, languages, README and dependency manifests",
            "AI-generated summary, technology stack and setup instructions",
            "File structure breakdown",
            "Exports in Markdown, plain text, PDF and Word formats"
        ],
        "supported_formats": ExportFormat::ALL
            .iter()
            .map(|f| {
                json!({
                    "format": f.as_str(),
                    "label": f.label(),
                    "content_type": f.content_type()
                })
            })
            .collect::<Vec<_>>(),
        "endpoints": {
            "analyze": "POST /api/analyze",
            "re_analyze": "POST /api/re-analyze",
            "status": "GET /api/status/{id}",
            "analysis": "GET /api/analysis/{id}",
            "exports": "GET /api/analysis/{id}/exports",
            "analyses": "GET /api/analyses?limit=&status=",
            "export": "POST /api/export/{format}/{id}",
            "download": "GET /api/download/{format}/{id}",
            "health": "GET /api/health",
            "info": "GET /api/info"
        }
    }))
}
