//! HTTP API over the analysis pipeline.

pub mod error;
pub mod handlers;

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::analysis::AnalysisPipeline;
use crate::error::Result;

pub use error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnalysisPipeline>,
}

impl AppState {
    pub fn new(pipeline: AnalysisPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/analyze", post(handlers::analyze))
        .route("/re-analyze", post(handlers::reanalyze))
        .route("/status/{id}", get(handlers::status))
        .route("/analysis/{id}", get(handlers::get_analysis))
        .route("/analysis/{id}/exports", get(handlers::list_exports))
        .route("/analyses", get(handlers::list_analyses))
        .route("/export/{format}/{id}", post(handlers::export))
        .route("/download/{format}/{id}", get(handlers::download))
        .route("/health", get(handlers::health))
        .route("/info", get(handlers::info));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(bind_addr: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
