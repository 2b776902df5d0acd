use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    middleware::request_id::RequestId,
    models::{
        AnalysisInput, AnalysisResult, AnalysisRunSummary, ProjectionFilter, ProjectionView,
        SyncSummary,
    },
    services::{analysis, recommendation, sync},
};

use super::extract::{ApiJson, ApiPath, ApiQuery};
use super::AppState;

/// Upper bound on projections returned by one listing
const MAX_LIST_LIMIT: usize = 500;

// Request types

#[derive(Debug, Deserialize)]
pub struct BatchAnalysisRequest {
    pub items: Vec<AnalysisInput>,
}

#[derive(Debug, Deserialize)]
pub struct SyncQuery {
    pub league: Option<String>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Runs the recommendation engine on a single line
pub async fn analyze(ApiJson(input): ApiJson<AnalysisInput>) -> Json<AnalysisResult> {
    Json(recommendation::analyze(input.line_score, &input.stats))
}

/// Runs the recommendation engine on each item, in order
pub async fn analyze_batch(
    Extension(request_id): Extension<RequestId>,
    ApiJson(request): ApiJson<BatchAnalysisRequest>,
) -> Json<Vec<AnalysisResult>> {
    tracing::debug!(
        request_id = %request_id,
        items = request.items.len(),
        "Processing batch analysis request"
    );

    Json(recommendation::analyze_batch(&request.items))
}

/// Lists stored projections with their current analyses
pub async fn list_projections(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<ProjectionFilter>,
) -> AppResult<Json<Vec<ProjectionView>>> {
    if filter.min_confidence.is_some_and(|c| c > 100) {
        return Err(AppError::InvalidInput(
            "min_confidence must be between 0 and 100".to_string(),
        ));
    }

    let filter = ProjectionFilter {
        limit: Some(filter.limit().min(MAX_LIST_LIMIT)),
        ..filter
    };

    let views = state.store.list_projections(&filter).await?;
    Ok(Json(views))
}

/// Fetches one projection with its current analysis
pub async fn get_projection(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> AppResult<Json<ProjectionView>> {
    state
        .store
        .get_projection(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Projection {} not found", id)))
}

/// Pulls the upstream projection feed into the store
pub async fn sync_projections(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    ApiQuery(query): ApiQuery<SyncQuery>,
) -> AppResult<Json<SyncSummary>> {
    tracing::info!(
        request_id = %request_id,
        league = ?query.league,
        "Processing projection sync request"
    );

    let summary = sync::sync_projections(
        state.projection_source.clone(),
        state.store.clone(),
        query.league.as_deref(),
    )
    .await?;

    Ok(Json(summary))
}

/// Analyzes pending projections once
pub async fn run_analysis(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
) -> AppResult<Json<AnalysisRunSummary>> {
    tracing::info!(request_id = %request_id, "Processing analysis run request");

    let summary = analysis::analyze_pending(
        state.store.clone(),
        state.stats_provider.clone(),
        state.analysis_batch_limit,
        state.analysis_concurrency,
    )
    .await?;

    tracing::info!(
        request_id = %request_id,
        analyzed = summary.analyzed,
        "Analysis run completed"
    );

    Ok(Json(summary))
}
