use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{make_span_with_request_id, request_id_middleware};

use super::handlers;
use super::AppState;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", api_routes())
        // Request id is assigned before the trace span is made
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        // Stateless engine
        .route("/analyze", post(handlers::analyze))
        .route("/analyze/batch", post(handlers::analyze_batch))
        // Stored projections
        .route("/projections", get(handlers::list_projections))
        .route("/projections/sync", post(handlers::sync_projections))
        .route("/projections/analyze", post(handlers::run_analysis))
        .route("/projections/:id", get(handlers::get_projection))
}
