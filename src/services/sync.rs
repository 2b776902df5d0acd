use std::sync::Arc;

use crate::{
    db::ProjectionStore,
    error::AppResult,
    models::SyncSummary,
    services::projections::ProjectionSource,
};

/// Pulls the current projection feed into the store
pub async fn sync_projections(
    source: Arc<dyn ProjectionSource>,
    store: Arc<dyn ProjectionStore>,
    league: Option<&str>,
) -> AppResult<SyncSummary> {
    let projections = source.fetch_projections(league).await?;

    let stored = if projections.is_empty() {
        0
    } else {
        store.upsert_projections(&projections).await?
    };

    tracing::info!(
        source = source.name(),
        league = ?league,
        fetched = projections.len(),
        stored,
        "Projection sync completed"
    );

    Ok(SyncSummary {
        fetched: projections.len(),
        stored,
    })
}
