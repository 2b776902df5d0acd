use std::sync::Arc;

use crate::{
    db::ProjectionStore,
    services::{ProjectionSource, StatsProvider},
};

const DEFAULT_ANALYSIS_CONCURRENCY: usize = 5;
const DEFAULT_ANALYSIS_BATCH_LIMIT: usize = 50;

/// Shared application state
///
/// Every collaborator is constructed by the caller and injected here, so handlers never
/// reach for a global client.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ProjectionStore>,
    pub stats_provider: Arc<dyn StatsProvider>,
    pub projection_source: Arc<dyn ProjectionSource>,
    pub analysis_concurrency: usize,
    pub analysis_batch_limit: usize,
}

impl AppState {
    pub fn new(
        store: Arc<dyn ProjectionStore>,
        stats_provider: Arc<dyn StatsProvider>,
        projection_source: Arc<dyn ProjectionSource>,
    ) -> Self {
        Self {
            store,
            stats_provider,
            projection_source,
            analysis_concurrency: DEFAULT_ANALYSIS_CONCURRENCY,
            analysis_batch_limit: DEFAULT_ANALYSIS_BATCH_LIMIT,
        }
    }

    /// Overrides how many stats fetches run at once and how many projections a run takes
    pub fn with_analysis_settings(mut self, concurrency: usize, batch_limit: usize) -> Self {
        self.analysis_concurrency = concurrency.max(1);
        self.analysis_batch_limit = batch_limit;
        self
    }
}
