//! Player stats provider abstraction
//!
//! A provider turns a (player, league, stat type) query into a [`StatsSummary`] for the
//! recommendation engine. Where the numbers come from (a stats API, a database, or a
//! generative model) is up to the implementation; all of them satisfy the same contract.
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    models::{StatsQuery, StatsSummary},
};

pub mod llm;

pub use llm::LlmStatsProvider;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait StatsProvider: Send + Sync {
    /// Fetches the recent performance summary for one query
    ///
    /// A player with no usable history is not an error: providers return a summary
    /// without data and the engine answers with a skip.
    async fn fetch_stats(&self, query: &StatsQuery) -> AppResult<StatsSummary>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Fetches stats for many queries, `concurrency` at a time
///
/// Each chunk of queries runs in parallel tasks and the next chunk starts only once the
/// previous one has finished, keeping the number of in-flight upstream calls bounded.
/// Results line up with `queries` by index; one failure never affects another item.
pub async fn fetch_stats_batch(
    provider: Arc<dyn StatsProvider>,
    queries: Vec<StatsQuery>,
    concurrency: usize,
) -> Vec<AppResult<StatsSummary>> {
    let concurrency = concurrency.max(1);
    let mut results = Vec::with_capacity(queries.len());

    for chunk in queries.chunks(concurrency) {
        let tasks: Vec<_> = chunk
            .iter()
            .cloned()
            .map(|query| {
                let provider = provider.clone();
                tokio::spawn(async move { provider.fetch_stats(&query).await })
            })
            .collect();

        for task in tasks {
            let result = match task.await {
                Ok(result) => result,
                Err(e) => {
                    tracing::error!(error = %e, "Stats task join error");
                    Err(AppError::Internal(e.to_string()))
                }
            };
            results.push(result);
        }
    }

    let error_count = results.iter().filter(|r| r.is_err()).count();
    if error_count > 0 {
        tracing::warn!(
            provider = provider.name(),
            success_count = results.len() - error_count,
            error_count,
            "Partial stats fetch failure"
        );
    }

    results
}
