use std::sync::Arc;
use std::time::Instant;

use crate::{
    db::ProjectionStore,
    error::AppResult,
    models::{AnalysisRunSummary, StatsQuery, StoredAnalysis},
    services::{
        providers::{fetch_stats_batch, StatsProvider},
        recommendation,
    },
};

/// Analyzes projections that lack a current analysis
///
/// Pulls up to `limit` pending projections, fetches their stats `concurrency` at a time,
/// runs the recommendation engine and stores each result. A failed stats fetch skips
/// that projection; a failed write is logged and counted. Neither stops the run.
pub async fn analyze_pending(
    store: Arc<dyn ProjectionStore>,
    provider: Arc<dyn StatsProvider>,
    limit: usize,
    concurrency: usize,
) -> AppResult<AnalysisRunSummary> {
    let start = Instant::now();

    let pending = store.pending_analysis(limit).await?;
    let mut summary = AnalysisRunSummary {
        considered: pending.len(),
        ..Default::default()
    };

    if pending.is_empty() {
        tracing::debug!("No projections pending analysis");
        return Ok(summary);
    }

    tracing::info!(
        pending = pending.len(),
        provider = provider.name(),
        concurrency,
        "Starting analysis run"
    );

    let queries: Vec<StatsQuery> = pending.iter().map(|p| p.stats_query()).collect();
    let stats_results = fetch_stats_batch(provider, queries, concurrency).await;

    for (projection, stats) in pending.iter().zip(stats_results) {
        let stats = match stats {
            Ok(stats) => stats,
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    projection_id = %projection.id,
                    player = %projection.player_name,
                    "Skipping projection, stats unavailable"
                );
                summary.skipped += 1;
                continue;
            }
        };

        let result = recommendation::analyze(projection.line_score, &stats);

        tracing::debug!(
            projection_id = %projection.id,
            player = %projection.player_name,
            stat_type = %projection.stat_type,
            line_score = projection.line_score,
            recommendation = %result.recommendation,
            confidence = result.confidence_score,
            "Projection analyzed"
        );

        let analysis = StoredAnalysis::new(result, projection.line_score, stats);
        match store.save_analysis(projection.id, &analysis).await {
            Ok(()) => summary.analyzed += 1,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    projection_id = %projection.id,
                    "Failed to store analysis"
                );
                summary.failed += 1;
            }
        }
    }

    tracing::info!(
        considered = summary.considered,
        analyzed = summary.analyzed,
        skipped = summary.skipped,
        failed = summary.failed,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Analysis run completed"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::InMemoryProjectionStore;
    use crate::error::AppError;
    use crate::models::{
        Consistency, Projection, ProjectionFilter, Recommendation, StatsSummary, Trend,
    };
    use crate::services::providers::MockStatsProvider;
    use chrono::Utc;
    use uuid::Uuid;

    fn projection(external_id: &str, player: &str, line_score: f64) -> Projection {
        Projection {
            id: Uuid::new_v4(),
            external_id: external_id.to_string(),
            player_name: player.to_string(),
            team: None,
            league: "NBA".to_string(),
            stat_type: "Points".to_string(),
            line_score,
            start_time: None,
            fetched_at: Utc::now(),
        }
    }

    fn strong_over_stats() -> StatsSummary {
        StatsSummary {
            recent_average: Some(25.0),
            last_5_games: vec![24.0, 26.0, 25.0, 27.0, 23.0],
            last_10_games: vec![],
            consistency: Consistency::High,
            trend: Trend::Increasing,
        }
    }

    fn mock_provider() -> MockStatsProvider {
        let mut provider = MockStatsProvider::new();
        provider.expect_fetch_stats().returning(|query| match query.player_name.as_str() {
            "Flaky Player" => Err(AppError::ExternalApi("timeout".to_string())),
            "Rookie" => Ok(StatsSummary::empty()),
            _ => Ok(strong_over_stats()),
        });
        provider.expect_name().return_const("mock");
        provider
    }

    #[tokio::test]
    async fn test_analyze_pending_stores_results_and_skips_failures() {
        let store = Arc::new(InMemoryProjectionStore::new());
        let good = projection("1", "Anthony Edwards", 20.0);
        let flaky = projection("2", "Flaky Player", 15.5);
        let rookie = projection("3", "Rookie", 8.5);
        store
            .upsert_projections(&[good.clone(), flaky.clone(), rookie.clone()])
            .await
            .unwrap();

        let summary = analyze_pending(store.clone(), Arc::new(mock_provider()), 10, 2)
            .await
            .unwrap();

        assert_eq!(
            summary,
            AnalysisRunSummary {
                considered: 3,
                analyzed: 2,
                skipped: 1,
                failed: 0,
            }
        );

        let good_view = store.get_projection(good.id).await.unwrap().unwrap();
        let analysis = good_view.analysis.unwrap();
        assert_eq!(analysis.result.recommendation, Recommendation::Over);
        assert_eq!(analysis.result.confidence_score, 90);
        assert_eq!(analysis.line_score, 20.0);

        let rookie_view = store.get_projection(rookie.id).await.unwrap().unwrap();
        let analysis = rookie_view.analysis.unwrap();
        assert_eq!(analysis.result.recommendation, Recommendation::Skip);
        assert_eq!(analysis.result.confidence_score, 0);

        // Only the failed fetch remains pending
        let pending = store.pending_analysis(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, flaky.id);
    }

    #[tokio::test]
    async fn test_analyze_pending_nothing_to_do() {
        let store = Arc::new(InMemoryProjectionStore::new());
        let mut provider = MockStatsProvider::new();
        provider.expect_fetch_stats().never();
        provider.expect_name().return_const("mock");

        let summary = analyze_pending(store, Arc::new(provider), 10, 5).await.unwrap();
        assert_eq!(summary, AnalysisRunSummary::default());
    }

    #[tokio::test]
    async fn test_analyze_pending_respects_limit() {
        let store = Arc::new(InMemoryProjectionStore::new());
        let projections: Vec<Projection> = (0..5)
            .map(|i| projection(&i.to_string(), &format!("Player {}", i), 20.0))
            .collect();
        store.upsert_projections(&projections).await.unwrap();

        let summary = analyze_pending(store.clone(), Arc::new(mock_provider()), 3, 2)
            .await
            .unwrap();
        assert_eq!(summary.considered, 3);
        assert_eq!(summary.analyzed, 3);

        let analyzed = store
            .list_projections(&ProjectionFilter {
                recommendation: Some(Recommendation::Over),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(analyzed.len(), 3);
        assert_eq!(store.pending_analysis(10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_moved_line_is_reanalyzed() {
        let store = Arc::new(InMemoryProjectionStore::new());
        let original = projection("1", "Anthony Edwards", 20.0);
        store.upsert_projections(&[original.clone()]).await.unwrap();

        analyze_pending(store.clone(), Arc::new(mock_provider()), 10, 1)
            .await
            .unwrap();
        assert!(store.pending_analysis(10).await.unwrap().is_empty());

        let moved = Projection {
            line_score: 23.0,
            ..original.clone()
        };
        store.upsert_projections(&[moved]).await.unwrap();

        let summary = analyze_pending(store.clone(), Arc::new(mock_provider()), 10, 1)
            .await
            .unwrap();
        assert_eq!(summary.analyzed, 1);

        let view = store.get_projection(original.id).await.unwrap().unwrap();
        let analysis = view.analysis.unwrap();
        assert_eq!(analysis.line_score, 23.0);
        // 25 vs 23 is an 8.7% edge
        assert_eq!(analysis.result.confidence_score, 75);
    }
}
