use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Projection, ProjectionFilter, ProjectionView, StoredAnalysis},
};

/// Persistence for projections and their analyses
///
/// Projections are keyed by their upstream `external_id`; storing one again updates its
/// line and metadata but keeps its internal id. An analysis is only current while its
/// line matches the projection's, so a moved line makes the projection pending again.
#[async_trait::async_trait]
pub trait ProjectionStore: Send + Sync {
    /// Inserts or updates projections, returning how many were written
    async fn upsert_projections(&self, projections: &[Projection]) -> AppResult<usize>;

    /// Lists projections with their current analyses
    ///
    /// Analyzed projections come first by descending confidence, then the rest by
    /// start time.
    async fn list_projections(&self, filter: &ProjectionFilter) -> AppResult<Vec<ProjectionView>>;

    async fn get_projection(&self, id: Uuid) -> AppResult<Option<ProjectionView>>;

    /// Projections without a current analysis, soonest start first
    async fn pending_analysis(&self, limit: usize) -> AppResult<Vec<Projection>>;

    /// Stores the analysis for a projection, replacing any previous one
    async fn save_analysis(&self, projection_id: Uuid, analysis: &StoredAnalysis)
        -> AppResult<()>;
}

/// Orders views the way `list_projections` promises
pub(crate) fn sort_views(views: &mut [ProjectionView]) {
    views.sort_by(|a, b| {
        let a_confidence = a.analysis.as_ref().map(|x| x.result.confidence_score);
        let b_confidence = b.analysis.as_ref().map(|x| x.result.confidence_score);
        b_confidence
            .cmp(&a_confidence)
            .then_with(|| start_order(&a.projection).cmp(&start_order(&b.projection)))
    });
}

/// Sort key placing projections without a start time last
fn start_order(projection: &Projection) -> (bool, Option<chrono::DateTime<Utc>>) {
    (projection.start_time.is_none(), projection.start_time)
}

#[derive(Default)]
struct StoreInner {
    projections: HashMap<Uuid, Projection>,
    by_external_id: HashMap<String, Uuid>,
    analyses: HashMap<Uuid, StoredAnalysis>,
}

impl StoreInner {
    fn view(&self, projection: &Projection) -> ProjectionView {
        let analysis = self
            .analyses
            .get(&projection.id)
            .filter(|analysis| analysis.is_current_for(projection.line_score))
            .cloned();

        ProjectionView {
            projection: projection.clone(),
            analysis,
        }
    }
}

/// Process-local store, used for tests and for running without PostgreSQL
#[derive(Default)]
pub struct InMemoryProjectionStore {
    inner: RwLock<StoreInner>,
}

impl InMemoryProjectionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ProjectionStore for InMemoryProjectionStore {
    async fn upsert_projections(&self, projections: &[Projection]) -> AppResult<usize> {
        let mut inner = self.inner.write().await;

        for projection in projections {
            let existing = inner.by_external_id.get(&projection.external_id).copied();
            let stored = match existing {
                Some(id) => Projection {
                    id,
                    ..projection.clone()
                },
                None => projection.clone(),
            };

            inner
                .by_external_id
                .insert(stored.external_id.clone(), stored.id);
            inner.projections.insert(stored.id, stored);
        }

        Ok(projections.len())
    }

    async fn list_projections(&self, filter: &ProjectionFilter) -> AppResult<Vec<ProjectionView>> {
        let inner = self.inner.read().await;

        let mut views: Vec<ProjectionView> = inner
            .projections
            .values()
            .map(|projection| inner.view(projection))
            .filter(|view| view.matches(filter))
            .collect();

        sort_views(&mut views);
        views.truncate(filter.limit());

        Ok(views)
    }

    async fn get_projection(&self, id: Uuid) -> AppResult<Option<ProjectionView>> {
        let inner = self.inner.read().await;
        Ok(inner.projections.get(&id).map(|p| inner.view(p)))
    }

    async fn pending_analysis(&self, limit: usize) -> AppResult<Vec<Projection>> {
        let inner = self.inner.read().await;

        let mut pending: Vec<Projection> = inner
            .projections
            .values()
            .filter(|projection| inner.view(projection).analysis.is_none())
            .cloned()
            .collect();

        pending.sort_by(|a, b| start_order(a).cmp(&start_order(b)));
        pending.truncate(limit);

        Ok(pending)
    }

    async fn save_analysis(
        &self,
        projection_id: Uuid,
        analysis: &StoredAnalysis,
    ) -> AppResult<()> {
        let mut inner = self.inner.write().await;

        if !inner.projections.contains_key(&projection_id) {
            return Err(crate::error::AppError::NotFound(format!(
                "Projection {} not found",
                projection_id
            )));
        }

        inner.analyses.insert(projection_id, analysis.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{AnalysisResult, Consistency, Recommendation, StatsSummary, Trend};
    use chrono::{Duration, Utc};

    fn projection(external_id: &str, line_score: f64, starts_in_hours: Option<i64>) -> Projection {
        Projection {
            id: Uuid::new_v4(),
            external_id: external_id.to_string(),
            player_name: format!("Player {}", external_id),
            team: None,
            league: "NBA".to_string(),
            stat_type: "Points".to_string(),
            line_score,
            start_time: starts_in_hours.map(|h| Utc::now() + Duration::hours(h)),
            fetched_at: Utc::now(),
        }
    }

    fn analysis(line_score: f64, confidence_score: u8) -> StoredAnalysis {
        StoredAnalysis::new(
            AnalysisResult {
                recommendation: Recommendation::Over,
                confidence_score,
                reasoning: "test".to_string(),
                recent_average: Some("25.0".to_string()),
                games_analyzed: 5,
            },
            line_score,
            StatsSummary {
                recent_average: Some(25.0),
                last_5_games: vec![25.0; 5],
                last_10_games: vec![25.0; 10],
                consistency: Consistency::High,
                trend: Trend::Stable,
            },
        )
    }

    #[tokio::test]
    async fn test_upsert_keeps_internal_id() {
        let store = InMemoryProjectionStore::new();
        let original = projection("p1", 20.5, Some(1));
        store.upsert_projections(&[original.clone()]).await.unwrap();

        let moved = Projection {
            id: Uuid::new_v4(),
            line_score: 21.5,
            ..original.clone()
        };
        store.upsert_projections(&[moved]).await.unwrap();

        let views = store
            .list_projections(&ProjectionFilter::default())
            .await
            .unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].projection.id, original.id);
        assert_eq!(views[0].projection.line_score, 21.5);
    }

    #[tokio::test]
    async fn test_pending_until_analyzed() {
        let store = InMemoryProjectionStore::new();
        let p1 = projection("p1", 20.5, Some(2));
        let p2 = projection("p2", 10.5, Some(1));
        store.upsert_projections(&[p1.clone(), p2.clone()]).await.unwrap();

        let pending = store.pending_analysis(10).await.unwrap();
        assert_eq!(pending.len(), 2);
        // Soonest start first
        assert_eq!(pending[0].external_id, "p2");

        store.save_analysis(p2.id, &analysis(10.5, 70)).await.unwrap();
        let pending = store.pending_analysis(10).await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].external_id, "p1");
    }

    #[tokio::test]
    async fn test_line_move_invalidates_analysis() {
        let store = InMemoryProjectionStore::new();
        let p1 = projection("p1", 20.5, Some(1));
        store.upsert_projections(&[p1.clone()]).await.unwrap();
        store.save_analysis(p1.id, &analysis(20.5, 70)).await.unwrap();
        assert!(store.pending_analysis(10).await.unwrap().is_empty());

        let moved = Projection {
            line_score: 22.5,
            ..p1.clone()
        };
        store.upsert_projections(&[moved]).await.unwrap();

        let view = store.get_projection(p1.id).await.unwrap().unwrap();
        assert!(view.analysis.is_none());
        assert_eq!(store.pending_analysis(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_orders_by_confidence_then_start() {
        let store = InMemoryProjectionStore::new();
        let low = projection("low", 10.0, Some(5));
        let high = projection("high", 10.0, Some(6));
        let later = projection("later", 10.0, Some(3));
        let sooner = projection("sooner", 10.0, Some(2));
        let undated = projection("undated", 10.0, None);
        store
            .upsert_projections(&[
                low.clone(),
                high.clone(),
                later.clone(),
                sooner.clone(),
                undated.clone(),
            ])
            .await
            .unwrap();
        store.save_analysis(low.id, &analysis(10.0, 55)).await.unwrap();
        store.save_analysis(high.id, &analysis(10.0, 90)).await.unwrap();

        let views = store
            .list_projections(&ProjectionFilter::default())
            .await
            .unwrap();
        let order: Vec<&str> = views
            .iter()
            .map(|v| v.projection.external_id.as_str())
            .collect();
        assert_eq!(order, vec!["high", "low", "sooner", "later", "undated"]);
    }

    #[tokio::test]
    async fn test_list_applies_filter_and_limit() {
        let store = InMemoryProjectionStore::new();
        let a = projection("a", 10.0, Some(1));
        let b = projection("b", 10.0, Some(2));
        let c = projection("c", 10.0, Some(3));
        store
            .upsert_projections(&[a.clone(), b.clone(), c.clone()])
            .await
            .unwrap();
        store.save_analysis(a.id, &analysis(10.0, 60)).await.unwrap();
        store.save_analysis(b.id, &analysis(10.0, 80)).await.unwrap();

        let filter = ProjectionFilter {
            min_confidence: Some(50),
            limit: Some(1),
            ..Default::default()
        };
        let views = store.list_projections(&filter).await.unwrap();
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].projection.external_id, "b");
    }

    #[tokio::test]
    async fn test_save_analysis_unknown_projection() {
        let store = InMemoryProjectionStore::new();
        let result = store.save_analysis(Uuid::new_v4(), &analysis(10.0, 60)).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_missing_projection() {
        let store = InMemoryProjectionStore::new();
        assert!(store.get_projection(Uuid::new_v4()).await.unwrap().is_none());
    }
}
