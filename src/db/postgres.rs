use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::{
    db::store::{sort_views, ProjectionStore},
    error::{AppError, AppResult},
    models::{
        AnalysisResult, Projection, ProjectionFilter, ProjectionView, StatsSummary,
        StoredAnalysis,
    },
};

/// Creates a PostgreSQL connection pool
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}

/// Applies pending schema migrations from `migrations/`
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Columns shared by every projection query; analysis columns are NULL unless the
/// stored analysis matches the current line.
const PROJECTION_SELECT: &str = r#"
    SELECT p.id, p.external_id, p.player_name, p.team, p.league, p.stat_type,
           p.line_score, p.start_time, p.fetched_at,
           a.recommendation, a.confidence_score, a.reasoning, a.recent_average,
           a.games_analyzed, a.line_score AS analyzed_line, a.stats, a.analyzed_at
    FROM projections p
    LEFT JOIN analyses a ON a.projection_id = p.id AND a.line_score = p.line_score
"#;

#[derive(Debug, FromRow)]
struct ProjectionRow {
    id: Uuid,
    external_id: String,
    player_name: String,
    team: Option<String>,
    league: String,
    stat_type: String,
    line_score: f64,
    start_time: Option<DateTime<Utc>>,
    fetched_at: DateTime<Utc>,
    recommendation: Option<String>,
    confidence_score: Option<i16>,
    reasoning: Option<String>,
    recent_average: Option<String>,
    games_analyzed: Option<i32>,
    analyzed_line: Option<f64>,
    stats: Option<Json<StatsSummary>>,
    analyzed_at: Option<DateTime<Utc>>,
}

impl TryFrom<ProjectionRow> for ProjectionView {
    type Error = AppError;

    fn try_from(row: ProjectionRow) -> AppResult<Self> {
        let analysis = match (
            row.recommendation,
            row.confidence_score,
            row.reasoning,
            row.games_analyzed,
            row.analyzed_line,
            row.stats,
            row.analyzed_at,
        ) {
            (
                Some(recommendation),
                Some(confidence_score),
                Some(reasoning),
                Some(games_analyzed),
                Some(line_score),
                Some(Json(stats)),
                Some(analyzed_at),
            ) => Some(StoredAnalysis {
                result: AnalysisResult {
                    recommendation: recommendation.parse().map_err(AppError::Internal)?,
                    confidence_score: u8::try_from(confidence_score).map_err(|_| {
                        AppError::Internal(format!(
                            "Stored confidence {} out of range",
                            confidence_score
                        ))
                    })?,
                    reasoning,
                    recent_average: row.recent_average,
                    games_analyzed: games_analyzed.max(0) as usize,
                },
                line_score,
                stats,
                analyzed_at,
            }),
            _ => None,
        };

        Ok(ProjectionView {
            projection: Projection {
                id: row.id,
                external_id: row.external_id,
                player_name: row.player_name,
                team: row.team,
                league: row.league,
                stat_type: row.stat_type,
                line_score: row.line_score,
                start_time: row.start_time,
                fetched_at: row.fetched_at,
            },
            analysis,
        })
    }
}

/// PostgreSQL-backed projection store
#[derive(Clone)]
pub struct PgProjectionStore {
    pool: PgPool,
}

impl PgProjectionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProjectionStore for PgProjectionStore {
    async fn upsert_projections(&self, projections: &[Projection]) -> AppResult<usize> {
        let mut tx = self.pool.begin().await?;

        for projection in projections {
            sqlx::query(
                r#"
                INSERT INTO projections (
                    id, external_id, player_name, team, league, stat_type,
                    line_score, start_time, fetched_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (external_id) DO UPDATE SET
                    player_name = EXCLUDED.player_name,
                    team = EXCLUDED.team,
                    league = EXCLUDED.league,
                    stat_type = EXCLUDED.stat_type,
                    line_score = EXCLUDED.line_score,
                    start_time = EXCLUDED.start_time,
                    fetched_at = EXCLUDED.fetched_at
                "#,
            )
            .bind(projection.id)
            .bind(&projection.external_id)
            .bind(&projection.player_name)
            .bind(&projection.team)
            .bind(&projection.league)
            .bind(&projection.stat_type)
            .bind(projection.line_score)
            .bind(projection.start_time)
            .bind(projection.fetched_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(count = projections.len(), "Upserted projections");

        Ok(projections.len())
    }

    async fn list_projections(&self, filter: &ProjectionFilter) -> AppResult<Vec<ProjectionView>> {
        let query = format!(
            r#"{}
            WHERE ($1::TEXT IS NULL OR LOWER(p.league) = LOWER($1))
              AND ($2::TEXT IS NULL OR a.recommendation = $2)
              AND ($3::SMALLINT IS NULL OR a.confidence_score >= $3)
            ORDER BY a.confidence_score DESC NULLS LAST, p.start_time ASC NULLS LAST
            LIMIT $4
            "#,
            PROJECTION_SELECT
        );

        let rows: Vec<ProjectionRow> = sqlx::query_as(&query)
            .bind(&filter.league)
            .bind(filter.recommendation.map(|r| r.as_str()))
            .bind(filter.min_confidence.map(i16::from))
            .bind(filter.limit() as i64)
            .fetch_all(&self.pool)
            .await?;

        let mut views = rows
            .into_iter()
            .map(ProjectionView::try_from)
            .collect::<AppResult<Vec<_>>>()?;

        // Keeps tie ordering identical to the in-memory store
        sort_views(&mut views);

        Ok(views)
    }

    async fn get_projection(&self, id: Uuid) -> AppResult<Option<ProjectionView>> {
        let query = format!("{} WHERE p.id = $1", PROJECTION_SELECT);

        let row: Option<ProjectionRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ProjectionView::try_from).transpose()
    }

    async fn pending_analysis(&self, limit: usize) -> AppResult<Vec<Projection>> {
        let query = format!(
            r#"{}
            WHERE a.projection_id IS NULL
            ORDER BY p.start_time ASC NULLS LAST
            LIMIT $1
            "#,
            PROJECTION_SELECT
        );

        let rows: Vec<ProjectionRow> = sqlx::query_as(&query)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter()
            .map(|row| ProjectionView::try_from(row).map(|view| view.projection))
            .collect()
    }

    async fn save_analysis(
        &self,
        projection_id: Uuid,
        analysis: &StoredAnalysis,
    ) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO analyses (
                projection_id, recommendation, confidence_score, reasoning,
                recent_average, games_analyzed, line_score, stats, analyzed_at
            )
            SELECT $1, $2, $3, $4, $5, $6, $7, $8, $9
            WHERE EXISTS (SELECT 1 FROM projections WHERE id = $1)
            ON CONFLICT (projection_id) DO UPDATE SET
                recommendation = EXCLUDED.recommendation,
                confidence_score = EXCLUDED.confidence_score,
                reasoning = EXCLUDED.reasoning,
                recent_average = EXCLUDED.recent_average,
                games_analyzed = EXCLUDED.games_analyzed,
                line_score = EXCLUDED.line_score,
                stats = EXCLUDED.stats,
                analyzed_at = EXCLUDED.analyzed_at
            "#,
        )
        .bind(projection_id)
        .bind(analysis.result.recommendation.as_str())
        .bind(i16::from(analysis.result.confidence_score))
        .bind(&analysis.result.reasoning)
        .bind(&analysis.result.recent_average)
        .bind(analysis.result.games_analyzed as i32)
        .bind(analysis.line_score)
        .bind(Json(&analysis.stats))
        .bind(analysis.analyzed_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Projection {} not found",
                projection_id
            )));
        }

        Ok(())
    }
}
