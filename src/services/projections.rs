use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reqwest::Client as HttpClient;
use uuid::Uuid;

use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{ApiPlayerAttributes, ApiProjectionDocument, Projection},
};

const FEED_CACHE_TTL: u64 = 60;
const FEED_PAGE_SIZE: &str = "250";

/// Source of third-party projections
#[async_trait::async_trait]
pub trait ProjectionSource: Send + Sync {
    /// Fetches current projections, optionally for a single league
    ///
    /// Line values are already parsed; entries the source cannot parse are dropped.
    async fn fetch_projections(&self, league: Option<&str>) -> AppResult<Vec<Projection>>;

    fn name(&self) -> &'static str;
}

/// Client for the JSON:API projection feed
#[derive(Clone)]
pub struct ProjectionFeedClient {
    http_client: HttpClient,
    api_url: String,
    cache: Cache,
}

impl ProjectionFeedClient {
    pub fn new(cache: Cache, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url,
            cache,
        }
    }

    async fn fetch_document(&self, league: Option<&str>) -> AppResult<serde_json::Value> {
        let url = format!("{}/projections", self.api_url.trim_end_matches('/'));

        let mut params = vec![("per_page", FEED_PAGE_SIZE), ("single_stat", "true")];
        if let Some(league) = league {
            params.push(("league_id", league));
        }

        let response = self
            .http_client
            .get(&url)
            .header("Accept", "application/json")
            .query(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Projection feed returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl ProjectionSource for ProjectionFeedClient {
    async fn fetch_projections(&self, league: Option<&str>) -> AppResult<Vec<Projection>> {
        let raw: AppResult<serde_json::Value> = cached!(
            self.cache,
            CacheKey::ProjectionFeed(league.map(str::to_string)),
            FEED_CACHE_TTL,
            async move { self.fetch_document(league).await }
        );
        let raw = raw?;

        let document: ApiProjectionDocument = serde_json::from_value(raw).map_err(|e| {
            AppError::ExternalApi(format!("Invalid projection feed format: {}", e))
        })?;

        let projections = parse_document(document, Utc::now());

        tracing::info!(
            league = ?league,
            projections = projections.len(),
            provider = self.name(),
            "Projection feed fetched"
        );

        Ok(projections)
    }

    fn name(&self) -> &'static str {
        "projection_feed"
    }
}

/// Parses a numeric line that may arrive as a JSON number or a string
pub fn parse_line_score(value: &serde_json::Value) -> Option<f64> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|line| line.is_finite())
}

/// Converts a feed document into projections
///
/// Projections whose player is missing from `included`, whose line does not parse, or
/// that carry no stat type are dropped.
pub fn parse_document(document: ApiProjectionDocument, fetched_at: DateTime<Utc>) -> Vec<Projection> {
    let players: HashMap<String, ApiPlayerAttributes> = document
        .included
        .into_iter()
        .filter(|resource| resource.resource_type == "new_player")
        .filter_map(|resource| {
            serde_json::from_value::<ApiPlayerAttributes>(resource.attributes)
                .ok()
                .map(|attributes| (resource.id, attributes))
        })
        .collect();

    document
        .data
        .into_iter()
        .filter_map(|item| {
            let Some(line_score) = parse_line_score(&item.attributes.line_score) else {
                tracing::warn!(
                    projection_id = %item.id,
                    line_score = %item.attributes.line_score,
                    "Dropping projection with unparseable line"
                );
                return None;
            };

            let Some(stat_type) = item.attributes.stat_type.filter(|s| !s.trim().is_empty())
            else {
                tracing::warn!(projection_id = %item.id, "Dropping projection without a stat type");
                return None;
            };

            let player = item
                .relationships
                .new_player
                .as_ref()
                .and_then(|relationship| relationship.data.as_ref())
                .and_then(|reference| players.get(&reference.id));

            let Some(player) = player else {
                tracing::warn!(projection_id = %item.id, "Dropping projection with unknown player");
                return None;
            };

            let Some(player_name) = player.display_name.clone().or_else(|| player.name.clone())
            else {
                tracing::warn!(projection_id = %item.id, "Dropping projection with unnamed player");
                return None;
            };

            let start_time = item
                .attributes
                .start_time
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|t| t.with_timezone(&Utc));

            Some(Projection {
                id: Uuid::new_v4(),
                external_id: item.id,
                player_name,
                team: player.team.clone().or(item.attributes.description),
                league: player.league.clone().unwrap_or_else(|| "UNKNOWN".to_string()),
                stat_type,
                line_score,
                start_time,
                fetched_at,
            })
        })
        .collect()
}
