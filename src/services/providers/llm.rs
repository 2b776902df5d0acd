/// Generative stats provider
///
/// Asks an OpenAI-compatible chat completions endpoint for a player's recent game values
/// and summary labels, answered as a single JSON object. Used where no structured stats
/// feed covers a league; answers are cached per (league, player, stat type).
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, StatsQuery, StatsSummary},
    services::providers::StatsProvider,
};
use reqwest::Client as HttpClient;

const SYSTEM_PROMPT: &str = "You are a sports statistics assistant. Answer with a single JSON \
object and nothing else. Use null for recentAverage and empty arrays when you do not have \
reliable data for the player.";

#[derive(Clone)]
pub struct LlmStatsProvider {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
    cache: Cache,
    cache_ttl: u64,
}

impl LlmStatsProvider {
    pub fn new(
        cache: Cache,
        api_key: String,
        api_url: String,
        model: String,
        cache_ttl: u64,
    ) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url,
            model,
            cache,
            cache_ttl,
        }
    }

    async fn request_summary(&self, query: &StatsQuery) -> AppResult<StatsSummary> {
        let url = format!("{}/chat/completions", self.api_url.trim_end_matches('/'));

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_prompt(query),
                },
            ],
            temperature: 0.0,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Stats API returned status {}: {}",
                status, body
            )));
        }

        let completion: ChatCompletionResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| AppError::ExternalApi("Stats API returned no choices".to_string()))?;

        let summary = parse_summary(&content)?;

        tracing::info!(
            player = %query.player_name,
            league = %query.league,
            stat_type = %query.stat_type,
            games = summary.last_5_games.len(),
            provider = "llm",
            "Stats fetched"
        );

        Ok(summary)
    }
}

#[async_trait::async_trait]
impl StatsProvider for LlmStatsProvider {
    async fn fetch_stats(&self, query: &StatsQuery) -> AppResult<StatsSummary> {
        if query.player_name.trim().is_empty() {
            return Err(AppError::InvalidInput(
                "Player name cannot be empty".to_string(),
            ));
        }

        cached!(
            self.cache,
            CacheKey::from(query),
            self.cache_ttl,
            async move { self.request_summary(query).await }
        )
    }

    fn name(&self) -> &'static str {
        "llm"
    }
}

fn build_prompt(query: &StatsQuery) -> String {
    format!(
        "Provide {player}'s most recent {league} game values for the stat \"{stat}\".\n\
         Respond with JSON of the form:\n\
         {{\"recentAverage\": number|null, \"last5Games\": [numbers, most recent first], \
         \"last10Games\": [numbers, most recent first], \
         \"consistency\": \"high\"|\"medium\"|\"low\", \
         \"trend\": \"increasing\"|\"stable\"|\"decreasing\"}}",
        player = query.player_name,
        league = query.league,
        stat = query.stat_type,
    )
}

/// Extracts the JSON object from a model reply, tolerating Markdown code fences
fn extract_json(content: &str) -> &str {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    match (unfenced.find('{'), unfenced.rfind('}')) {
        (Some(start), Some(end)) if start < end => &unfenced[start..=end],
        _ => unfenced,
    }
}

fn parse_summary(content: &str) -> AppResult<StatsSummary> {
    let json = extract_json(content);
    serde_json::from_str(json).map_err(|e| {
        tracing::error!(error = %e, content = %content, "Failed to parse stats reply");
        AppError::ExternalApi(format!("Failed to parse stats reply: {}", e))
    })
}
