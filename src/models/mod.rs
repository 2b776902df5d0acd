use serde::{Deserialize, Serialize};

pub mod analysis;
pub mod projection;
pub mod stats;

pub use analysis::{AnalysisInput, AnalysisResult, Recommendation};
pub use projection::{Projection, ProjectionFilter, ProjectionView, StoredAnalysis};
pub use stats::{Consistency, StatsQuery, StatsSummary, Trend};

/// Outcome counts for one pass of the analysis pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisRunSummary {
    /// Projections pulled from the store as pending
    pub considered: usize,
    /// Projections analyzed and persisted
    pub analyzed: usize,
    /// Projections skipped because stats could not be fetched
    pub skipped: usize,
    /// Projections analyzed but not persisted
    pub failed: usize,
}

/// Outcome counts for one projection sync
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncSummary {
    pub fetched: usize,
    pub stored: usize,
}

// ============================================================================
// Projection Feed API Types
// ============================================================================

/// JSON:API document returned by the projection feed
#[derive(Debug, Clone, Deserialize)]
pub struct ApiProjectionDocument {
    #[serde(default)]
    pub data: Vec<ApiProjection>,
    #[serde(default)]
    pub included: Vec<ApiIncluded>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiProjection {
    pub id: String,
    pub attributes: ApiProjectionAttributes,
    #[serde(default)]
    pub relationships: ApiProjectionRelationships,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiProjectionAttributes {
    /// Either a JSON number or a numeric string
    pub line_score: serde_json::Value,
    #[serde(default)]
    pub stat_type: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiProjectionRelationships {
    #[serde(default)]
    pub new_player: Option<ApiRelationship>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiRelationship {
    pub data: Option<ApiResourceRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiResourceRef {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
}

/// Sideloaded resource; only `new_player` entries are used
#[derive(Debug, Clone, Deserialize)]
pub struct ApiIncluded {
    pub id: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default)]
    pub attributes: serde_json::Value,
}

/// Player attributes carried by a `new_player` resource
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPlayerAttributes {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub team: Option<String>,
    #[serde(default)]
    pub league: Option<String>,
}

// ============================================================================
// Chat Completions API Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}
