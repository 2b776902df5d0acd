use serde::{Deserialize, Serialize};

/// Qualitative variance classification of a player's recent games
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Consistency {
    High,
    Medium,
    Low,
}

/// Direction of a player's recent performance
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Stable,
    Decreasing,
}

/// Recent performance summary for one (player, league, stat type) tuple
///
/// Accepts camelCase keys as well, since generative stats sources answer in that shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatsSummary {
    #[serde(default, alias = "recentAverage")]
    pub recent_average: Option<f64>,
    #[serde(default, alias = "last5Games")]
    pub last_5_games: Vec<f64>,
    #[serde(default, alias = "last10Games")]
    pub last_10_games: Vec<f64>,
    pub consistency: Consistency,
    pub trend: Trend,
}

impl StatsSummary {
    /// Summary carrying no usable data
    pub fn empty() -> Self {
        Self {
            recent_average: None,
            last_5_games: Vec::new(),
            last_10_games: Vec::new(),
            consistency: Consistency::Medium,
            trend: Trend::Stable,
        }
    }

    /// Whether the summary has enough data for the engine to analyze
    pub fn has_data(&self) -> bool {
        self.recent_average.is_some() && !self.last_5_games.is_empty()
    }
}

/// Identifies the stats a provider is asked for
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatsQuery {
    pub player_name: String,
    pub league: String,
    pub stat_type: String,
}

impl StatsQuery {
    pub fn new(
        player_name: impl Into<String>,
        league: impl Into<String>,
        stat_type: impl Into<String>,
    ) -> Self {
        Self {
            player_name: player_name.into(),
            league: league.into(),
            stat_type: stat_type.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_summary_snake_case() {
        let json = r#"{
            "recent_average": 24.2,
            "last_5_games": [22, 25, 27, 21, 26],
            "last_10_games": [22, 25, 27, 21, 26, 24, 23, 20, 28, 26],
            "consistency": "high",
            "trend": "increasing"
        }"#;

        let stats: StatsSummary = serde_json::from_str(json).unwrap();
        assert_eq!(stats.recent_average, Some(24.2));
        assert_eq!(stats.last_5_games.len(), 5);
        assert_eq!(stats.last_10_games.len(), 10);
        assert_eq!(stats.consistency, Consistency::High);
        assert_eq!(stats.trend, Trend::Increasing);
    }

    #[test]
    fn test_stats_summary_camel_case_aliases() {
        let json = r#"{
            "recentAverage": null,
            "last5Games": [],
            "last10Games": [],
            "consistency": "low",
            "trend": "decreasing"
        }"#;

        let stats: StatsSummary = serde_json::from_str(json).unwrap();
        assert_eq!(stats.recent_average, None);
        assert!(stats.last_5_games.is_empty());
        assert_eq!(stats.consistency, Consistency::Low);
        assert_eq!(stats.trend, Trend::Decreasing);
        assert!(!stats.has_data());
    }

    #[test]
    fn test_missing_game_arrays_default_to_empty() {
        let json = r#"{"recentAverage": 12.5, "consistency": "medium", "trend": "stable"}"#;
        let stats: StatsSummary = serde_json::from_str(json).unwrap();
        assert_eq!(stats.recent_average, Some(12.5));
        assert!(stats.last_5_games.is_empty());
        assert!(!stats.has_data());
    }

    #[test]
    fn test_empty_summary_has_no_data() {
        assert!(!StatsSummary::empty().has_data());
    }
}
