use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AnalysisResult, Recommendation, StatsQuery, StatsSummary};

/// A third-party stat-line prediction for a player
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Projection {
    pub id: Uuid,
    /// Identifier assigned by the upstream feed
    pub external_id: String,
    pub player_name: String,
    pub team: Option<String>,
    pub league: String,
    pub stat_type: String,
    pub line_score: f64,
    pub start_time: Option<DateTime<Utc>>,
    pub fetched_at: DateTime<Utc>,
}

impl Projection {
    pub fn stats_query(&self) -> StatsQuery {
        StatsQuery::new(&self.player_name, &self.league, &self.stat_type)
    }
}

/// An analysis as persisted, tied to the line it was computed against
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredAnalysis {
    #[serde(flatten)]
    pub result: AnalysisResult,
    pub line_score: f64,
    pub stats: StatsSummary,
    pub analyzed_at: DateTime<Utc>,
}

impl StoredAnalysis {
    pub fn new(result: AnalysisResult, line_score: f64, stats: StatsSummary) -> Self {
        Self {
            result,
            line_score,
            stats,
            analyzed_at: Utc::now(),
        }
    }

    /// Whether this analysis still applies to the given line
    pub fn is_current_for(&self, line_score: f64) -> bool {
        self.line_score == line_score
    }
}

/// A projection together with its current analysis, if any
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectionView {
    #[serde(flatten)]
    pub projection: Projection,
    pub analysis: Option<StoredAnalysis>,
}

impl ProjectionView {
    /// Whether this view passes the filter's analysis constraints
    pub fn matches(&self, filter: &ProjectionFilter) -> bool {
        if let Some(league) = &filter.league {
            if !self.projection.league.eq_ignore_ascii_case(league) {
                return false;
            }
        }

        if filter.recommendation.is_none() && filter.min_confidence.is_none() {
            return true;
        }

        let Some(analysis) = &self.analysis else {
            return false;
        };

        if let Some(recommendation) = filter.recommendation {
            if analysis.result.recommendation != recommendation {
                return false;
            }
        }

        if let Some(min_confidence) = filter.min_confidence {
            if analysis.result.confidence_score < min_confidence {
                return false;
            }
        }

        true
    }
}

/// Query filters for listing projections
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectionFilter {
    pub league: Option<String>,
    pub recommendation: Option<Recommendation>,
    pub min_confidence: Option<u8>,
    pub limit: Option<usize>,
}

impl ProjectionFilter {
    pub const DEFAULT_LIMIT: usize = 100;

    pub fn limit(&self) -> usize {
        self.limit.unwrap_or(Self::DEFAULT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Consistency, Trend};

    fn projection(league: &str) -> Projection {
        Projection {
            id: Uuid::new_v4(),
            external_id: "1001".to_string(),
            player_name: "Nikola Jokic".to_string(),
            team: Some("DEN".to_string()),
            league: league.to_string(),
            stat_type: "Rebounds".to_string(),
            line_score: 12.5,
            start_time: None,
            fetched_at: Utc::now(),
        }
    }

    fn analysis(recommendation: Recommendation, confidence_score: u8) -> StoredAnalysis {
        StoredAnalysis::new(
            AnalysisResult {
                recommendation,
                confidence_score,
                reasoning: String::new(),
                recent_average: Some("13.0".to_string()),
                games_analyzed: 5,
            },
            12.5,
            StatsSummary {
                recent_average: Some(13.0),
                last_5_games: vec![13.0; 5],
                last_10_games: vec![],
                consistency: Consistency::Medium,
                trend: Trend::Stable,
            },
        )
    }

    #[test]
    fn test_stats_query_from_projection() {
        let query = projection("NBA").stats_query();
        assert_eq!(query.player_name, "Nikola Jokic");
        assert_eq!(query.league, "NBA");
        assert_eq!(query.stat_type, "Rebounds");
    }

    #[test]
    fn test_filter_league_is_case_insensitive() {
        let view = ProjectionView {
            projection: projection("NBA"),
            analysis: None,
        };
        let filter = ProjectionFilter {
            league: Some("nba".to_string()),
            ..Default::default()
        };
        assert!(view.matches(&filter));

        let filter = ProjectionFilter {
            league: Some("NFL".to_string()),
            ..Default::default()
        };
        assert!(!view.matches(&filter));
    }

    #[test]
    fn test_filter_on_analysis_excludes_unanalyzed() {
        let view = ProjectionView {
            projection: projection("NBA"),
            analysis: None,
        };
        let filter = ProjectionFilter {
            min_confidence: Some(10),
            ..Default::default()
        };
        assert!(!view.matches(&filter));
    }

    #[test]
    fn test_filter_recommendation_and_confidence() {
        let view = ProjectionView {
            projection: projection("NBA"),
            analysis: Some(analysis(Recommendation::Over, 70)),
        };

        let over_filter = ProjectionFilter {
            recommendation: Some(Recommendation::Over),
            min_confidence: Some(65),
            ..Default::default()
        };
        assert!(view.matches(&over_filter));

        let strict_filter = ProjectionFilter {
            min_confidence: Some(75),
            ..Default::default()
        };
        assert!(!view.matches(&strict_filter));

        let under_filter = ProjectionFilter {
            recommendation: Some(Recommendation::Under),
            ..Default::default()
        };
        assert!(!view.matches(&under_filter));
    }

    #[test]
    fn test_analysis_current_only_for_same_line() {
        let stored = analysis(Recommendation::Over, 70);
        assert!(stored.is_current_for(12.5));
        assert!(!stored.is_current_for(13.5));
    }

    #[test]
    fn test_projection_view_flattens_analysis_result() {
        let view = ProjectionView {
            projection: projection("NBA"),
            analysis: Some(analysis(Recommendation::Under, 55)),
        };

        let value = serde_json::to_value(&view).unwrap();
        assert_eq!(value["player_name"], "Nikola Jokic");
        assert_eq!(value["analysis"]["recommendation"], "under");
        assert_eq!(value["analysis"]["confidence_score"], 55);
        assert_eq!(value["analysis"]["line_score"], 12.5);
    }
}
