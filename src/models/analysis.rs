use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use super::StatsSummary;

/// Recommended side of a projection line
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Over,
    Under,
    Skip,
}

impl Recommendation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Recommendation::Over => "over",
            Recommendation::Under => "under",
            Recommendation::Skip => "skip",
        }
    }
}

impl Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Recommendation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "over" => Ok(Recommendation::Over),
            "under" => Ok(Recommendation::Under),
            "skip" => Ok(Recommendation::Skip),
            other => Err(format!("Unknown recommendation: {}", other)),
        }
    }
}

/// Output of the recommendation engine for one projection line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub recommendation: Recommendation,
    /// Always within 0..=100
    pub confidence_score: u8,
    pub reasoning: String,
    /// Recent average formatted to one decimal place
    pub recent_average: Option<String>,
    pub games_analyzed: usize,
}

/// One engine input: a line and the stats it is judged against
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisInput {
    pub line_score: f64,
    pub stats: StatsSummary,
}
