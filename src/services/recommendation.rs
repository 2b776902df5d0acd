use crate::models::{
    AnalysisInput, AnalysisResult, Consistency, Recommendation, StatsSummary, Trend,
};

/// Percent gap between average and line treated as a strong edge
const STRONG_EDGE_PERCENT: f64 = 15.0;
/// Percent gap between average and line treated as a moderate edge
const MODERATE_EDGE_PERCENT: f64 = 8.0;
/// Share of recent games on one side of the line treated as a reliable pattern
const HIT_RATE_THRESHOLD: f64 = 0.8;

const STRONG_EDGE_CONFIDENCE: f64 = 70.0;
const MODERATE_EDGE_CONFIDENCE: f64 = 55.0;
const HIT_RATE_CONFIDENCE: f64 = 60.0;
const NO_EDGE_CONFIDENCE: f64 = 30.0;

const HIGH_CONSISTENCY_ADJUSTMENT: f64 = 10.0;
const LOW_CONSISTENCY_ADJUSTMENT: f64 = -15.0;
const TREND_ADJUSTMENT: f64 = 10.0;

/// Below this score a directional pick is downgraded to a skip
const MIN_ACTIONABLE_CONFIDENCE: u8 = 45;

pub const INSUFFICIENT_DATA_REASON: &str = "Insufficient data available for analysis";
pub const LOW_CONFIDENCE_REASON: &str = "Low confidence — recommend skipping.";

/// Produces an over/under/skip recommendation for a projection line
///
/// Weighs the gap between the player's recent average and the line, then the share of
/// the last five games landing on one side of it, and finally adjusts the confidence for
/// consistency and trend. Never fails: missing data yields a skip with a score of 0.
///
/// A pick forced to skip for low confidence keeps its computed score.
pub fn analyze(line_score: f64, stats: &StatsSummary) -> AnalysisResult {
    let recent_average = match stats.recent_average {
        Some(average) if stats.has_data() => average,
        _ => return insufficient_data(),
    };
    let games = &stats.last_5_games;

    // A zero line yields an infinite (or NaN) percentage; left as is
    let difference = recent_average - line_score;
    let percent_difference = difference / line_score * 100.0;

    let games_over = games.iter().filter(|&&value| value > line_score).count();
    let games_under = games.iter().filter(|&&value| value < line_score).count();
    let hit_rate = games_over.max(games_under) as f64 / games.len() as f64;

    let std_dev = population_std_dev(games);
    let coefficient_of_variation = std_dev / recent_average;

    let mut reasons: Vec<String> = Vec::new();
    let edge_direction = if difference > 0.0 {
        Recommendation::Over
    } else {
        Recommendation::Under
    };
    let relation = if difference > 0.0 { "above" } else { "below" };

    let (mut recommendation, base_confidence) = if percent_difference.abs() > STRONG_EDGE_PERCENT
    {
        reasons.push(format!(
            "Recent average of {:.1} is {:.1}% {} the line of {:.1}, a strong edge.",
            recent_average,
            percent_difference.abs(),
            relation,
            line_score
        ));
        (edge_direction, STRONG_EDGE_CONFIDENCE)
    } else if percent_difference.abs() > MODERATE_EDGE_PERCENT {
        reasons.push(format!(
            "Recent average of {:.1} is {:.1}% {} the line of {:.1}, a moderate edge.",
            recent_average,
            percent_difference.abs(),
            relation,
            line_score
        ));
        (edge_direction, MODERATE_EDGE_CONFIDENCE)
    } else if hit_rate >= HIT_RATE_THRESHOLD {
        let (side, hits) = if games_over > games_under {
            (Recommendation::Over, games_over)
        } else {
            (Recommendation::Under, games_under)
        };
        reasons.push(format!(
            "Went {} the line of {:.1} in {} of the last {} games ({:.1}% hit rate).",
            side,
            line_score,
            hits,
            games.len(),
            hit_rate * 100.0
        ));
        (side, HIT_RATE_CONFIDENCE)
    } else {
        reasons.push(format!(
            "No clear edge: recent average of {:.1} is within {:.1}% of the line of {:.1} with a {:.1}% hit rate.",
            recent_average,
            percent_difference.abs(),
            line_score,
            hit_rate * 100.0
        ));
        (Recommendation::Skip, NO_EDGE_CONFIDENCE)
    };

    let consistency_adjustment = match stats.consistency {
        Consistency::High => {
            reasons.push(format!(
                "Performance has been highly consistent (std dev {:.1}, {:.1}% variation).",
                std_dev,
                coefficient_of_variation * 100.0
            ));
            HIGH_CONSISTENCY_ADJUSTMENT
        }
        Consistency::Low => {
            reasons.push(format!(
                "Performance has been inconsistent (std dev {:.1}, {:.1}% variation), adding risk.",
                std_dev,
                coefficient_of_variation * 100.0
            ));
            LOW_CONSISTENCY_ADJUSTMENT
        }
        Consistency::Medium => 0.0,
    };

    let trend_adjustment = match (recommendation, stats.trend) {
        (Recommendation::Over, Trend::Increasing) => {
            reasons.push("Recent trend is increasing, supporting the over.".to_string());
            TREND_ADJUSTMENT
        }
        (Recommendation::Under, Trend::Decreasing) => {
            reasons.push("Recent trend is decreasing, supporting the under.".to_string());
            TREND_ADJUSTMENT
        }
        (Recommendation::Over, Trend::Decreasing) => {
            reasons.push("Caution: recent trend is decreasing against the over.".to_string());
            -TREND_ADJUSTMENT
        }
        (Recommendation::Under, Trend::Increasing) => {
            reasons.push("Caution: recent trend is increasing against the under.".to_string());
            -TREND_ADJUSTMENT
        }
        _ => 0.0,
    };

    let confidence_score = (base_confidence + consistency_adjustment + trend_adjustment)
        .clamp(0.0, 100.0)
        .round() as u8;

    if confidence_score < MIN_ACTIONABLE_CONFIDENCE && recommendation != Recommendation::Skip {
        recommendation = Recommendation::Skip;
        reasons.push(LOW_CONFIDENCE_REASON.to_string());
    }

    AnalysisResult {
        recommendation,
        confidence_score,
        reasoning: reasons.join(" "),
        recent_average: Some(format!("{:.1}", recent_average)),
        games_analyzed: games.len(),
    }
}

/// Analyzes each input independently, preserving order
pub fn analyze_batch(items: &[AnalysisInput]) -> Vec<AnalysisResult> {
    items
        .iter()
        .map(|item| analyze(item.line_score, &item.stats))
        .collect()
}

fn insufficient_data() -> AnalysisResult {
    AnalysisResult {
        recommendation: Recommendation::Skip,
        confidence_score: 0,
        reasoning: INSUFFICIENT_DATA_REASON.to_string(),
        recent_average: None,
        games_analyzed: 0,
    }
}

/// Square root of the mean squared deviation from the mean
fn population_std_dev(values: &[f64]) -> f64 {
    let count = values.len() as f64;
    let mean = values.iter().sum::<f64>() / count;
    let variance = values
        .iter()
        .map(|value| (value - mean).powi(2))
        .sum::<f64>()
        / count;
    variance.sqrt()
}
