//! Cross-item summary over stored patterns
//!
//! Aggregates the learned patterns into household-level counts and
//! surfaces the recommendations worth acting on.

use serde::Serialize;

use super::engine;
use crate::storage::{ConsumptionPattern, Trend};

/// Items per trend direction
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrendCounts {
    pub increasing: usize,
    pub decreasing: usize,
    pub stable: usize,
}

/// Household-level view across all learned patterns
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionSummary {
    pub total_items: usize,
    /// Items with confidence above 0.7
    pub items_with_high_confidence: usize,
    pub items_with_trend: TrendCounts,
    pub average_waste_percentage: f64,
    /// Recommendations for high-confidence items, capped
    pub recommendations: Vec<String>,
}

/// Build a summary over all stored patterns
///
/// Only high-confidence patterns contribute recommendations, and at
/// most `max_recommendations` are kept.
pub fn build_summary(patterns: &[ConsumptionPattern], max_recommendations: usize) -> ConsumptionSummary {
    if patterns.is_empty() {
        return ConsumptionSummary::default();
    }

    let mut trend_counts = TrendCounts::default();
    for pattern in patterns {
        match pattern.trend {
            Trend::Increasing => trend_counts.increasing += 1,
            Trend::Decreasing => trend_counts.decreasing += 1,
            Trend::Stable => trend_counts.stable += 1,
        }
    }

    let total_waste: f64 = patterns.iter().map(|p| p.waste_percentage).sum();

    ConsumptionSummary {
        total_items: patterns.len(),
        items_with_high_confidence: patterns.iter().filter(|p| p.confidence_score > 0.7).count(),
        items_with_trend: trend_counts,
        average_waste_percentage: total_waste / patterns.len() as f64,
        recommendations: patterns
            .iter()
            .filter(|p| p.confidence_score > 0.7)
            .map(engine::generate_recommendation)
            .take(max_recommendations)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pattern(item: &str, trend: Trend, confidence: f64, waste: f64) -> ConsumptionPattern {
        ConsumptionPattern {
            item_name: item.into(),
            average_weekly_usage: 4.0,
            unit: "units".into(),
            average_serving_size: None,
            waste_percentage: waste,
            confidence_score: confidence,
            data_points: 10,
            trend,
            weekly_history: vec![4.0; 6],
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn test_empty_patterns_give_default_summary() {
        let summary = build_summary(&[], 5);
        assert_eq!(summary.total_items, 0);
        assert_eq!(summary.items_with_high_confidence, 0);
        assert!(summary.recommendations.is_empty());
        assert_eq!(summary.average_waste_percentage, 0.0);
    }

    #[test]
    fn test_counts_and_average_waste() {
        let patterns = vec![
            pattern("Milk", Trend::Increasing, 0.8, 4.0),
            pattern("Bread", Trend::Stable, 0.6, 12.0),
            pattern("Eggs", Trend::Decreasing, 0.9, 2.0),
        ];

        let summary = build_summary(&patterns, 5);
        assert_eq!(summary.total_items, 3);
        assert_eq!(summary.items_with_high_confidence, 2);
        assert_eq!(summary.items_with_trend.increasing, 1);
        assert_eq!(summary.items_with_trend.decreasing, 1);
        assert_eq!(summary.items_with_trend.stable, 1);
        assert!((summary.average_waste_percentage - 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_recommendations_from_high_confidence_only_and_capped() {
        let patterns = vec![
            pattern("A", Trend::Increasing, 0.8, 5.0),
            pattern("B", Trend::Increasing, 0.5, 5.0),
            pattern("C", Trend::Decreasing, 0.9, 5.0),
            pattern("D", Trend::Stable, 0.95, 5.0),
        ];

        let summary = build_summary(&patterns, 2);
        assert_eq!(summary.recommendations.len(), 2);
        assert!(summary.recommendations[0].contains("Increase weekly order"));
    }
}
