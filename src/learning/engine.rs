//! Consumption learning engine
//!
//! Pure functions over a caller-supplied slice of consumption records
//! for one item. Aggregates history into Monday-anchored weekly buckets,
//! filters outlier weeks, and derives a smoothed weekly average, a trend
//! direction, and a confidence score. No I/O, no shared state.

use chrono::{Datelike, Duration, NaiveDate, Utc};

use crate::storage::{ConsumptionPattern, ConsumptionRecord, Trend};

/// Weight given to the most recent weeks in the smoothed average
const RECENT_WEIGHT: f64 = 0.6;
/// Number of trailing weeks treated as "recent"
const RECENT_WEEKS: usize = 4;
/// Weeks of history kept on the stored pattern
const HISTORY_WEEKS: usize = 12;
/// Percent change beyond which usage counts as trending
const TREND_THRESHOLD_PERCENT: f64 = 15.0;

/// Monday of the week containing `date`
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Group records into weekly usage totals, oldest week first
///
/// Weeks with no records are absent, not zero. Record order does not
/// matter; bucketing is by the Monday-anchored week of each date.
pub fn group_by_week(history: &[ConsumptionRecord]) -> Vec<f64> {
    let mut weekly = std::collections::BTreeMap::new();

    for record in history {
        *weekly.entry(week_start(record.date)).or_insert(0.0) += record.quantity_used;
    }

    weekly.into_values().collect()
}

/// Drop weekly totals more than 2 standard deviations from the mean
///
/// Fewer than 4 points is too little signal to call anything an outlier,
/// so short series pass through unchanged. Single pass, order preserved.
pub fn detect_anomalies(weekly: &[f64]) -> Vec<f64> {
    if weekly.len() < 4 {
        return weekly.to_vec();
    }

    let mean = mean(weekly);
    let std_dev = std_deviation(weekly, mean);

    weekly
        .iter()
        .copied()
        .filter(|value| (value - mean).abs() <= 2.0 * std_dev)
        .collect()
}

/// Smoothed weekly average: 60% weight on the last 4 weeks, 40% on the rest
///
/// With 4 or fewer points the blend degenerates to the plain mean.
pub fn smoothed_average(weekly: &[f64]) -> f64 {
    match weekly.len() {
        0 => 0.0,
        1 => weekly[0],
        n => {
            let (older, recent) = weekly.split_at(n.saturating_sub(RECENT_WEEKS));
            let recent_avg = mean(recent);
            let older_avg = if older.is_empty() { recent_avg } else { mean(older) };
            recent_avg * RECENT_WEIGHT + older_avg * (1.0 - RECENT_WEIGHT)
        }
    }
}

/// Detect the direction of change between recent and older weekly usage
pub fn detect_trend(weekly: &[f64]) -> Trend {
    if weekly.len() < 4 {
        return Trend::Stable;
    }

    let (older, recent) = weekly.split_at(weekly.len() - RECENT_WEEKS);
    if older.is_empty() {
        return Trend::Stable;
    }

    let recent_avg = mean(recent);
    let older_avg = mean(older);

    if older_avg == 0.0 {
        // No measurable older usage: any recent usage reads as growth.
        return if recent_avg > 0.0 { Trend::Increasing } else { Trend::Stable };
    }

    let change_percent = (recent_avg - older_avg) / older_avg * 100.0;

    if change_percent > TREND_THRESHOLD_PERCENT {
        Trend::Increasing
    } else if change_percent < -TREND_THRESHOLD_PERCENT {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

/// Score how reliable the weekly average is, in [0, 1]
///
/// Consistency (low coefficient of variation) drives the base score,
/// with a bonus for data volume that caps once 12 weeks are available.
/// Under 4 points the score is capped at 0.5 regardless of consistency.
pub fn confidence_score(weekly: &[f64]) -> f64 {
    if weekly.len() < 4 {
        return (weekly.len() as f64 / 4.0).min(0.5);
    }

    let mean_usage = mean(weekly);
    let std_dev = std_deviation(weekly, mean_usage);
    let cv = if mean_usage > 0.0 { std_dev / mean_usage } else { 1.0 };

    let consistency = (1.0 - cv).max(0.3);
    let volume_bonus = (weekly.len() as f64 / HISTORY_WEEKS as f64).min(1.0) * 0.2;

    (consistency + volume_bonus).min(1.0)
}

/// Share of all handled quantity (used + wasted) that was wasted, 0-100
pub fn waste_percentage(history: &[ConsumptionRecord]) -> f64 {
    let total_used: f64 = history.iter().map(|r| r.quantity_used).sum();
    let total_waste: f64 = history.iter().filter_map(|r| r.waste_amount).sum();

    if total_used == 0.0 {
        return 0.0;
    }
    total_waste / (total_used + total_waste) * 100.0
}

/// Mean quantity per serving over records that report servings
///
/// Records with zero or missing servings are excluded.
pub fn average_serving_size(history: &[ConsumptionRecord]) -> Option<f64> {
    let ratios: Vec<f64> = history
        .iter()
        .filter_map(|r| match r.actual_servings {
            Some(servings) if servings > 0 => Some(r.quantity_used / servings as f64),
            _ => None,
        })
        .collect();

    if ratios.is_empty() {
        None
    } else {
        Some(mean(&ratios))
    }
}

/// Learn a consumption pattern from an item's history
///
/// Trend, confidence, and the smoothed average come from the
/// anomaly-filtered weekly series; waste and serving size come from the
/// raw records, and the stored weekly history is the unfiltered series
/// truncated to its last 12 weeks. Tolerates 0 or 1 records by producing
/// degenerate output; callers normally gate on a minimum record count.
pub fn learn_pattern(
    item_name: &str,
    history: &[ConsumptionRecord],
    _existing: Option<&ConsumptionPattern>,
) -> ConsumptionPattern {
    let weekly = group_by_week(history);
    let cleaned = detect_anomalies(&weekly);

    let average_weekly_usage = smoothed_average(&cleaned);
    let trend = detect_trend(&cleaned);
    let confidence_score = confidence_score(&cleaned);
    let waste_percentage = waste_percentage(history);
    let average_serving_size = average_serving_size(history);

    let unit = history
        .first()
        .map(|r| r.unit.clone())
        .unwrap_or_else(|| "units".to_string());

    let keep_from = weekly.len().saturating_sub(HISTORY_WEEKS);

    ConsumptionPattern {
        item_name: item_name.to_string(),
        average_weekly_usage,
        unit,
        average_serving_size,
        waste_percentage,
        confidence_score,
        data_points: history.len(),
        trend,
        weekly_history: weekly[keep_from..].to_vec(),
        last_updated: Utc::now(),
    }
}

/// Generate a human-readable recommendation from a learned pattern
///
/// Clauses are independent and additive, joined by "; ". When nothing
/// fires, the default is to keep the current quantity.
pub fn generate_recommendation(pattern: &ConsumptionPattern) -> String {
    let mut recommendations = Vec::new();

    if pattern.trend == Trend::Increasing && pattern.confidence_score > 0.7 {
        recommendations.push(format!(
            "Increase weekly order by 15-20% (currently {:.1} {})",
            pattern.average_weekly_usage, pattern.unit
        ));
    } else if pattern.trend == Trend::Decreasing && pattern.confidence_score > 0.7 {
        recommendations.push(format!(
            "Decrease weekly order by 15-20% (currently {:.1} {})",
            pattern.average_weekly_usage, pattern.unit
        ));
    }

    if pattern.waste_percentage > 10.0 {
        recommendations.push(format!(
            "High waste ({:.1}%) - consider reducing quantity or using sooner",
            pattern.waste_percentage
        ));
    } else if pattern.waste_percentage < 2.0 {
        recommendations.push("Low waste - good quantity management".to_string());
    }

    if pattern.confidence_score < 0.5 {
        recommendations.push(format!(
            "Low confidence - need more data ({} data points)",
            pattern.data_points
        ));
    }

    if recommendations.is_empty() {
        format!(
            "Maintain current quantity ({:.1} {}/week)",
            pattern.average_weekly_usage, pattern.unit
        )
    } else {
        recommendations.join("; ")
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation
fn std_deviation(values: &[f64], mean: f64) -> f64 {
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}
