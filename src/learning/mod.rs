//! Learning module for larder
//!
//! Orchestrates the consumption learning engine over stored history:
//! fetch records, learn a pattern, persist it, and report the result
//! with a recommendation.

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info};

pub mod engine;
pub mod summary;

use crate::config::{self, Config};
use crate::storage::{self, ConsumptionRecord, HistoryStore, PatternStore, Trend};

/// Outcome of learning one item's pattern
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningResult {
    pub item_name: String,
    /// Average from the previously stored pattern, 0 if none existed
    pub previous_average: f64,
    pub new_average: f64,
    pub trend: Trend,
    pub confidence_score: f64,
    pub recommendation: String,
}

/// Learn the pattern for a single item and persist it
pub async fn learn_item(item_name: &str) -> Result<()> {
    let cfg = Config::load(&config::larder_dir()?.join("config.toml"))?;
    let db_path = config::db_path()?;

    let history = HistoryStore::open(&db_path)?;
    let records = history.get_by_item(item_name, cfg.learning.lookback_weeks)?;

    if records.len() < cfg.learning.min_records {
        println!(
            "Not enough data to learn a pattern for '{}' ({} records, {} required)",
            item_name,
            records.len(),
            cfg.learning.min_records
        );
        return Ok(());
    }

    let patterns = PatternStore::open(&db_path)?;
    let result = learn_and_store(&patterns, item_name, &records)?;

    storage::log_learning_event(&db_path, "learn_item", &result)?;
    print_result(&result);

    info!(
        "Learned pattern for '{}' from {} records",
        item_name,
        records.len()
    );
    Ok(())
}

/// Learn patterns for every item with enough history in the window
pub async fn learn_all() -> Result<()> {
    let cfg = Config::load(&config::larder_dir()?.join("config.toml"))?;
    let db_path = config::db_path()?;

    let history = HistoryStore::open(&db_path)?;
    let all_records = history.get_all(cfg.learning.lookback_weeks)?;

    if all_records.is_empty() {
        println!("No consumption history found");
        return Ok(());
    }

    // BTreeMap keeps per-item output in a stable order
    let mut by_item: BTreeMap<String, Vec<ConsumptionRecord>> = BTreeMap::new();
    for record in all_records {
        by_item.entry(record.item_name.clone()).or_default().push(record);
    }

    let patterns = PatternStore::open(&db_path)?;
    let mut results = Vec::new();

    for (item_name, records) in &by_item {
        if records.len() < cfg.learning.min_records {
            debug!(
                "Skipping '{}': {} records, {} required",
                item_name,
                records.len(),
                cfg.learning.min_records
            );
            continue;
        }

        let result = learn_and_store(&patterns, item_name, records)?;
        results.push(result);
    }

    storage::log_learning_event(&db_path, "learn_all", &results)?;

    println!("✅ Learning complete: {} of {} items", results.len(), by_item.len());
    for result in &results {
        println!();
        print_result(result);
    }

    info!("Learned patterns for {} items", results.len());
    Ok(())
}

/// Show the stored pattern for an item with a fresh recommendation
pub async fn show_pattern(item_name: &str) -> Result<()> {
    let db_path = config::db_path()?;
    let patterns = PatternStore::open(&db_path)?;

    let Some(pattern) = patterns.get(item_name)? else {
        println!(
            "No pattern learned yet for '{}'. Run 'larder learn {}' first.",
            item_name, item_name
        );
        return Ok(());
    };

    println!("Pattern for '{}'", pattern.item_name);
    println!("{}", "-".repeat(40));
    println!("Average weekly usage: {:.1} {}", pattern.average_weekly_usage, pattern.unit);
    if let Some(serving) = pattern.average_serving_size {
        println!("Average serving size: {:.2} {}", serving, pattern.unit);
    }
    println!("Waste: {:.1}%", pattern.waste_percentage);
    println!("Trend: {}", pattern.trend);
    println!("Confidence: {:.2}", pattern.confidence_score);
    println!("Data points: {}", pattern.data_points);
    println!(
        "Weekly history: {}",
        pattern
            .weekly_history
            .iter()
            .map(|v| format!("{:.1}", v))
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Last updated: {}", pattern.last_updated.format("%Y-%m-%d %H:%M UTC"));
    println!();
    println!("Recommendation: {}", engine::generate_recommendation(&pattern));

    Ok(())
}

/// Show the household-level summary across all learned patterns
pub async fn show_summary() -> Result<()> {
    let cfg = Config::load(&config::larder_dir()?.join("config.toml"))?;
    let db_path = config::db_path()?;

    let patterns = PatternStore::open(&db_path)?.get_all()?;

    if patterns.is_empty() {
        println!("No patterns learned yet. Run 'larder learn-all' first.");
        return Ok(());
    }

    let summary = summary::build_summary(&patterns, cfg.summary.max_recommendations);

    println!("Consumption Summary");
    println!("===================");
    println!();
    println!("Items tracked: {}", summary.total_items);
    println!("High confidence (>0.7): {}", summary.items_with_high_confidence);
    println!("Trends:");
    println!("  increasing: {}", summary.items_with_trend.increasing);
    println!("  decreasing: {}", summary.items_with_trend.decreasing);
    println!("  stable: {}", summary.items_with_trend.stable);
    println!("Average waste: {:.1}%", summary.average_waste_percentage);

    if !summary.recommendations.is_empty() {
        println!();
        println!("Recommendations:");
        for recommendation in &summary.recommendations {
            println!("  - {}", recommendation);
        }
    }

    Ok(())
}

fn learn_and_store(
    patterns: &PatternStore,
    item_name: &str,
    records: &[ConsumptionRecord],
) -> Result<LearningResult> {
    let existing = patterns.get(item_name)?;
    let pattern = engine::learn_pattern(item_name, records, existing.as_ref());
    patterns.save(&pattern)?;

    let recommendation = engine::generate_recommendation(&pattern);

    Ok(LearningResult {
        item_name: item_name.to_string(),
        previous_average: existing.map(|p| p.average_weekly_usage).unwrap_or(0.0),
        new_average: pattern.average_weekly_usage,
        trend: pattern.trend,
        confidence_score: pattern.confidence_score,
        recommendation,
    })
}

fn print_result(result: &LearningResult) {
    println!("✅ Learned pattern for '{}'", result.item_name);
    println!(
        "   Average weekly usage: {:.1} (was {:.1})",
        result.new_average, result.previous_average
    );
    println!("   Trend: {}", result.trend);
    println!("   Confidence: {:.2}", result.confidence_score);
    println!("   Recommendation: {}", result.recommendation);
}
