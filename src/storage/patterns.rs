//! Learned pattern storage and retrieval
//!
//! One pattern per item name. Relearning replaces the whole row,
//! never a partial update.

use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Direction of change between recent and older weekly usage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Increasing => "increasing",
            Trend::Decreasing => "decreasing",
            Trend::Stable => "stable",
        }
    }
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unrecognized trend: {0}")]
pub struct ParseTrendError(String);

impl FromStr for Trend {
    type Err = ParseTrendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "increasing" => Ok(Trend::Increasing),
            "decreasing" => Ok(Trend::Decreasing),
            "stable" => Ok(Trend::Stable),
            other => Err(ParseTrendError(other.to_string())),
        }
    }
}

/// A learned consumption pattern for one item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumptionPattern {
    pub item_name: String,
    /// Smoothed estimate of typical weekly consumption, in `unit`
    pub average_weekly_usage: f64,
    pub unit: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average_serving_size: Option<f64>,
    /// Share of handled quantity (used + wasted) that was wasted, 0-100
    pub waste_percentage: f64,
    /// Reliability of the average given data volume and variance, 0-1
    pub confidence_score: f64,
    /// Number of raw history records behind this pattern
    pub data_points: usize,
    pub trend: Trend,
    /// Weekly totals, oldest first, at most the last 12 weeks
    pub weekly_history: Vec<f64>,
    pub last_updated: DateTime<Utc>,
}

/// Pattern store backed by SQLite
pub struct PatternStore {
    conn: Connection,
}

impl PatternStore {
    /// Open a pattern store at the given database path
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Ok(Self { conn })
    }

    /// Save a pattern, replacing any previous pattern for the same item
    pub fn save(&self, pattern: &ConsumptionPattern) -> Result<()> {
        let weekly_history = serde_json::to_string(&pattern.weekly_history)?;

        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO patterns
            (item_name, average_weekly_usage, unit, average_serving_size,
             waste_percentage, confidence_score, data_points, trend,
             weekly_history, last_updated)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                pattern.item_name,
                pattern.average_weekly_usage,
                pattern.unit,
                pattern.average_serving_size,
                pattern.waste_percentage,
                pattern.confidence_score,
                pattern.data_points as i64,
                pattern.trend.as_str(),
                weekly_history,
                pattern.last_updated,
            ],
        )?;

        Ok(())
    }

    /// Get the stored pattern for an item, if one has been learned
    pub fn get(&self, item_name: &str) -> Result<Option<ConsumptionPattern>> {
        let mut stmt = self.conn.prepare_cached(
            r#"
            SELECT item_name, average_weekly_usage, unit, average_serving_size,
                   waste_percentage, confidence_score, data_points, trend,
                   weekly_history, last_updated
            FROM patterns
            WHERE item_name = ?1
            "#,
        )?;

        let mut rows = stmt.query(params![item_name])?;

        match rows.next()? {
            Some(row) => Ok(Some(row_to_pattern(row)?)),
            None => Ok(None),
        }
    }

    /// Get all stored patterns, ordered by item name
    pub fn get_all(&self) -> Result<Vec<ConsumptionPattern>> {
        let mut stmt = self.conn.prepare_cached(
            r#"
            SELECT item_name, average_weekly_usage, unit, average_serving_size,
                   waste_percentage, confidence_score, data_points, trend,
                   weekly_history, last_updated
            FROM patterns
            ORDER BY item_name
            "#,
        )?;

        let patterns = stmt.query_map([], |row| row_to_pattern(row))?;
        patterns.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Get total pattern count
    pub fn count(&self) -> Result<i64> {
        self.conn
            .query_row("SELECT COUNT(*) FROM patterns", [], |row| row.get(0))
            .map_err(Into::into)
    }
}

fn row_to_pattern(row: &rusqlite::Row<'_>) -> rusqlite::Result<ConsumptionPattern> {
    let trend: String = row.get(7)?;
    let trend = trend.parse::<Trend>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(7, rusqlite::types::Type::Text, Box::new(e))
    })?;

    let weekly_history: String = row.get(8)?;
    let weekly_history: Vec<f64> = serde_json::from_str(&weekly_history).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(8, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(ConsumptionPattern {
        item_name: row.get(0)?,
        average_weekly_usage: row.get(1)?,
        unit: row.get(2)?,
        average_serving_size: row.get(3)?,
        waste_percentage: row.get(4)?,
        confidence_score: row.get(5)?,
        data_points: row.get::<_, i64>(6)? as usize,
        trend,
        weekly_history,
        last_updated: row.get(9)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::create_schema;
    use tempfile::TempDir;

    fn sample_pattern() -> ConsumptionPattern {
        ConsumptionPattern {
            item_name: "Milk".into(),
            average_weekly_usage: 4.2,
            unit: "liters".into(),
            average_serving_size: Some(0.25),
            waste_percentage: 5.0,
            confidence_score: 0.8,
            data_points: 14,
            trend: Trend::Increasing,
            weekly_history: vec![3.0, 4.0, 4.5, 5.0],
            last_updated: Utc::now(),
        }
    }

    fn open_store(dir: &TempDir) -> PatternStore {
        let db_path = dir.path().join("larder.sqlite");
        let conn = Connection::open(&db_path).unwrap();
        create_schema(&conn).unwrap();
        PatternStore::open(&db_path).unwrap()
    }

    #[test]
    fn test_save_and_get_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let pattern = sample_pattern();
        store.save(&pattern).unwrap();

        let loaded = store.get("Milk").unwrap().expect("pattern should exist");
        assert_eq!(loaded.item_name, "Milk");
        assert_eq!(loaded.unit, "liters");
        assert_eq!(loaded.trend, Trend::Increasing);
        assert_eq!(loaded.data_points, 14);
        assert_eq!(loaded.weekly_history, vec![3.0, 4.0, 4.5, 5.0]);
        assert!((loaded.average_weekly_usage - 4.2).abs() < 1e-9);
        assert_eq!(loaded.average_serving_size, Some(0.25));
    }

    #[test]
    fn test_save_replaces_whole_row() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);

        let mut pattern = sample_pattern();
        store.save(&pattern).unwrap();

        pattern.average_weekly_usage = 6.0;
        pattern.trend = Trend::Stable;
        pattern.average_serving_size = None;
        store.save(&pattern).unwrap();

        assert_eq!(store.count().unwrap(), 1);
        let loaded = store.get("Milk").unwrap().unwrap();
        assert!((loaded.average_weekly_usage - 6.0).abs() < 1e-9);
        assert_eq!(loaded.trend, Trend::Stable);
        assert_eq!(loaded.average_serving_size, None);
    }

    #[test]
    fn test_get_missing_is_none() {
        let dir = TempDir::new().unwrap();
        let store = open_store(&dir);
        assert!(store.get("Bread").unwrap().is_none());
    }

    #[test]
    fn test_trend_parse() {
        assert_eq!("increasing".parse::<Trend>().unwrap(), Trend::Increasing);
        assert_eq!("stable".parse::<Trend>().unwrap(), Trend::Stable);
        assert!("sideways".parse::<Trend>().is_err());
    }
}
