//! Persistence layer.
//!
//! Saves a finished simulation (parameters plus the raw trial table) to a
//! JSON file and loads it back, so stored tables can be re-aggregated
//! without simulating again.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};
use uuid::Uuid;

use crate::types::TrialResults;

/// Default results file path.
const DEFAULT_RESULTS_FILE: &str = "bandit_results.json";

/// A stored simulation invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub runs: usize,
    pub epochs: usize,
    pub recommendation_size: usize,
    pub results: TrialResults,
}

impl SimulationRecord {
    pub fn new(runs: usize, epochs: usize, recommendation_size: usize, results: TrialResults) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            runs,
            epochs,
            recommendation_size,
            results,
        }
    }
}

/// Save a simulation record to a JSON file.
pub fn save_record(record: &SimulationRecord, path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_RESULTS_FILE);
    let json = serde_json::to_string_pretty(record)
        .context("Failed to serialise simulation record")?;

    std::fs::write(path, &json)
        .context(format!("Failed to write results to {path}"))?;

    debug!(path, id = %record.id, strategies = record.results.len(), "Results saved");
    Ok(())
}

/// Load a simulation record from a JSON file.
/// Returns None if the file doesn't exist.
pub fn load_record(path: Option<&str>) -> Result<Option<SimulationRecord>> {
    let path = path.unwrap_or(DEFAULT_RESULTS_FILE);

    if !Path::new(path).exists() {
        info!(path, "No saved results found");
        return Ok(None);
    }

    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read results from {path}"))?;

    let record: SimulationRecord = serde_json::from_str(&json)
        .context(format!("Failed to parse results from {path}"))?;

    info!(
        path,
        id = %record.id,
        runs = record.runs,
        epochs = record.epochs,
        strategies = record.results.len(),
        "Results loaded from disk"
    );

    Ok(Some(record))
}

/// Delete the results file.
pub fn delete_record(path: Option<&str>) -> Result<()> {
    let path = path.unwrap_or(DEFAULT_RESULTS_FILE);
    if Path::new(path).exists() {
        std::fs::remove_file(path)
            .context(format!("Failed to delete results file {path}"))?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
