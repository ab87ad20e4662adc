//! Reporting — console listing and chart data export.
//!
//! Nothing here renders a chart. The plot export is a JSON document with one
//! labelled line per strategy plus the requested axis scale; any plotting
//! front end can draw it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use tracing::info;

use crate::engine::aggregator::rank;
use crate::types::{AggregatedSeries, AggregationMode, Scale};

/// Listing of every strategy's final value, best first.
pub fn format_aggregated_results(aggregated: &AggregatedSeries) -> String {
    let mut out = String::from("\nAggregated results:\n\n");
    for (strategy_id, value) in rank(aggregated) {
        let _ = writeln!(out, "{strategy_id}: {value:?}");
    }
    out
}

/// Print [`format_aggregated_results`] to stdout.
pub fn print_aggregated_results(aggregated: &AggregatedSeries) {
    print!("{}", format_aggregated_results(aggregated));
}

// ---------------------------------------------------------------------------
// Plot export
// ---------------------------------------------------------------------------

/// One line of the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotLine {
    pub label: String,
    pub values: Vec<f64>,
}

/// Everything a line-chart renderer needs: x is the epoch index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSpec {
    pub mode: AggregationMode,
    pub scale: Scale,
    pub series: Vec<PlotLine>,
}

impl PlotSpec {
    pub fn new(aggregated: &AggregatedSeries, scale: Scale) -> Self {
        Self {
            mode: aggregated.mode,
            scale,
            series: aggregated
                .iter()
                .map(|s| PlotLine {
                    label: s.strategy_id.clone(),
                    values: s.values.clone(),
                })
                .collect(),
        }
    }

    /// Whether every value can be drawn on the requested axis. A log axis
    /// cannot show zero or negative values.
    pub fn is_drawable(&self) -> bool {
        match self.scale {
            Scale::Linear => true,
            Scale::Log => self
                .series
                .iter()
                .flat_map(|l| l.values.iter())
                .all(|&v| v > 0.0),
        }
    }
}

/// Write the plot spec as pretty JSON.
pub fn write_plot(path: impl AsRef<Path>, aggregated: &AggregatedSeries, scale: Scale) -> Result<()> {
    let path = path.as_ref();
    let spec = PlotSpec::new(aggregated, scale);
    let json = serde_json::to_string_pretty(&spec).context("Failed to serialise plot spec")?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write plot spec to {}", path.display()))?;
    info!(path = %path.display(), lines = spec.series.len(), scale = %scale, "Plot spec written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
