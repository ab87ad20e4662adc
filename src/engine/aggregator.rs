//! Results aggregation.
//!
//! Condenses the raw `runs × epochs` payout table of every strategy into a
//! single per-epoch curve (average or cumulative average), and ranks
//! strategies by where their curves end.

use std::cmp::Ordering;

use crate::types::{AggregatedSeries, AggregationMode, SimError, StrategySeries, TrialResults};

/// Aggregate the first `runs` runs and `epochs` epochs of every strategy.
///
/// `average[e]` is the mean over runs of epoch `e`; in cumulative mode the
/// output is the running sum of that mean. The input table is never
/// modified, so repeated calls return identical series.
pub fn aggregate(
    results: &TrialResults,
    runs: usize,
    epochs: usize,
    mode: AggregationMode,
) -> Result<AggregatedSeries, SimError> {
    if runs == 0 && epochs > 0 {
        return Err(SimError::InvalidParameter(
            "cannot average over zero runs".to_string(),
        ));
    }

    let mut series = Vec::with_capacity(results.len());
    for trials in results.iter() {
        if trials.runs.len() < runs {
            return Err(SimError::ShapeMismatch {
                strategy: trials.strategy_id.clone(),
                expected: format!("{runs} runs"),
                found: format!("{} runs", trials.runs.len()),
            });
        }
        if let Some((r, short)) = trials.runs[..runs]
            .iter()
            .enumerate()
            .find(|(_, run)| run.len() < epochs)
        {
            return Err(SimError::ShapeMismatch {
                strategy: trials.strategy_id.clone(),
                expected: format!("{epochs} epochs"),
                found: format!("{} epochs in run {r}", short.len()),
            });
        }

        let average: Vec<f64> = (0..epochs)
            .map(|e| trials.runs[..runs].iter().map(|run| run[e]).sum::<f64>() / runs as f64)
            .collect();

        let values = match mode {
            AggregationMode::Average => average,
            AggregationMode::Cumulative => cumulative(&average),
        };
        series.push(StrategySeries {
            strategy_id: trials.strategy_id.clone(),
            values,
        });
    }

    Ok(AggregatedSeries { mode, series })
}

/// Running sum: `out[0] = xs[0]`, `out[e] = out[e-1] + xs[e]`.
fn cumulative(xs: &[f64]) -> Vec<f64> {
    xs.iter()
        .scan(0.0, |acc, &x| {
            *acc += x;
            Some(*acc)
        })
        .collect()
}

/// Strategy ids with their final aggregated value, highest first.
///
/// Ties keep simulation order; strategies whose series is empty or ends in
/// NaN come last.
pub fn rank(aggregated: &AggregatedSeries) -> Vec<(&str, f64)> {
    let mut ranked: Vec<(&str, Option<f64>)> = aggregated
        .iter()
        .map(|s| (s.strategy_id.as_str(), s.final_value()))
        .collect();

    // NaN-free keys keep the comparator a total order
    let key = |v: Option<f64>| v.filter(|x| !x.is_nan());
    ranked.sort_by(|a, b| match (key(a.1), key(b.1)) {
        (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });

    ranked
        .into_iter()
        .map(|(id, v)| (id, v.unwrap_or(f64::NAN)))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
