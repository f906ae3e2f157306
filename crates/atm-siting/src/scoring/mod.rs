//! Weighted composite scoring over the factors a commune row carries.

pub mod factors;
mod weights;

pub use weights::{Factor, WeightScheme};

use crate::layers::IndicatorRow;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScoreError {
    #[error("no usable factors to score '{commune}'")]
    InsufficientData { commune: String },
    #[error("weight for {factor} must be a finite value in [0, 1], got {weight}")]
    InvalidWeight { factor: Factor, weight: f64 },
}

/// Composite score with its per-factor breakdown, all on a 0-100 scale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreResult {
    pub score: f64,
    pub normalized: BTreeMap<Factor, f64>,
    pub weights: BTreeMap<Factor, f64>,
    pub contributions: BTreeMap<Factor, f64>,
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Score `row` under `scheme`, renormalizing weights over the factors the
/// row actually carries.
pub fn score(row: &IndicatorRow, scheme: &WeightScheme) -> Result<ScoreResult, ScoreError> {
    let available: Vec<(Factor, f64, f64)> = scheme
        .iter()
        .filter_map(|(factor, weight)| {
            factors::factor_value(row, factor).map(|value| (factor, weight, value))
        })
        .collect();

    let total_weight: f64 = available.iter().map(|(_, weight, _)| weight).sum();
    if available.is_empty() || total_weight <= 0.0 {
        return Err(ScoreError::InsufficientData {
            commune: row.label().to_string(),
        });
    }

    let mut result = ScoreResult {
        score: 0.0,
        normalized: BTreeMap::new(),
        weights: BTreeMap::new(),
        contributions: BTreeMap::new(),
    };
    let mut raw_score = 0.0;

    for (factor, weight, value) in available {
        let effective = weight / total_weight;
        let contribution = effective * value;
        raw_score += contribution;

        result.normalized.insert(factor, round2(value * 100.0));
        result.weights.insert(factor, round2(effective * 100.0));
        result.contributions.insert(factor, round2(contribution * 100.0));
    }
    result.score = round2((raw_score * 100.0).clamp(0.0, 100.0));

    debug!(
        commune = row.label(),
        scheme = scheme.name(),
        factors = result.weights.len(),
        score = result.score,
        "scored commune"
    );

    Ok(result)
}
