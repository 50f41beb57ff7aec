//! Built-in least-squares routine behind the default linear algorithm.
//!
//! Reads the same JSON value the linear predictor hands to its runner and
//! answers with a single replica count.

use serde::{Deserialize, Serialize};

use horizon_core::StoredEvaluation;

use crate::error::{PredictError, PredictResult};

/// Value passed to a linear regression algorithm.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionParameters {
    /// Milliseconds past the latest evaluation to project to.
    pub look_ahead: u64,
    pub evaluations: Vec<StoredEvaluation>,
}

/// Fit `replicas = slope * created + intercept` and evaluate it `look_ahead`
/// milliseconds after the most recent evaluation.
///
/// When every evaluation shares one timestamp the line is undefined and
/// the mean is returned instead.
pub fn predict(params: &RegressionParameters) -> PredictResult<u32> {
    let evaluations = &params.evaluations;
    if evaluations.is_empty() {
        return Err(PredictError::InsufficientData(
            "no evaluations provided for linear regression".to_string(),
        ));
    }

    // Offsets from the earliest point keep the sums well inside f64 precision.
    let origin = evaluations.iter().map(|e| e.created).min().unwrap_or(0);
    let points: Vec<(f64, f64)> = evaluations
        .iter()
        .map(|e| ((e.created - origin) as f64, e.target_replicas() as f64))
        .collect();

    let n = points.len() as f64;
    let mean_x = points.iter().map(|(x, _)| x).sum::<f64>() / n;
    let mean_y = points.iter().map(|(_, y)| y).sum::<f64>() / n;
    let sxx: f64 = points.iter().map(|(x, _)| (x - mean_x).powi(2)).sum();
    let sxy: f64 = points.iter().map(|(x, y)| (x - mean_x) * (y - mean_y)).sum();

    let latest = points.iter().map(|(x, _)| *x).fold(f64::MIN, f64::max);
    let target = latest + params.look_ahead as f64;

    let predicted = if sxx == 0.0 {
        mean_y
    } else {
        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        intercept + slope * target
    };

    if !predicted.is_finite() {
        return Err(PredictError::Computation(format!(
            "linear regression produced non-finite value {predicted}"
        )));
    }
    Ok(predicted.round().max(0.0) as u32)
}
