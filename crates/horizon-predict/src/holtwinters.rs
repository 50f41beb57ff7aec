//! Holt-Winters predictor — triple exponential smoothing over the history.
//!
//! # Model
//!
//! ```text
//! L  = seasonal_periods
//! ℓ  = level, b = trend, s[i mod L] = seasonal index
//!
//! additive trend:         ℓ + b       multiplicative trend:    ℓ · b
//! additive seasonality:   x − s       multiplicative seasonality: x / s
//!
//! ℓ' = α · deseason(x, s) + (1 − α) · project(ℓ, b)
//! b' = β · growth(ℓ', ℓ)   + (1 − β) · b
//! s' = γ · season(x, ℓ')   + (1 − γ) · s
//!
//! forecast(h) = combine(project(ℓ, b, h), s[(n − 1 + h) mod L])
//! ```
//!
//! Coefficients are either static or fetched from a runtime tuning hook just
//! before each prediction.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use horizon_core::{HoltWinters, Model, SmoothingMethod, StoredEvaluation, TuningFetchHook};

use crate::error::{FetchError, PredictError, PredictResult};
use crate::fetcher::Fetcher;
use crate::predictor::{BoxFuture, Predictor};
use crate::retention;

pub const HOLT_WINTERS_TYPE: &str = "HoltWinters";

/// Smoothing coefficients, each within `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl Coefficients {
    fn check(&self) -> Result<(), String> {
        for (name, value) in [("alpha", self.alpha), ("beta", self.beta), ("gamma", self.gamma)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(format!("{name} must be within [0, 1], got {value}"));
            }
        }
        Ok(())
    }
}

/// Parameters of one smoothing run.
#[derive(Debug, Clone, Copy)]
pub struct Smoothing {
    pub season_length: usize,
    pub coefficients: Coefficients,
    pub trend: SmoothingMethod,
    pub seasonal: SmoothingMethod,
}

/// Value sent to a runtime tuning hook.
#[derive(Serialize)]
struct TuningRequest<'a> {
    model: &'a Model,
    evaluations: &'a [StoredEvaluation],
}

/// Body expected back from a runtime tuning hook.
#[derive(Deserialize)]
struct TuningResponse {
    alpha: Option<f64>,
    beta: Option<f64>,
    gamma: Option<f64>,
}

enum CoefficientSource<'a> {
    Static(Coefficients),
    Hook(&'a TuningFetchHook),
}

/// Forecasts with triple exponential smoothing.
pub struct HoltWintersPredictor {
    fetcher: Arc<dyn Fetcher>,
}

impl HoltWintersPredictor {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    async fn predict(&self, model: &Model, evaluations: &[StoredEvaluation]) -> PredictResult<u32> {
        let hw = holt_winters_block(model)?;
        if hw.seasonal_periods == 0 {
            return Err(PredictError::Configuration(format!(
                "seasonalPeriods must be at least 1 for model '{}'",
                model.name
            )));
        }

        let required = 2 * hw.seasonal_periods;
        if evaluations.len() < required {
            return Err(PredictError::InsufficientData(format!(
                "model '{}' has {} evaluations, Holt-Winters needs at least {required}",
                model.name,
                evaluations.len()
            )));
        }

        let source = coefficient_source(model, hw)?;
        let mut ordered = evaluations.to_vec();
        retention::sort_oldest_first(&mut ordered);

        let coefficients = match source {
            CoefficientSource::Static(c) => c,
            CoefficientSource::Hook(hook) => self.fetch_coefficients(model, hook, &ordered).await?,
        };

        let series: Vec<f64> = ordered.iter().map(|e| e.target_replicas() as f64).collect();
        let smoothing = Smoothing {
            season_length: hw.seasonal_periods,
            coefficients,
            trend: hw.trend,
            seasonal: hw.seasonal,
        };
        let horizon = model.per_interval.max(1) as usize;
        let value = forecast(&series, &smoothing, horizon)?;

        debug!(
            model = %model.name,
            value,
            horizon,
            points = series.len(),
            "holt-winters prediction"
        );
        Ok(value.round().max(0.0) as u32)
    }

    async fn fetch_coefficients(
        &self,
        model: &Model,
        hook: &TuningFetchHook,
        evaluations: &[StoredEvaluation],
    ) -> PredictResult<Coefficients> {
        let value = serde_json::to_string(&TuningRequest { model, evaluations })
            .map_err(|e| PredictError::Computation(format!("serializing tuning request: {e}")))?;
        let body = self.fetcher.fetch(hook, &value).await?;

        let response: TuningResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::MalformedBody(format!("{e}: {body}")))?;
        let missing = |name: &str| FetchError::MalformedBody(format!("no {name} in tuning response"));
        let coefficients = Coefficients {
            alpha: response.alpha.ok_or_else(|| missing("alpha"))?,
            beta: response.beta.ok_or_else(|| missing("beta"))?,
            gamma: response.gamma.ok_or_else(|| missing("gamma"))?,
        };
        coefficients.check().map_err(FetchError::MalformedBody)?;
        debug!(model = %model.name, ?coefficients, "fetched tuning coefficients");
        Ok(coefficients)
    }
}

fn holt_winters_block(model: &Model) -> PredictResult<&HoltWinters> {
    model.holt_winters.as_ref().ok_or_else(|| {
        PredictError::Configuration(format!(
            "no HoltWinters configuration provided for model '{}'",
            model.name
        ))
    })
}

fn coefficient_source<'a>(model: &Model, hw: &'a HoltWinters) -> PredictResult<CoefficientSource<'a>> {
    let config_err = |reason: String| {
        PredictError::Configuration(format!("model '{}': {reason}", model.name))
    };
    match (hw.alpha, hw.beta, hw.gamma, &hw.runtime_tuning_fetch_hook) {
        (None, None, None, Some(hook)) => Ok(CoefficientSource::Hook(hook)),
        (None, None, None, None) => Err(config_err(
            "neither alpha/beta/gamma nor runtimeTuningFetchHook is configured".to_string(),
        )),
        (_, _, _, Some(_)) => Err(config_err(
            "static alpha/beta/gamma and runtimeTuningFetchHook are mutually exclusive".to_string(),
        )),
        (Some(alpha), Some(beta), Some(gamma), None) => {
            let coefficients = Coefficients { alpha, beta, gamma };
            coefficients.check().map_err(config_err)?;
            Ok(CoefficientSource::Static(coefficients))
        }
        _ => Err(config_err("alpha, beta and gamma must all be set".to_string())),
    }
}

impl Predictor for HoltWintersPredictor {
    fn model_type(&self) -> &'static str {
        HOLT_WINTERS_TYPE
    }

    fn get_prediction<'a>(
        &'a self,
        model: &'a Model,
        evaluations: &'a [StoredEvaluation],
    ) -> BoxFuture<'a, PredictResult<u32>> {
        Box::pin(self.predict(model, evaluations))
    }

    fn get_ids_to_remove(
        &self,
        model: &Model,
        evaluations: &[StoredEvaluation],
    ) -> PredictResult<Vec<u64>> {
        let hw = holt_winters_block(model)?;
        let capacity = hw.seasonal_periods.saturating_mul(hw.stored_seasons);
        Ok(retention::ids_to_remove(evaluations, capacity))
    }
}

/// Forecast `horizon` steps past the end of `series`.
///
/// `series` must be ordered oldest first and hold at least two full seasons.
pub fn forecast(series: &[f64], smoothing: &Smoothing, horizon: usize) -> PredictResult<f64> {
    let l = smoothing.season_length;
    if l == 0 {
        return Err(PredictError::Configuration(
            "season length must be at least 1".to_string(),
        ));
    }
    if series.len() < 2 * l {
        return Err(PredictError::InsufficientData(format!(
            "{} points, need at least {}",
            series.len(),
            2 * l
        )));
    }

    let seasons = series.len() / l;
    let season_means: Vec<f64> = (0..seasons)
        .map(|s| series[s * l..(s + 1) * l].iter().sum::<f64>() / l as f64)
        .collect();

    let mut trend = match smoothing.trend {
        SmoothingMethod::Additive => {
            (0..l).map(|i| (series[l + i] - series[i]) / l as f64).sum::<f64>() / l as f64
        }
        SmoothingMethod::Multiplicative => finite(
            divide(season_means[1], season_means[0], "initial trend")?.powf(1.0 / l as f64),
            "initial trend",
        )?,
    };

    let mut seasonals = Vec::with_capacity(l);
    for i in 0..l {
        let mut total = 0.0;
        for (s, mean) in season_means.iter().enumerate() {
            let x = series[s * l + i];
            total += match smoothing.seasonal {
                SmoothingMethod::Additive => x - mean,
                SmoothingMethod::Multiplicative => divide(x, *mean, "initial seasonal index")?,
            };
        }
        seasonals.push(total / seasons as f64);
    }

    let Coefficients { alpha, beta, gamma } = smoothing.coefficients;
    let mut level = deseason(smoothing.seasonal, series[0], seasonals[0])?;

    for (i, &x) in series.iter().enumerate().skip(1) {
        let s = seasonals[i % l];
        let previous = level;

        let projected = project(smoothing.trend, previous, trend, 1);
        level = finite(
            alpha * deseason(smoothing.seasonal, x, s)? + (1.0 - alpha) * projected,
            "level",
        )?;

        let growth = match smoothing.trend {
            SmoothingMethod::Additive => level - previous,
            SmoothingMethod::Multiplicative => divide(level, previous, "trend")?,
        };
        trend = finite(beta * growth + (1.0 - beta) * trend, "trend")?;

        let observed = match smoothing.seasonal {
            SmoothingMethod::Additive => x - level,
            SmoothingMethod::Multiplicative => divide(x, level, "seasonal index")?,
        };
        seasonals[i % l] = finite(gamma * observed + (1.0 - gamma) * s, "seasonal index")?;
    }

    let h = horizon.max(1);
    let base = project(smoothing.trend, level, trend, h);
    let s = seasonals[(series.len() - 1 + h) % l];
    let value = match smoothing.seasonal {
        SmoothingMethod::Additive => base + s,
        SmoothingMethod::Multiplicative => base * s,
    };
    finite(value, "forecast")
}

fn project(method: SmoothingMethod, level: f64, trend: f64, steps: usize) -> f64 {
    match method {
        SmoothingMethod::Additive => level + steps as f64 * trend,
        SmoothingMethod::Multiplicative => level * trend.powf(steps as f64),
    }
}

fn deseason(method: SmoothingMethod, x: f64, s: f64) -> PredictResult<f64> {
    match method {
        SmoothingMethod::Additive => Ok(x - s),
        SmoothingMethod::Multiplicative => divide(x, s, "deseasonalized value"),
    }
}

fn divide(numerator: f64, denominator: f64, what: &str) -> PredictResult<f64> {
    if denominator == 0.0 {
        return Err(PredictError::Computation(format!(
            "division by zero computing {what}"
        )));
    }
    finite(numerator / denominator, what)
}

fn finite(value: f64, what: &str) -> PredictResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(PredictError::Computation(format!("{what} is not finite ({value})")))
    }
}
