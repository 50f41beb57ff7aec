//! `horizon evaluate` — run one prediction cycle for the evaluation on stdin.

use std::io::Read;
use std::sync::Arc;

use anyhow::Context;
use horizon_autoscale::{PredictiveScaler, StaticEvaluator};
use horizon_core::Evaluation;
use horizon_predict::{HttpFetcher, ModelPredict, ProcessRunner};
use tracing::debug;

use super::{load_config, open_store};

pub async fn evaluate(config_path: &str, db: Option<&str>) -> anyhow::Result<()> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("reading evaluation from stdin")?;

    let output = run(config_path, db, &input).await?;
    println!("{output}");
    Ok(())
}

/// Run a cycle over `input` and return the resulting evaluation as JSON.
pub async fn run(config_path: &str, db: Option<&str>, input: &str) -> anyhow::Result<String> {
    let current: Evaluation = serde_json::from_str(input.trim())
        .with_context(|| format!("parsing evaluation '{}'", input.trim()))?;

    let config = load_config(config_path)?;
    let store = open_store(&config, db)?;
    let predict = ModelPredict::with_defaults(
        Arc::new(ProcessRunner::new()),
        Arc::new(HttpFetcher::new()),
    );
    let scaler = PredictiveScaler::new(config, store, predict, Arc::new(StaticEvaluator(current)));

    let outcome = scaler.evaluate(&[]).await?;
    debug!(predictions = ?outcome.predictions, "cycle predictions");

    Ok(serde_json::to_string(&Evaluation::new(outcome.target_replicas))?)
}
