pub mod evaluate;
pub mod history;
pub mod validate;

use std::path::Path;

use anyhow::Context;
use horizon_core::PredictiveConfig;
use horizon_state::EvaluationStore;

/// Load and validate a predictive configuration file.
pub fn load_config(path: &str) -> anyhow::Result<PredictiveConfig> {
    let config = PredictiveConfig::from_file(Path::new(path))
        .with_context(|| format!("loading {path}"))?;
    config.validate().with_context(|| format!("validating {path}"))?;
    Ok(config)
}

/// Open the evaluation store, preferring `db` over the configured path.
pub fn open_store(config: &PredictiveConfig, db: Option<&str>) -> anyhow::Result<EvaluationStore> {
    let path = db.unwrap_or(&config.db_path);
    EvaluationStore::open(Path::new(path)).with_context(|| format!("opening store {path}"))
}
