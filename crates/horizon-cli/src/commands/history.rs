//! `horizon history` — dump a model's stored evaluations.

use anyhow::bail;
use horizon_core::StoredEvaluation;
use horizon_predict::retention;

use super::{load_config, open_store};

pub fn history(config_path: &str, model: &str, db: Option<&str>) -> anyhow::Result<()> {
    let evaluations = load(config_path, model, db)?;
    println!("{}", serde_json::to_string_pretty(&evaluations)?);
    Ok(())
}

/// Stored evaluations of `model`, oldest first.
pub fn load(config_path: &str, model: &str, db: Option<&str>) -> anyhow::Result<Vec<StoredEvaluation>> {
    let config = load_config(config_path)?;
    if config.model(model).is_none() {
        bail!("model '{model}' is not configured in {config_path}");
    }
    let store = open_store(&config, db)?;
    let mut evaluations = store.get_all(model)?;
    retention::sort_oldest_first(&mut evaluations);
    Ok(evaluations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_core::Evaluation;
    use horizon_state::EvaluationStore;
    use std::fs;

    const CONFIG: &str = r#"
[[models]]
type = "Linear"
name = "simple-linear"
[models.linear]
lookAhead = 0
storedValues = 5
"#;

    #[test]
    fn lists_history_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("horizon.toml");
        fs::write(&config, CONFIG).unwrap();
        let db = dir.path().join("store.redb");

        {
            let store = EvaluationStore::open(&db).unwrap();
            store.add_with_created("simple-linear", &Evaluation::new(2), 2000).unwrap();
            store.add_with_created("simple-linear", &Evaluation::new(1), 1000).unwrap();
        }

        let evaluations = load(config.to_str().unwrap(), "simple-linear", db.to_str()).unwrap();
        let replicas: Vec<u32> = evaluations.iter().map(|e| e.target_replicas()).collect();
        assert_eq!(replicas, vec![1, 2]);
    }

    #[test]
    fn unknown_model_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("horizon.toml");
        fs::write(&config, CONFIG).unwrap();
        let db = dir.path().join("store.redb");

        let err = load(config.to_str().unwrap(), "missing", db.to_str()).unwrap_err();
        assert!(err.to_string().contains("not configured"));
    }
}
