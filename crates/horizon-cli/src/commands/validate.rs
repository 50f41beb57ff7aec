use super::load_config;

pub fn validate(config_path: &str) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    println!(
        "✓ {config_path}: {} model(s), decision type {}",
        config.models.len(),
        config.decision_type.as_str()
    );
    Ok(())
}
