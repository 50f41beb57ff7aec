//! Predictive configuration parser (`horizon.toml`).

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::ConfigError;

pub const DEFAULT_DB_PATH: &str = "horizon.redb";
pub const DEFAULT_ALGORITHM_PATH: &str = "horizon-linear-regression";
pub const DEFAULT_CALCULATION_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_MAX_CONCURRENT_PREDICTIONS: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveConfig {
    #[serde(default)]
    pub decision_type: DecisionType,
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_max_concurrent_predictions")]
    pub max_concurrent_predictions: usize,
    /// Metric selection for the metric gatherer. Carried through untouched.
    pub metrics: Option<toml::Value>,
    #[serde(default)]
    pub models: Vec<Model>,
}

/// A single predictive model instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(rename = "type")]
    pub model_type: ModelType,
    pub name: String,
    /// Produce a prediction every `per_interval` cycles.
    #[serde(default = "default_per_interval")]
    pub per_interval: u32,
    /// Upper bound on the external calculation, in milliseconds.
    pub calculation_timeout: Option<u64>,
    pub linear: Option<Linear>,
    pub holt_winters: Option<HoltWinters>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    Linear,
    HoltWinters,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::Linear => "Linear",
            ModelType::HoltWinters => "HoltWinters",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Linear {
    /// How far past the latest evaluation to project, in milliseconds.
    #[serde(default)]
    pub look_ahead: u64,
    pub stored_values: usize,
    pub algorithm_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HoltWinters {
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub gamma: Option<f64>,
    /// Length of one season, in evaluations.
    pub seasonal_periods: usize,
    /// Number of full seasons kept in history.
    pub stored_seasons: usize,
    #[serde(default)]
    pub trend: SmoothingMethod,
    #[serde(default)]
    pub seasonal: SmoothingMethod,
    pub runtime_tuning_fetch_hook: Option<TuningFetchHook>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmoothingMethod {
    #[default]
    #[serde(alias = "add")]
    Additive,
    #[serde(alias = "mul")]
    Multiplicative,
}

/// HTTP hook that supplies Holt-Winters coefficients at prediction time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TuningFetchHook {
    #[serde(default = "default_hook_method")]
    pub method: String,
    pub url: String,
    /// Request timeout in milliseconds.
    pub timeout: u64,
    #[serde(default = "default_success_codes")]
    pub success_codes: Vec<u16>,
    #[serde(default)]
    pub parameter_mode: ParameterMode,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterMode {
    #[default]
    Query,
    Body,
}

/// How the current evaluation and the model predictions are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DecisionType {
    #[default]
    Maximum,
    Minimum,
    Mean,
}

impl DecisionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionType::Maximum => "maximum",
            DecisionType::Minimum => "minimum",
            DecisionType::Mean => "mean",
        }
    }
}

impl FromStr for DecisionType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "maximum" => Ok(DecisionType::Maximum),
            "minimum" => Ok(DecisionType::Minimum),
            "mean" => Ok(DecisionType::Mean),
            other => Err(ConfigError::UnknownDecisionType(other.to_string())),
        }
    }
}

impl TryFrom<String> for DecisionType {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DecisionType> for String {
    fn from(value: DecisionType) -> Self {
        value.as_str().to_string()
    }
}

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_max_concurrent_predictions() -> usize {
    DEFAULT_MAX_CONCURRENT_PREDICTIONS
}

fn default_per_interval() -> u32 {
    1
}

fn default_hook_method() -> String {
    "GET".to_string()
}

fn default_success_codes() -> Vec<u16> {
    vec![200]
}

impl Model {
    /// Timeout for the external calculation, falling back to the default.
    pub fn calculation_timeout_ms(&self) -> u64 {
        self.calculation_timeout
            .unwrap_or(DEFAULT_CALCULATION_TIMEOUT_MS)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyModelName);
        }
        if self.per_interval == 0 {
            return Err(ConfigError::InvalidParameter {
                model: self.name.clone(),
                reason: "perInterval must be at least 1".to_string(),
            });
        }
        match self.model_type {
            ModelType::Linear => {
                let linear = self.linear.as_ref().ok_or_else(|| ConfigError::MissingBlock {
                    model: self.name.clone(),
                    model_type: self.model_type,
                })?;
                if linear.stored_values == 0 {
                    return Err(ConfigError::InvalidParameter {
                        model: self.name.clone(),
                        reason: "storedValues must be at least 1".to_string(),
                    });
                }
            }
            ModelType::HoltWinters => {
                let hw = self
                    .holt_winters
                    .as_ref()
                    .ok_or_else(|| ConfigError::MissingBlock {
                        model: self.name.clone(),
                        model_type: self.model_type,
                    })?;
                if hw.seasonal_periods == 0 {
                    return Err(ConfigError::InvalidParameter {
                        model: self.name.clone(),
                        reason: "seasonalPeriods must be at least 1".to_string(),
                    });
                }
                // Forecasting needs two full seasons, so fewer could never predict.
                if hw.stored_seasons < 2 {
                    return Err(ConfigError::InvalidParameter {
                        model: self.name.clone(),
                        reason: "storedSeasons must be at least 2".to_string(),
                    });
                }
                let any_static = hw.alpha.is_some() || hw.beta.is_some() || hw.gamma.is_some();
                if any_static == hw.runtime_tuning_fetch_hook.is_some() {
                    return Err(ConfigError::InvalidParameter {
                        model: self.name.clone(),
                        reason: "exactly one of alpha/beta/gamma or runtimeTuningFetchHook must be set"
                            .to_string(),
                    });
                }
                if let Some(hook) = &hw.runtime_tuning_fetch_hook {
                    let scheme = hook.url.split_once("://").map(|(scheme, _)| scheme);
                    if !scheme.is_some_and(|s| s.eq_ignore_ascii_case("http")) {
                        return Err(ConfigError::InvalidParameter {
                            model: self.name.clone(),
                            reason: format!(
                                "runtimeTuningFetchHook url '{}' must be an http:// url",
                                hook.url
                            ),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

impl PredictiveConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: PredictiveConfig = toml::from_str(content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check model names and type-specific parameter blocks.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for model in &self.models {
            model.validate()?;
            if !seen.insert(model.name.as_str()) {
                return Err(ConfigError::DuplicateModel(model.name.clone()));
            }
        }
        if self.max_concurrent_predictions == 0 {
            return Err(ConfigError::InvalidParameter {
                model: String::new(),
                reason: "maxConcurrentPredictions must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
decisionType = "mean"
dbPath = "/tmp/horizon-test.redb"

[metrics]
resource = "cpu"

[[models]]
type = "Linear"
name = "simple-linear"
perInterval = 1
[models.linear]
lookAhead = 10000
storedValues = 6

[[models]]
type = "HoltWinters"
name = "seasonal"
perInterval = 2
[models.holtWinters]
seasonalPeriods = 6
storedSeasons = 4
trend = "add"
seasonal = "multiplicative"
[models.holtWinters.runtimeTuningFetchHook]
url = "http://tuning:5000/coefficients"
timeout = 2500
parameterMode = "body"
"#;

    #[test]
    fn parse_full_config() {
        let config = PredictiveConfig::from_toml_str(FULL).unwrap();
        assert_eq!(config.decision_type, DecisionType::Mean);
        assert_eq!(config.db_path, "/tmp/horizon-test.redb");
        assert_eq!(config.models.len(), 2);
        assert!(config.metrics.is_some());

        let linear = config.model("simple-linear").unwrap();
        assert_eq!(linear.model_type, ModelType::Linear);
        assert_eq!(linear.linear.as_ref().unwrap().stored_values, 6);
        assert_eq!(linear.calculation_timeout_ms(), DEFAULT_CALCULATION_TIMEOUT_MS);

        let hw = config.model("seasonal").unwrap().holt_winters.as_ref().unwrap();
        assert_eq!(hw.trend, SmoothingMethod::Additive);
        assert_eq!(hw.seasonal, SmoothingMethod::Multiplicative);
        let hook = hw.runtime_tuning_fetch_hook.as_ref().unwrap();
        assert_eq!(hook.method, "GET");
        assert_eq!(hook.success_codes, vec![200]);
        assert_eq!(hook.parameter_mode, ParameterMode::Body);

        config.validate().unwrap();
    }

    #[test]
    fn parse_minimal_uses_defaults() {
        let config = PredictiveConfig::from_toml_str("").unwrap();
        assert!(config.models.is_empty());
        assert_eq!(config.decision_type, DecisionType::Maximum);
        assert_eq!(config.db_path, DEFAULT_DB_PATH);
        assert_eq!(config.max_concurrent_predictions, DEFAULT_MAX_CONCURRENT_PREDICTIONS);
    }

    #[test]
    fn unknown_decision_type_is_rejected() {
        let err = "median".parse::<DecisionType>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownDecisionType(ref s) if s == "median"));
        assert!(PredictiveConfig::from_toml_str("decisionType = \"median\"").is_err());
    }

    #[test]
    fn decision_type_round_trips_through_toml() {
        let mut config = PredictiveConfig::from_toml_str(FULL).unwrap();
        config.decision_type = DecisionType::Minimum;
        let rendered = config.to_toml_string().unwrap();
        assert!(rendered.contains("decisionType = \"minimum\""));
        let reparsed = PredictiveConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(reparsed, config);
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let mut config = PredictiveConfig::from_toml_str(FULL).unwrap();
        config.models[1].name = "simple-linear".to_string();
        config.models[1].model_type = ModelType::Linear;
        config.models[1].linear = config.models[0].linear.clone();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::DuplicateModel(ref name)) if name == "simple-linear"
        ));
    }

    #[test]
    fn validate_rejects_missing_block() {
        let mut config = PredictiveConfig::from_toml_str(FULL).unwrap();
        config.models[0].linear = None;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingBlock { model_type: ModelType::Linear, .. })
        ));
    }

    #[test]
    fn validate_rejects_static_and_hook_together() {
        let mut config = PredictiveConfig::from_toml_str(FULL).unwrap();
        let hw = config.models[1].holt_winters.as_mut().unwrap();
        hw.alpha = Some(0.5);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter { ref model, .. }) if model == "seasonal"
        ));
    }

    #[test]
    fn validate_rejects_non_http_hook_url() {
        for url in ["https://tuning:5000/coefficients", "tuning:5000/coefficients"] {
            let mut config = PredictiveConfig::from_toml_str(FULL).unwrap();
            let hook = config.models[1]
                .holt_winters
                .as_mut()
                .unwrap()
                .runtime_tuning_fetch_hook
                .as_mut()
                .unwrap();
            hook.url = url.to_string();

            let err = config.validate().unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidParameter { ref reason, .. } if reason.contains(url)),
                "{url} gave {err}"
            );
        }
    }

    #[test]
    fn validate_rejects_zero_per_interval() {
        let mut config = PredictiveConfig::from_toml_str(FULL).unwrap();
        config.models[0].per_interval = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_file_reads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("horizon.toml");
        std::fs::write(&path, FULL).unwrap();

        let config = PredictiveConfig::from_file(&path).unwrap();
        assert_eq!(config.models.len(), 2);
    }
}
