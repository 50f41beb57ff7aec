//! Configuration errors.

use thiserror::Error;

use crate::config::ModelType;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown decision type '{0}', expected one of: maximum, minimum, mean")]
    UnknownDecisionType(String),

    #[error("model name must not be empty")]
    EmptyModelName,

    #[error("duplicate model name '{0}'")]
    DuplicateModel(String),

    #[error("no {model_type} configuration provided for model '{model}'")]
    MissingBlock { model: String, model_type: ModelType },

    #[error("invalid configuration for model '{model}': {reason}")]
    InvalidParameter { model: String, reason: String },
}
