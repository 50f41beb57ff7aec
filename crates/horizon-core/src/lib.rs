//! horizon-core — shared types and predictive configuration.
//!
//! Every other Horizon crate speaks in terms of [`Evaluation`] and
//! [`StoredEvaluation`], and reads its parameters from a
//! [`PredictiveConfig`] loaded from TOML.

pub mod config;
pub mod error;
pub mod types;

pub use config::{
    DecisionType, HoltWinters, Linear, Model, ModelType, ParameterMode, PredictiveConfig,
    SmoothingMethod, TuningFetchHook,
};
pub use error::ConfigError;
pub use types::*;
