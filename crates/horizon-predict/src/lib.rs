//! horizon-predict — replica forecasting for Horizon.
//!
//! Turns a model's stored evaluation history into a predicted replica
//! count and decides which old evaluations to evict.
//!
//! # Architecture
//!
//! ```text
//! ModelPredict
//!   ├── LinearPredictor       ──▶ Runner  (external regression algorithm)
//!   └── HoltWintersPredictor  ──▶ Fetcher (optional runtime tuning hook)
//! ```
//!
//! Runners and fetchers are ports: [`ProcessRunner`] and [`HttpFetcher`] are
//! the production implementations, [`fake`] holds closure-backed doubles.

pub mod error;
pub mod fake;
pub mod fetcher;
pub mod holtwinters;
pub mod linear;
pub mod predictor;
pub mod regression;
pub mod retention;
pub mod runner;

pub use error::{FetchError, PredictError, PredictResult, RunError};
pub use fetcher::{Fetcher, HttpFetcher};
pub use holtwinters::HoltWintersPredictor;
pub use linear::LinearPredictor;
pub use predictor::{BoxFuture, ModelPredict, Predictor};
pub use regression::RegressionParameters;
pub use runner::{ProcessRunner, Runner};
