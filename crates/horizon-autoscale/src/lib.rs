//! horizon-autoscale — predictive replica decisions.
//!
//! Each cycle appends the evaluator's current evaluation to every model's
//! history, forecasts from the models that are due, bounds the histories,
//! and reduces everything to one replica count.
//!
//! # Cycle
//!
//! ```text
//! evaluator ─▶ current
//!   for each model:  store.add(current) ─▶ snapshot history
//!   for due models:  predict(snapshot)             (bounded, parallel)
//!   for each model:  retention ─▶ store.remove, intervals_passed += 1
//! decide(decisionType, current, predictions) ─▶ target replicas
//! ```
//!
//! A model is due when `intervals_passed % per_interval == 0`.

pub mod decision;
pub mod error;
pub mod evaluator;
pub mod scaler;

pub use decision::decide;
pub use error::{CycleError, CycleResult};
pub use evaluator::{Evaluator, FakeEvaluator, StaticEvaluator};
pub use scaler::{CycleOutcome, ModelPrediction, PredictiveScaler};
