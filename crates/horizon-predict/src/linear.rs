//! Linear predictor — least-squares projection delegated to an external
//! algorithm.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use horizon_core::config::DEFAULT_ALGORITHM_PATH;
use horizon_core::{Linear, Model, StoredEvaluation};

use crate::error::{PredictError, PredictResult};
use crate::predictor::{BoxFuture, Predictor};
use crate::regression::RegressionParameters;
use crate::retention;
use crate::runner::Runner;

pub const LINEAR_TYPE: &str = "Linear";

/// Forecasts by running a linear regression algorithm over the history.
pub struct LinearPredictor {
    runner: Arc<dyn Runner>,
}

impl LinearPredictor {
    pub fn new(runner: Arc<dyn Runner>) -> Self {
        Self { runner }
    }

    async fn predict(&self, model: &Model, evaluations: &[StoredEvaluation]) -> PredictResult<u32> {
        let linear = linear_block(model)?;

        match evaluations {
            [] => {
                return Err(PredictError::InsufficientData(format!(
                    "no evaluations provided for linear regression model '{}'",
                    model.name
                )));
            }
            [only] => return Ok(only.target_replicas()),
            _ => {}
        }

        let value = serde_json::to_string(&RegressionParameters {
            look_ahead: linear.look_ahead,
            evaluations: evaluations.to_vec(),
        })
        .map_err(|e| PredictError::Computation(format!("serializing evaluations: {e}")))?;

        let path = linear
            .algorithm_path
            .as_deref()
            .unwrap_or(DEFAULT_ALGORITHM_PATH);
        let timeout = Duration::from_millis(model.calculation_timeout_ms());
        let output = self
            .runner
            .run_algorithm_with_value(path, &value, timeout)
            .await?;

        let trimmed = output.trim();
        let prediction: i64 = trimmed.parse().map_err(|e| PredictError::InvalidResult {
            value: trimmed.to_string(),
            reason: format!("{e}"),
        })?;
        debug!(model = %model.name, prediction, points = evaluations.len(), "linear prediction");
        Ok(prediction.clamp(0, u32::MAX as i64) as u32)
    }
}

fn linear_block(model: &Model) -> PredictResult<&Linear> {
    model.linear.as_ref().ok_or_else(|| {
        PredictError::Configuration(format!(
            "no Linear configuration provided for model '{}'",
            model.name
        ))
    })
}

impl Predictor for LinearPredictor {
    fn model_type(&self) -> &'static str {
        LINEAR_TYPE
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
        let linear = linear_block(model)?;
        Ok(retention::ids_to_remove(evaluations, linear.stored_values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RunError;
    use crate::fake::FakeRunner;
    use horizon_core::{Evaluation, ModelType};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn model(linear: Option<Linear>) -> Model {
        Model {
            model_type: ModelType::Linear,
            name: "simple-linear".to_string(),
            per_interval: 1,
            calculation_timeout: Some(1500),
            linear,
            holt_winters: None,
        }
    }

    fn linear(stored_values: usize) -> Option<Linear> {
        Some(Linear {
            look_ahead: 0,
            stored_values,
            algorithm_path: None,
        })
    }

    fn evaluation(id: u64, created_secs: u64, replicas: u32) -> StoredEvaluation {
        StoredEvaluation {
            id,
            created: created_secs * 1000,
            evaluation: Evaluation::new(replicas),
        }
    }

    fn predictor(runner: FakeRunner) -> LinearPredictor {
        LinearPredictor::new(Arc::new(runner))
    }

    fn returning(output: &'static str) -> FakeRunner {
        FakeRunner::new(move |_, _, _| Ok(output.to_string()))
    }

    #[tokio::test]
    async fn missing_linear_block_is_configuration_error() {
        let p = predictor(returning("3"));
        let err = p.get_prediction(&model(None), &[]).await.unwrap_err();
        assert!(matches!(err, PredictError::Configuration(ref msg) if msg.contains("simple-linear")));
    }

    #[tokio::test]
    async fn no_evaluations_is_insufficient_data() {
        let p = predictor(returning("3"));
        let err = p.get_prediction(&model(linear(5)), &[]).await.unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[tokio::test]
    async fn single_evaluation_short_circuits_runner() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let p = predictor(FakeRunner::new(move |_, _, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok("99".to_string())
        }));

        let result = p
            .get_prediction(&model(linear(5)), &[evaluation(0, 1, 32)])
            .await
            .unwrap();
        assert_eq!(result, 32);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn runner_failure_is_algorithm_execution_error() {
        let p = predictor(FakeRunner::new(|_, _, _| {
            Err(RunError::Other("algorithm fail".to_string()))
        }));

        let err = p
            .get_prediction(&model(linear(5)), &[evaluation(0, 1, 1), evaluation(1, 2, 2)])
            .await
            .unwrap_err();
        assert!(matches!(err, PredictError::AlgorithmExecution(_)));
        assert!(err.to_string().contains("algorithm fail"));
    }

    #[tokio::test]
    async fn non_integer_output_is_invalid_result() {
        let p = predictor(returning("invalid"));

        let err = p
            .get_prediction(&model(linear(5)), &[evaluation(0, 1, 1), evaluation(1, 2, 2)])
            .await
            .unwrap_err();
        assert!(matches!(err, PredictError::InvalidResult { ref value, .. } if value == "invalid"));
    }

    #[tokio::test]
    async fn parses_algorithm_output() {
        let p = predictor(returning("3\n"));

        let result = p
            .get_prediction(&model(linear(5)), &[evaluation(0, 1, 1), evaluation(1, 2, 2)])
            .await
            .unwrap();
        assert_eq!(result, 3);
    }

    #[tokio::test]
    async fn negative_output_floors_at_zero() {
        let p = predictor(returning("-4"));

        let result = p
            .get_prediction(&model(linear(5)), &[evaluation(0, 1, 1), evaluation(1, 2, 2)])
            .await
            .unwrap();
        assert_eq!(result, 0);
    }

    #[tokio::test]
    async fn runner_receives_path_value_and_timeout() {
        let p = predictor(FakeRunner::new(|path, value, timeout| {
            assert_eq!(path, DEFAULT_ALGORITHM_PATH);
            assert_eq!(timeout, Duration::from_millis(1500));
            let params: RegressionParameters = serde_json::from_str(value).unwrap();
            assert_eq!(params.look_ahead, 0);
            assert_eq!(params.evaluations.len(), 2);
            Ok("1".to_string())
        }));

        p.get_prediction(&model(linear(5)), &[evaluation(0, 1, 1), evaluation(1, 2, 2)])
            .await
            .unwrap();
    }

    #[test]
    fn ids_to_remove_requires_linear_block() {
        let p = predictor(returning("3"));
        assert!(matches!(
            p.get_ids_to_remove(&model(None), &[]),
            Err(PredictError::Configuration(_))
        ));
    }

    #[test]
    fn ids_to_remove_marks_oldest_surplus() {
        let p = predictor(returning("3"));
        let evaluations = vec![
            evaluation(1, 4, 0),
            evaluation(2, 5, 0),
            // oldest three
            evaluation(5, 1, 0),
            evaluation(3, 2, 0),
            evaluation(8, 3, 0),
            evaluation(4, 6, 0),
        ];

        let ids = p.get_ids_to_remove(&model(linear(3)), &evaluations).unwrap();
        assert_eq!(ids, vec![5, 3, 8]);
    }

    #[test]
    fn ids_to_remove_empty_within_capacity() {
        let p = predictor(returning("3"));
        let evaluations = vec![evaluation(1, 1, 0), evaluation(2, 2, 0)];
        assert!(p.get_ids_to_remove(&model(linear(5)), &evaluations).unwrap().is_empty());
    }

    #[test]
    fn model_type_is_linear() {
        assert_eq!(predictor(returning("3")).model_type(), "Linear");
    }
}
