//! The `Predictor` abstraction and type-based dispatch over it.

use std::sync::Arc;

use horizon_core::{Model, StoredEvaluation};

use crate::error::{PredictError, PredictResult};
use crate::fetcher::Fetcher;
use crate::holtwinters::HoltWintersPredictor;
use crate::linear::LinearPredictor;
use crate::runner::Runner;

/// Boxed, sendable future returned by predictors and their ports.
pub type BoxFuture<'a, T> = std::pin::Pin<Box<dyn std::future::Future<Output = T> + Send + 'a>>;

/// A forecasting model over a history of stored evaluations.
pub trait Predictor: Send + Sync {
    /// Model type this predictor handles, matching `Model::model_type`.
    fn model_type(&self) -> &'static str;

    /// Forecast a replica count from the model's history.
    fn get_prediction<'a>(
        &'a self,
        model: &'a Model,
        evaluations: &'a [StoredEvaluation],
    ) -> BoxFuture<'a, PredictResult<u32>>;

    /// Ids of stored evaluations to evict so the history stays bounded.
    fn get_ids_to_remove(
        &self,
        model: &Model,
        evaluations: &[StoredEvaluation],
    ) -> PredictResult<Vec<u64>>;
}

/// Dispatches each model to the predictor registered for its type.
pub struct ModelPredict {
    predictors: Vec<Box<dyn Predictor>>,
}

impl ModelPredict {
    pub fn new(predictors: Vec<Box<dyn Predictor>>) -> Self {
        Self { predictors }
    }

    /// Linear and Holt-Winters predictors wired to the given ports.
    pub fn with_defaults(runner: Arc<dyn Runner>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self::new(vec![
            Box::new(LinearPredictor::new(runner)),
            Box::new(HoltWintersPredictor::new(fetcher)),
        ])
    }

    fn predictor_for(&self, model: &Model) -> PredictResult<&dyn Predictor> {
        let wanted = model.model_type.as_str();
        self.predictors
            .iter()
            .find(|p| p.model_type() == wanted)
            .map(|p| p.as_ref())
            .ok_or_else(|| {
                PredictError::Configuration(format!(
                    "no predictor registered for model type '{wanted}' (model '{}')",
                    model.name
                ))
            })
    }

    pub async fn get_prediction(
        &self,
        model: &Model,
        evaluations: &[StoredEvaluation],
    ) -> PredictResult<u32> {
        self.predictor_for(model)?
            .get_prediction(model, evaluations)
            .await
    }

    pub fn get_ids_to_remove(
        &self,
        model: &Model,
        evaluations: &[StoredEvaluation],
    ) -> PredictResult<Vec<u64>> {
        self.predictor_for(model)?.get_ids_to_remove(model, evaluations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_core::{Evaluation, Linear, ModelType};

    /// Answers every prediction with a fixed value.
    struct Constant(u32);

    impl Predictor for Constant {
        fn model_type(&self) -> &'static str {
            "Linear"
        }

        fn get_prediction<'a>(
            &'a self,
            _model: &'a Model,
            _evaluations: &'a [StoredEvaluation],
        ) -> BoxFuture<'a, PredictResult<u32>> {
            Box::pin(async move { Ok(self.0) })
        }

        fn get_ids_to_remove(
            &self,
            _model: &Model,
            evaluations: &[StoredEvaluation],
        ) -> PredictResult<Vec<u64>> {
            Ok(evaluations.iter().map(|e| e.id).collect())
        }
    }

    fn model(model_type: ModelType) -> Model {
        Model {
            model_type,
            name: "m".to_string(),
            per_interval: 1,
            calculation_timeout: None,
            linear: Some(Linear {
                look_ahead: 0,
                stored_values: 1,
                algorithm_path: None,
            }),
            holt_winters: None,
        }
    }

    #[tokio::test]
    async fn dispatches_by_model_type() {
        let predict = ModelPredict::new(vec![Box::new(Constant(12))]);
        let history = vec![StoredEvaluation {
            id: 3,
            created: 0,
            evaluation: Evaluation::new(1),
        }];

        let m = model(ModelType::Linear);
        assert_eq!(predict.get_prediction(&m, &history).await.unwrap(), 12);
        assert_eq!(predict.get_ids_to_remove(&m, &history).unwrap(), vec![3]);
    }

    #[tokio::test]
    async fn unregistered_type_is_configuration_error() {
        let predict = ModelPredict::new(vec![Box::new(Constant(12))]);
        let m = model(ModelType::HoltWinters);

        assert!(matches!(
            predict.get_prediction(&m, &[]).await,
            Err(PredictError::Configuration(_))
        ));
        assert!(matches!(
            predict.get_ids_to_remove(&m, &[]),
            Err(PredictError::Configuration(_))
        ));
    }
}
