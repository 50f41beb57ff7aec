//! Predictive scaler — runs one evaluation cycle across every configured
//! model.
//!
//! A cycle stores the current evaluation in each model's history, forecasts
//! from the models that are due this cycle, prunes every history back to
//! its retention capacity, and reduces the forecasts to one replica count.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use horizon_core::{Evaluation, Model, PredictiveConfig, StoredEvaluation};
use horizon_predict::{ModelPredict, PredictError};
use horizon_state::{EvaluationStore, ModelState};

use crate::decision::decide;
use crate::error::{CycleError, CycleResult};
use crate::evaluator::Evaluator;

/// A forecast produced by one model during a cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPrediction {
    pub model: String,
    pub replicas: u32,
}

/// Result of one evaluation cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleOutcome {
    /// Replica count handed back to the reconciler.
    pub target_replicas: u32,
    /// Replica count the evaluator asked for this cycle.
    pub current_replicas: u32,
    /// Successful forecasts, in configuration order.
    pub predictions: Vec<ModelPrediction>,
}

/// A model's history as it stood before predictions ran.
struct Snapshot {
    model: Model,
    history: Vec<StoredEvaluation>,
    state: ModelState,
}

impl Snapshot {
    fn is_due(&self) -> bool {
        self.state.intervals_passed % u64::from(self.model.per_interval.max(1)) == 0
    }
}

/// Orchestrates evaluation cycles over a store and a set of predictors.
pub struct PredictiveScaler {
    config: PredictiveConfig,
    store: EvaluationStore,
    predict: Arc<ModelPredict>,
    evaluator: Arc<dyn Evaluator>,
}

impl PredictiveScaler {
    pub fn new(
        config: PredictiveConfig,
        store: EvaluationStore,
        predict: ModelPredict,
        evaluator: Arc<dyn Evaluator>,
    ) -> Self {
        Self {
            config,
            store,
            predict: Arc::new(predict),
            evaluator,
        }
    }

    pub fn config(&self) -> &PredictiveConfig {
        &self.config
    }

    pub fn store(&self) -> &EvaluationStore {
        &self.store
    }

    /// Run one cycle over the gathered metrics.
    pub async fn evaluate(&self, gathered: &[serde_json::Value]) -> CycleResult<CycleOutcome> {
        let current = self
            .evaluator
            .get_evaluation(gathered)
            .await
            .map_err(CycleError::Evaluation)?;

        self.prune_unconfigured_models()?;

        let snapshots = self.record(&current)?;
        let mut results = self.predict_due(&snapshots).await?;

        let mut predictions = Vec::new();
        let mut failures = Vec::new();
        for (snapshot, result) in snapshots.iter().zip(results.iter_mut()) {
            match result.take() {
                Some(Ok(replicas)) => predictions.push(ModelPrediction {
                    model: snapshot.model.name.clone(),
                    replicas,
                }),
                Some(Err(e)) => failures.push((snapshot.model.name.clone(), e)),
                None => debug!(
                    model = %snapshot.model.name,
                    intervals_passed = snapshot.state.intervals_passed,
                    per_interval = snapshot.model.per_interval,
                    "model not due this cycle"
                ),
            }
        }

        self.apply_retention(&snapshots, &mut failures)?;

        let mut failures: Vec<(String, PredictError)> = failures
            .into_iter()
            .filter(|(model, e)| {
                if e.is_insufficient_data() {
                    debug!(model = %model, reason = %e, "model declined to predict");
                    false
                } else {
                    warn!(model = %model, error = %e, "model failed, excluding it from the decision");
                    true
                }
            })
            .collect();

        if self.config.models.len() == 1
            && let Some((model, source)) = failures.pop()
        {
            return Err(CycleError::Model { model, source });
        }

        let replicas: Vec<u32> = predictions.iter().map(|p| p.replicas).collect();
        let target_replicas = decide(self.config.decision_type, current.target_replicas, &replicas);

        info!(
            current = current.target_replicas,
            target = target_replicas,
            decision = self.config.decision_type.as_str(),
            predictions = predictions.len(),
            "evaluation cycle complete"
        );

        Ok(CycleOutcome {
            target_replicas,
            current_replicas: current.target_replicas,
            predictions,
        })
    }

    /// Drop stored history for models that are no longer configured.
    fn prune_unconfigured_models(&self) -> CycleResult<()> {
        let configured: HashSet<&str> = self.config.models.iter().map(|m| m.name.as_str()).collect();
        for stored in self.store.list_models()? {
            if !configured.contains(stored.as_str()) {
                let removed = self.store.clear_model(&stored)?;
                info!(model = %stored, removed, "cleared history of unconfigured model");
            }
        }
        Ok(())
    }

    /// Append the evaluation to every history and snapshot the result.
    fn record(&self, current: &Evaluation) -> CycleResult<Vec<Snapshot>> {
        let mut snapshots = Vec::with_capacity(self.config.models.len());
        for model in &self.config.models {
            let id = self.store.add(&model.name, current)?;
            let history = self.store.get_all(&model.name)?;
            let state = self.store.model_state(&model.name)?;
            debug!(model = %model.name, id, stored = history.len(), "evaluation recorded");
            snapshots.push(Snapshot {
                model: model.clone(),
                history,
                state,
            });
        }
        Ok(snapshots)
    }

    /// Forecast for every due model, at most `max_concurrent_predictions` at
    /// a time. The slot for a model that is not due stays `None`.
    async fn predict_due(
        &self,
        snapshots: &[Snapshot],
    ) -> CycleResult<Vec<Option<Result<u32, PredictError>>>> {
        let limit = Arc::new(Semaphore::new(self.config.max_concurrent_predictions.max(1)));
        let mut tasks = JoinSet::new();

        for (index, snapshot) in snapshots.iter().enumerate() {
            if !snapshot.is_due() {
                continue;
            }
            let permit = limit
                .clone()
                .acquire_owned()
                .await
                .map_err(|e| CycleError::Task(e.to_string()))?;
            let predict = self.predict.clone();
            let model = snapshot.model.clone();
            let history = snapshot.history.clone();
            tasks.spawn(async move {
                let _permit = permit;
                let result = predict.get_prediction(&model, &history).await;
                (index, result)
            });
        }

        let mut results: Vec<Option<Result<u32, PredictError>>> =
            std::iter::repeat_with(|| None).take(snapshots.len()).collect();
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined.map_err(|e| CycleError::Task(e.to_string()))?;
            results[index] = Some(result);
        }
        Ok(results)
    }

    /// Evict surplus history and advance every model's cycle counter.
    ///
    /// A store failure while evicting one model's history does not stop the
    /// others; the counters of all models advance together afterwards and
    /// the first store error is reported once everything has been attempted.
    fn apply_retention(
        &self,
        snapshots: &[Snapshot],
        failures: &mut Vec<(String, PredictError)>,
    ) -> CycleResult<()> {
        let mut store_error = None;
        for snapshot in snapshots {
            let name = &snapshot.model.name;
            match self.predict.get_ids_to_remove(&snapshot.model, &snapshot.history) {
                Ok(ids) if !ids.is_empty() => match self.store.remove(name, &ids) {
                    Ok(removed) => debug!(model = %name, removed, "evicted old evaluations"),
                    Err(e) => {
                        warn!(model = %name, error = %e, "failed to evict old evaluations");
                        store_error.get_or_insert(e);
                    }
                },
                Ok(_) => {}
                Err(e) => {
                    if !failures.iter().any(|(model, _)| model == name) {
                        failures.push((name.clone(), e));
                    }
                }
            }
        }

        let names: Vec<&str> = snapshots.iter().map(|s| s.model.name.as_str()).collect();
        self.store.advance_intervals(&names)?;

        match store_error {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}
