use horizon_predict::PredictError;
use horizon_state::StateError;

/// Errors that abort an evaluation cycle.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error("evaluation failed: {0:#}")]
    Evaluation(anyhow::Error),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("model '{model}': {source}")]
    Model {
        model: String,
        #[source]
        source: PredictError,
    },

    #[error("prediction task failed: {0}")]
    Task(String),
}

pub type CycleResult<T> = Result<T, CycleError>;
