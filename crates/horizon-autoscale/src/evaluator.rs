//! The evaluator port: turns gathered metrics into the current evaluation.

use horizon_core::Evaluation;
use horizon_predict::BoxFuture;

/// Produces the evaluation for the current cycle.
pub trait Evaluator: Send + Sync {
    fn get_evaluation<'a>(
        &'a self,
        gathered: &'a [serde_json::Value],
    ) -> BoxFuture<'a, anyhow::Result<Evaluation>>;
}

/// Evaluator that answers every cycle with a precomputed evaluation.
///
/// Used when the evaluation has already been made upstream, e.g. handed to
/// the CLI on stdin.
#[derive(Debug, Clone, Copy)]
pub struct StaticEvaluator(pub Evaluation);

impl Evaluator for StaticEvaluator {
    fn get_evaluation<'a>(
        &'a self,
        _gathered: &'a [serde_json::Value],
    ) -> BoxFuture<'a, anyhow::Result<Evaluation>> {
        Box::pin(async move { Ok(self.0) })
    }
}

type EvaluateReactor = dyn Fn(&[serde_json::Value]) -> anyhow::Result<Evaluation> + Send + Sync;

/// Evaluator whose result comes from a reactor closure.
pub struct FakeEvaluator {
    reactor: Box<EvaluateReactor>,
}

impl FakeEvaluator {
    pub fn new<F>(reactor: F) -> Self
    where
        F: Fn(&[serde_json::Value]) -> anyhow::Result<Evaluation> + Send + Sync + 'static,
    {
        Self {
            reactor: Box::new(reactor),
        }
    }
}

impl Evaluator for FakeEvaluator {
    fn get_evaluation<'a>(
        &'a self,
        gathered: &'a [serde_json::Value],
    ) -> BoxFuture<'a, anyhow::Result<Evaluation>> {
        let result = (self.reactor)(gathered);
        Box::pin(async move { result })
    }
}
