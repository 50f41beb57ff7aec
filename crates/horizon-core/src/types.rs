//! Shared types used across Horizon crates.

use serde::{Deserialize, Serialize};

/// A single autoscaling evaluation: the replica count the workload should
/// run at, as decided for one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub target_replicas: u32,
}

impl Evaluation {
    pub fn new(target_replicas: u32) -> Self {
        Self { target_replicas }
    }
}

/// An evaluation persisted in a model's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvaluation {
    /// Store-assigned identifier, unique within one model's history.
    pub id: u64,
    /// Unix timestamp (milliseconds) when the evaluation was stored.
    pub created: u64,
    pub evaluation: Evaluation,
}

impl StoredEvaluation {
    pub fn target_replicas(&self) -> u32 {
        self.evaluation.target_replicas
    }
}
