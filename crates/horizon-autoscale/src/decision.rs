//! Decision aggregator — reduces the current evaluation and this cycle's
//! predictions to one replica count.

use horizon_core::DecisionType;

/// Combine `current` with every prediction according to `decision`.
///
/// `mean` rounds half up using integer arithmetic.
pub fn decide(decision: DecisionType, current: u32, predictions: &[u32]) -> u32 {
    let values = std::iter::once(current).chain(predictions.iter().copied());
    match decision {
        DecisionType::Maximum => values.max().unwrap_or(current),
        DecisionType::Minimum => values.min().unwrap_or(current),
        DecisionType::Mean => {
            let count = predictions.len() as u64 + 1;
            let sum: u64 = values.map(u64::from).sum();
            ((sum + count / 2) / count) as u32
        }
    }
}
