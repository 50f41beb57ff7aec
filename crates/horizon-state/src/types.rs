//! Persisted bookkeeping types and key helpers.

use serde::{Deserialize, Serialize};

/// Cycle bookkeeping for one model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelState {
    /// Cycles completed for this model.
    pub intervals_passed: u64,
}

/// Build the composite key for the evaluations table.
///
/// Ids are zero-padded so keys of one model sort numerically.
pub fn evaluation_key(model: &str, id: u64) -> String {
    format!("{model}:{id:020}")
}

/// Split an evaluation key into its model name and id.
///
/// Model names may themselves contain `:`, so the split happens on the last one.
pub fn parse_evaluation_key(key: &str) -> Option<(&str, u64)> {
    let (model, id) = key.rsplit_once(':')?;
    Some((model, id.parse().ok()?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evaluation_key_round_trip() {
        let key = evaluation_key("simple-linear", 42);
        assert_eq!(key, "simple-linear:00000000000000000042");
        assert_eq!(parse_evaluation_key(&key), Some(("simple-linear", 42)));
    }

    #[test]
    fn model_names_with_colons_parse() {
        let key = evaluation_key("ns:model", 7);
        assert_eq!(parse_evaluation_key(&key), Some(("ns:model", 7)));
    }

    #[test]
    fn malformed_keys_are_rejected() {
        assert_eq!(parse_evaluation_key("no-separator"), None);
        assert_eq!(parse_evaluation_key("model:not-a-number"), None);
    }
}
