//! Retention policy — which stored evaluations to evict once a model's
//! history exceeds its capacity.

use horizon_core::StoredEvaluation;

/// Sort evaluations oldest first: by `created`, then by `id` for equal
/// timestamps.
pub fn sort_oldest_first(evaluations: &mut [StoredEvaluation]) {
    evaluations.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
}

/// Ids of the oldest evaluations beyond `capacity`, oldest first.
///
/// Returns an empty list when the history fits.
pub fn ids_to_remove(evaluations: &[StoredEvaluation], capacity: usize) -> Vec<u64> {
    if evaluations.len() <= capacity {
        return Vec::new();
    }
    let excess = evaluations.len() - capacity;
    let mut sorted = evaluations.to_vec();
    sort_oldest_first(&mut sorted);
    sorted.iter().take(excess).map(|e| e.id).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_core::Evaluation;

    fn stored(id: u64, created_secs: u64) -> StoredEvaluation {
        StoredEvaluation {
            id,
            created: created_secs * 1000,
            evaluation: Evaluation::new(0),
        }
    }

    #[test]
    fn removes_oldest_surplus_in_order() {
        let evaluations = vec![
            stored(1, 4),
            stored(2, 5),
            stored(5, 1),
            stored(3, 2),
            stored(8, 3),
            stored(4, 6),
        ];
        assert_eq!(ids_to_remove(&evaluations, 3), vec![5, 3, 8]);
    }

    #[test]
    fn nothing_removed_at_or_under_capacity() {
        let evaluations = vec![stored(1, 1), stored(2, 2), stored(3, 3)];
        assert!(ids_to_remove(&evaluations, 3).is_empty());
        assert!(ids_to_remove(&evaluations, 10).is_empty());
        assert!(ids_to_remove(&[], 0).is_empty());
    }

    #[test]
    fn zero_capacity_removes_everything() {
        let evaluations = vec![stored(2, 2), stored(1, 1)];
        assert_eq!(ids_to_remove(&evaluations, 0), vec![1, 2]);
    }

    #[test]
    fn equal_timestamps_break_ties_by_id() {
        let evaluations = vec![stored(9, 1), stored(4, 1), stored(7, 1), stored(1, 2)];
        assert_eq!(ids_to_remove(&evaluations, 1), vec![4, 7, 9]);
    }
}
