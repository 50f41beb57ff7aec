//! EvaluationStore — redb-backed evaluation history for Horizon.
//!
//! Holds, per model, the evaluations the predictors train on and the cycle
//! counter that drives `perInterval`. All values are JSON-serialized into
//! redb's `&[u8]` value columns. The store supports both on-disk and
//! in-memory backends (the latter for testing).

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use redb::{Database, ReadableDatabase, ReadableTable};
use tracing::debug;

use horizon_core::{Evaluation, StoredEvaluation};

use crate::error::{StateError, StateResult};
use crate::tables::*;
use crate::types::*;

/// Convert any `Display` error into a `StateError` variant via a closure factory.
macro_rules! map_err {
    ($variant:ident) => {
        |e| StateError::$variant(e.to_string())
    };
}

/// Thread-safe evaluation store backed by redb.
#[derive(Clone)]
pub struct EvaluationStore {
    db: Arc<Database>,
}

impl EvaluationStore {
    /// Open (or create) a persistent evaluation store at the given path.
    pub fn open(path: &Path) -> StateResult<Self> {
        let db = Database::create(path).map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!(?path, "evaluation store opened");
        Ok(store)
    }

    /// Create an ephemeral in-memory evaluation store (for testing).
    pub fn open_in_memory() -> StateResult<Self> {
        let backend = redb::backends::InMemoryBackend::new();
        let db = Database::builder()
            .create_with_backend(backend)
            .map_err(map_err!(Open))?;
        let store = Self { db: Arc::new(db) };
        store.ensure_tables()?;
        debug!("in-memory evaluation store opened");
        Ok(store)
    }

    /// Create all tables if they don't exist yet.
    fn ensure_tables(&self) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        // Opening a table in a write transaction creates it if absent.
        txn.open_table(EVALUATIONS).map_err(map_err!(Transaction))?;
        txn.open_table(MODELS).map_err(map_err!(Transaction))?;
        txn.open_table(SEQUENCES).map_err(map_err!(Transaction))?;
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    // ── Evaluations ────────────────────────────────────────────────

    /// Append an evaluation to a model's history, stamped with the current
    /// time. Returns the id assigned to it.
    pub fn add(&self, model: &str, evaluation: &Evaluation) -> StateResult<u64> {
        self.add_with_created(model, evaluation, epoch_millis())
    }

    /// Append an evaluation with an explicit creation time (unix millis).
    pub fn add_with_created(
        &self,
        model: &str,
        evaluation: &Evaluation,
        created: u64,
    ) -> StateResult<u64> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let id;
        {
            let mut sequences = txn.open_table(SEQUENCES).map_err(map_err!(Transaction))?;
            let last = sequences
                .get(model)
                .map_err(map_err!(Storage))?
                .map(|guard| guard.value())
                .unwrap_or(0);
            id = last + 1;
            sequences.insert(model, id).map_err(map_err!(Storage))?;

            let stored = StoredEvaluation {
                id,
                created,
                evaluation: *evaluation,
            };
            let value = serde_json::to_vec(&stored).map_err(map_err!(Codec))?;
            let key = evaluation_key(model, id);
            let mut table = txn.open_table(EVALUATIONS).map_err(map_err!(Transaction))?;
            table
                .insert(key.as_str(), value.as_slice())
                .map_err(map_err!(Storage))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%model, id, created, "evaluation stored");
        Ok(id)
    }

    /// All stored evaluations for a model.
    ///
    /// No ordering is promised; callers sort by `created` when it matters.
    pub fn get_all(&self, model: &str) -> StateResult<Vec<StoredEvaluation>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(EVALUATIONS).map_err(map_err!(Transaction))?;
        let mut results = Vec::new();
        for entry in table.iter().map_err(map_err!(Storage))? {
            let (key, value) = entry.map_err(map_err!(Storage))?;
            let key = key.value();
            let (owner, _) =
                parse_evaluation_key(key).ok_or_else(|| StateError::CorruptKey(key.to_string()))?;
            if owner == model {
                let stored: StoredEvaluation =
                    serde_json::from_slice(value.value()).map_err(map_err!(Codec))?;
                results.push(stored);
            }
        }
        Ok(results)
    }

    /// Delete evaluations by id. Unknown ids are ignored. Returns the number
    /// actually removed.
    pub fn remove(&self, model: &str, ids: &[u64]) -> StateResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        let mut removed = 0;
        {
            let mut table = txn.open_table(EVALUATIONS).map_err(map_err!(Transaction))?;
            for id in ids {
                let key = evaluation_key(model, *id);
                if table.remove(key.as_str()).map_err(map_err!(Storage))?.is_some() {
                    removed += 1;
                }
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%model, requested = ids.len(), removed, "evaluations removed");
        Ok(removed)
    }

    // ── Models ─────────────────────────────────────────────────────

    /// Cycle bookkeeping for a model; a fresh state if none was stored.
    pub fn model_state(&self, model: &str) -> StateResult<ModelState> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let table = txn.open_table(MODELS).map_err(map_err!(Transaction))?;
        match table.get(model).map_err(map_err!(Storage))? {
            Some(guard) => {
                serde_json::from_slice(guard.value()).map_err(map_err!(Codec))
            }
            None => Ok(ModelState::default()),
        }
    }

    /// Insert or update a model's cycle bookkeeping.
    pub fn put_model_state(&self, model: &str, state: &ModelState) -> StateResult<()> {
        let value = serde_json::to_vec(state).map_err(map_err!(Codec))?;
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(MODELS).map_err(map_err!(Transaction))?;
            table
                .insert(model, value.as_slice())
                .map_err(map_err!(Storage))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        Ok(())
    }

    /// Increment the cycle counter of every listed model in a single
    /// transaction: either all counters advance or none do.
    pub fn advance_intervals(&self, models: &[&str]) -> StateResult<()> {
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(MODELS).map_err(map_err!(Transaction))?;
            for model in models {
                let mut state: ModelState = match table.get(*model).map_err(map_err!(Storage))? {
                    Some(guard) => serde_json::from_slice(guard.value()).map_err(map_err!(Codec))?,
                    None => ModelState::default(),
                };
                state.intervals_passed += 1;
                let value = serde_json::to_vec(&state).map_err(map_err!(Codec))?;
                table
                    .insert(*model, value.as_slice())
                    .map_err(map_err!(Storage))?;
            }
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(models = models.len(), "cycle counters advanced");
        Ok(())
    }

    /// Names of every model with stored history or bookkeeping, sorted.
    pub fn list_models(&self) -> StateResult<Vec<String>> {
        let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
        let mut names = BTreeSet::new();
        {
            let table = txn.open_table(MODELS).map_err(map_err!(Transaction))?;
            for entry in table.iter().map_err(map_err!(Storage))? {
                let (key, _) = entry.map_err(map_err!(Storage))?;
                names.insert(key.value().to_string());
            }
        }
        {
            let table = txn.open_table(SEQUENCES).map_err(map_err!(Transaction))?;
            for entry in table.iter().map_err(map_err!(Storage))? {
                let (key, _) = entry.map_err(map_err!(Storage))?;
                names.insert(key.value().to_string());
            }
        }
        Ok(names.into_iter().collect())
    }

    /// Drop a model's history, bookkeeping, and id sequence. Returns the
    /// number of evaluations deleted.
    pub fn clear_model(&self, model: &str) -> StateResult<usize> {
        // Collect keys in a read transaction first.
        let keys: Vec<String> = {
            let txn = self.db.begin_read().map_err(map_err!(Transaction))?;
            let table = txn.open_table(EVALUATIONS).map_err(map_err!(Transaction))?;
            table
                .iter()
                .map_err(map_err!(Storage))?
                .filter_map(|entry| {
                    let (key, _) = entry.ok()?;
                    let k = key.value().to_string();
                    let (owner, _) = parse_evaluation_key(&k)?;
                    (owner == model).then_some(k)
                })
                .collect()
        };
        let txn = self.db.begin_write().map_err(map_err!(Transaction))?;
        {
            let mut table = txn.open_table(EVALUATIONS).map_err(map_err!(Transaction))?;
            for key in &keys {
                table.remove(key.as_str()).map_err(map_err!(Storage))?;
            }
            let mut models = txn.open_table(MODELS).map_err(map_err!(Transaction))?;
            models.remove(model).map_err(map_err!(Storage))?;
            let mut sequences = txn.open_table(SEQUENCES).map_err(map_err!(Transaction))?;
            sequences.remove(model).map_err(map_err!(Storage))?;
        }
        txn.commit().map_err(map_err!(Transaction))?;
        debug!(%model, deleted = keys.len(), "model cleared");
        Ok(keys.len())
    }
}

fn epoch_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
