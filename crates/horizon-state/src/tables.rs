//! redb table definitions for the Horizon evaluation store.
//!
//! Every table is keyed by model name, either alone or as the
//! `{model}:{id}` composite used for evaluations.

use redb::TableDefinition;

/// Stored evaluations keyed by `{model}:{id:020}`.
pub const EVALUATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("evaluations");

/// Per-model cycle bookkeeping keyed by `{model}`.
pub const MODELS: TableDefinition<&str, &[u8]> = TableDefinition::new("models");

/// Last evaluation id handed out, keyed by `{model}`.
pub const SEQUENCES: TableDefinition<&str, u64> = TableDefinition::new("sequences");
