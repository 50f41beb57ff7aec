//! horizon-state — embedded evaluation store for Horizon.
//!
//! Backed by [redb](https://docs.rs/redb), keeps the evaluation history and
//! cycle counter of every predictive model, on disk or in memory.
//!
//! # Architecture
//!
//! Stored evaluations are JSON-serialized into redb's `&[u8]` value columns
//! under composite `{model}:{id}` keys. Ids come from a per-model sequence
//! table, so they stay unique for as long as the model's history exists.
//!
//! The `EvaluationStore` is `Clone` + `Send` + `Sync` (backed by
//! `Arc<Database>`) and can be shared across async tasks.

pub mod error;
pub mod store;
pub mod tables;
pub mod types;

pub use error::{StateError, StateResult};
pub use store::EvaluationStore;
pub use types::*;
