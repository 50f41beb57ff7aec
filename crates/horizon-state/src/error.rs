//! Error types for the Horizon evaluation store.

use thiserror::Error;

pub type StateResult<T> = Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    /// The database file could not be created or opened.
    #[error("cannot open evaluation store: {0}")]
    Open(String),

    /// Beginning or committing a transaction, or opening a table in one.
    #[error("evaluation store transaction failed: {0}")]
    Transaction(String),

    #[error("evaluation store i/o failed: {0}")]
    Storage(String),

    /// A stored record did not round-trip through JSON.
    #[error("malformed stored record: {0}")]
    Codec(String),

    /// An evaluation key without the `{model}:{id}` shape.
    #[error("unrecognised evaluation key '{0}'")]
    CorruptKey(String),
}
