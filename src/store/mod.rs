//! Persistent evidence store.
//!
//! Facts live in a SQLite database alongside their embeddings. Each named
//! collection carries a dimension and metric contract; nearest-neighbour
//! search is an exact scan under that metric.

pub mod evidence_store;
pub mod vector;

use thiserror::Error;

pub use evidence_store::{EvidenceStore, MetadataFilter, SearchHit, DB_FILE};
pub use vector::{cosine_similarity, DistanceMetric};

/// Errors that can occur in the evidence store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Fact count ({facts}) does not match embedding count ({embeddings})")]
    LengthMismatch { facts: usize, embeddings: usize },

    #[error("Vector dimension mismatch: collection expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Fact not found: {0}")]
    NotFound(String),

    #[error("Corrupt embedding for fact {0}")]
    CorruptEmbedding(String),

    #[error("Invalid store configuration: {0}")]
    InvalidConfig(String),

    #[error("Store lock poisoned")]
    LockPoisoned,
}
