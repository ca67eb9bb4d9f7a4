//! Evidence ingestion.
//!
//! Loads verified facts into the evidence store. Two front ends share one
//! batching loader:
//!
//! 1. **CSV**: tabular facts with a required `fact` column
//! 2. **Text**: prose run through the language model's fact generator
//!
//! ```text
//! CSV / prose → NewFact[] → FactLoader (batch: embed → add) → EvidenceStore
//! ```

pub mod csv;
pub mod loader;
pub mod text;

use serde::Serialize;
use thiserror::Error;

use crate::core::AdjudicatorError;
use crate::store::StoreError;

// Re-export key types
pub use self::csv::CsvIngestor;
pub use loader::FactLoader;
pub use text::TextIngestor;

/// Errors that abort an ingestion run
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("CSV error: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Fact generation failed: {0}")]
    Generation(#[from] AdjudicatorError),
}

/// Outcome of one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    /// Input rows (or generated records) seen
    pub rows_read: usize,

    /// Rows dropped as malformed or empty
    pub rows_skipped: usize,

    /// Facts written to the store
    pub facts_added: usize,

    /// Batches whose embedding or insertion failed
    pub batches_failed: usize,

    pub count_before: usize,

    pub count_after: usize,
}
