//! Prose ingestion through model-generated fact records.

use tracing::info;

use super::{FactLoader, IngestError, IngestReport};
use crate::core::Adjudicator;

/// Extracts fact records from prose with the language model and stores them
#[derive(Debug, Clone)]
pub struct TextIngestor {
    loader: FactLoader,
    adjudicator: Adjudicator,
}

impl TextIngestor {
    pub fn new(loader: FactLoader, adjudicator: Adjudicator) -> Self {
        Self { loader, adjudicator }
    }

    /// Generate facts from `text` and load them.
    ///
    /// An unparseable model response fails the run; nothing is stored.
    pub async fn ingest(&self, text: &str) -> Result<IngestReport, IngestError> {
        let facts = self.adjudicator.generate_facts(text).await?;
        info!(count = facts.len(), "Generated facts from text");

        let report = IngestReport {
            rows_read: facts.len(),
            ..Default::default()
        };
        self.loader.load(facts, report).await
    }
}
