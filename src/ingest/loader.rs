//! Batched embed-and-store.

use std::sync::Arc;

use tracing::{error, info, instrument};

use super::{IngestError, IngestReport};
use crate::adapters::Embedder;
use crate::domain::NewFact;
use crate::store::EvidenceStore;

/// Embeds facts in fixed-size batches and adds them to the store.
///
/// A failed batch is logged and skipped; the rest still load.
#[derive(Clone)]
pub struct FactLoader {
    embedder: Arc<dyn Embedder>,
    store: Arc<EvidenceStore>,
    batch_size: usize,
}

impl std::fmt::Debug for FactLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FactLoader")
            .field("embedder", &self.embedder.name())
            .field("store", &self.store)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl FactLoader {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<EvidenceStore>, batch_size: usize) -> Self {
        Self {
            embedder,
            store,
            batch_size: batch_size.max(1),
        }
    }

    pub fn store(&self) -> &Arc<EvidenceStore> {
        &self.store
    }

    /// Load `facts`, filling the store counts and batch tallies of `report`
    #[instrument(skip(self, facts, report), fields(facts = facts.len(), batch_size = self.batch_size))]
    pub async fn load(&self, facts: Vec<NewFact>, mut report: IngestReport) -> Result<IngestReport, IngestError> {
        report.count_before = self.store.count()?;
        info!(count = report.count_before, "Current facts in database");

        let batches = facts.len().div_ceil(self.batch_size);
        for (n, batch) in facts.chunks(self.batch_size).enumerate() {
            let texts: Vec<String> = batch.iter().map(|f| f.text.clone()).collect();

            let embeddings = match self.embedder.embed_documents(&texts).await {
                Ok(embeddings) => embeddings,
                Err(e) => {
                    error!(batch = n + 1, error = %e, "Failed to embed batch, skipping");
                    report.batches_failed += 1;
                    continue;
                }
            };

            match self.store.add(batch, &embeddings) {
                Ok(ids) => {
                    report.facts_added += ids.len();
                    info!(batch = n + 1, batches, added = ids.len(), "Added batch");
                }
                Err(e) => {
                    error!(batch = n + 1, error = %e, "Failed to add batch, skipping");
                    report.batches_failed += 1;
                }
            }
        }

        report.count_after = self.store.count()?;
        info!(
            added = report.facts_added,
            total = report.count_after,
            failed_batches = report.batches_failed,
            "Ingestion complete"
        );
        Ok(report)
    }
}
