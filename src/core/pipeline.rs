//! End-to-end claim verification.
//!
//! The pipeline composes extraction, retrieval and adjudication:
//! text → claims → for each claim: evidence → verdict.
//! Components are built once by the caller and injected here; the pipeline
//! owns no persistent state of its own.

use futures::stream::{self, StreamExt};
use tokio::time::timeout;
use tracing::{info, instrument, warn};

use super::adjudicator::Adjudicator;
use super::extractor::ClaimExtractor;
use super::retriever::{is_vague_claim, Retriever};
use crate::config::VerificationSettings;
use crate::domain::{Claim, ExtractionMethod, Verdict};

/// Evidence items folded into one verification prompt
pub const MAX_EVIDENCE_ITEMS: usize = 3;

/// Reasoning for claims with nothing to check against
pub const NO_EVIDENCE_REASONING: &str =
    "No relevant evidence found in database. Cannot verify this claim with available information.";

/// Verification pipeline over injected components
#[derive(Debug, Clone)]
pub struct FactCheckPipeline {
    extractor: ClaimExtractor,
    retriever: Retriever,
    adjudicator: Adjudicator,
    settings: VerificationSettings,
}

impl FactCheckPipeline {
    pub fn new(
        extractor: ClaimExtractor,
        retriever: Retriever,
        adjudicator: Adjudicator,
        settings: VerificationSettings,
    ) -> Self {
        Self {
            extractor,
            retriever,
            adjudicator,
            settings,
        }
    }

    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    pub fn adjudicator(&self) -> &Adjudicator {
        &self.adjudicator
    }

    pub fn settings(&self) -> &VerificationSettings {
        &self.settings
    }

    /// Split text into claims with the chosen method
    pub async fn extract_claims(&self, text: &str, method: ExtractionMethod) -> Vec<Claim> {
        self.extractor
            .extract(text, method, Some(&self.adjudicator))
            .await
    }

    /// Verify one claim.
    ///
    /// With `evidence`, retrieval is skipped and the claim is judged against
    /// that text alone. Otherwise evidence is retrieved and reranked; when
    /// none is found the claim is `Unverifiable` without a model call.
    #[instrument(skip(self, claim, evidence), fields(claim_len = claim.len(), explicit_evidence = evidence.is_some()))]
    pub async fn verify_claim(&self, claim: &str, evidence: Option<&str>) -> Verdict {
        let vague = is_vague_claim(claim);
        if vague {
            info!("Claim is vague; verdict may be weak");
        }

        if let Some(evidence) = evidence {
            return self
                .adjudicator
                .verify(claim, evidence)
                .await
                .with_evidence(vec![evidence.to_string()])
                .with_vague(vague);
        }

        let retrieved = self
            .retriever
            .search_and_rerank(claim, Some(&self.adjudicator))
            .await;

        if retrieved.is_empty() {
            info!("No evidence retrieved, claim is unverifiable");
            return Verdict::unverifiable(claim, NO_EVIDENCE_REASONING).with_vague(vague);
        }

        let used = &retrieved[..retrieved.len().min(MAX_EVIDENCE_ITEMS)];
        let block = used
            .iter()
            .enumerate()
            .map(|(i, e)| e.to_prompt_block(i + 1))
            .collect::<Vec<_>>()
            .join("\n\n");
        let texts = used.iter().map(|e| e.text.clone()).collect();

        self.adjudicator
            .verify(claim, &block)
            .await
            .with_evidence(texts)
            .with_retrieved(retrieved)
            .with_vague(vague)
    }

    /// Verify every claim in `text`, or `text` itself when `extract` is false
    pub async fn verify_text(&self, text: &str, extract: bool, method: ExtractionMethod) -> Vec<Verdict> {
        let method = if extract { method } else { ExtractionMethod::Verbatim };
        let claims = self.extract_claims(text, method).await;

        if claims.is_empty() {
            warn!("No claims found in text");
            return Vec::new();
        }

        info!(count = claims.len(), "Verifying claims");
        self.verify_multiple_claims(&claims).await
    }

    /// Verify claims independently, preserving input order.
    ///
    /// At most `verification.concurrency` claims run at once. A claim that
    /// exceeds `verification.claim_timeout_seconds` becomes `Unverifiable`
    /// without affecting the others.
    pub async fn verify_multiple_claims<C: AsRef<str>>(&self, claims: &[C]) -> Vec<Verdict> {
        let limit = self.settings.concurrency.max(1);
        let claim_timeout = self.settings.claim_timeout();

        stream::iter(claims.iter().map(|c| AsRef::<str>::as_ref(c)))
            .map(|claim| async move {
                match timeout(claim_timeout, self.verify_claim(claim, None)).await {
                    Ok(verdict) => verdict,
                    Err(_) => {
                        warn!(timeout_secs = claim_timeout.as_secs(), "Claim verification timed out");
                        Verdict::unverifiable(
                            claim,
                            format!(
                                "Verification timed out after {} seconds.",
                                claim_timeout.as_secs()
                            ),
                        )
                        .with_vague(is_vague_claim(claim))
                    }
                }
            })
            .buffered(limit)
            .collect()
            .await
    }
}
