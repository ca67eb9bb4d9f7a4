//! Evidence retrieval and reranking.
//!
//! The retriever embeds a claim, pulls nearest neighbours from the
//! [`EvidenceStore`], keeps those above the similarity threshold, and
//! optionally asks the language model to reorder them. Every failure here
//! degrades to "no evidence" or to similarity order; nothing propagates.

use std::collections::HashSet;
use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, error, info, instrument, warn};

use super::adjudicator::Adjudicator;
use super::prompts;
use crate::adapters::Embedder;
use crate::config::RetrievalSettings;
use crate::domain::RetrievedEvidence;
use crate::store::{EvidenceStore, MetadataFilter};

lazy_static! {
    static ref VAGUE_MARKERS: Regex = Regex::new(
        // "May" capitalized is usually the month
        r"\b(?i:some|many|often|recently|usually|generally|might|could|possibly|sometimes)\b|\bmay\b"
    )
    .unwrap();
    static ref DATE_PATTERN: Regex = Regex::new(r"\d{4}|\d{1,2}[/-]\d{1,2}").unwrap();
    static ref NUMBER_PATTERN: Regex = Regex::new(r"\d+").unwrap();
    static ref NAME_PATTERN: Regex = Regex::new(r"\b[A-Z][a-z]+\s+[A-Z][a-z]+\b").unwrap();
}

/// Whether a claim is too hedged to check well.
///
/// Vague when it has two or more distinct hedging markers, or one marker and
/// no date, number or two-word proper name to anchor it.
pub fn is_vague_claim(claim: &str) -> bool {
    let markers: HashSet<String> = VAGUE_MARKERS
        .find_iter(claim)
        .map(|m| m.as_str().to_ascii_lowercase())
        .collect();

    match markers.len() {
        0 => false,
        1 => {
            let specific = DATE_PATTERN.is_match(claim)
                || NUMBER_PATTERN.is_match(claim)
                || NAME_PATTERN.is_match(claim);
            !specific
        }
        _ => true,
    }
}

/// Parse a comma-separated list of 1-based indices into a 0-based order.
///
/// Out-of-range and repeated indices are dropped. Any token that is not an
/// integer rejects the whole response.
pub fn parse_ranking(response: &str, len: usize) -> Option<Vec<usize>> {
    let mut seen = HashSet::new();
    let mut order = Vec::new();

    for token in response.trim().split(',') {
        let index: i64 = token.trim().parse().ok()?;
        if index < 1 || index as usize > len {
            continue;
        }
        let index = index as usize - 1;
        if seen.insert(index) {
            order.push(index);
        }
    }
    Some(order)
}

/// Claim-to-evidence retrieval over an embedded fact collection
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<EvidenceStore>,
    settings: RetrievalSettings,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("embedder", &self.embedder.name())
            .field("store", &self.store)
            .field("settings", &self.settings)
            .finish()
    }
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<EvidenceStore>, settings: RetrievalSettings) -> Self {
        Self {
            embedder,
            store,
            settings,
        }
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<EvidenceStore> {
        &self.store
    }

    /// Nearest facts with similarity at or above the threshold, best first.
    ///
    /// `top_k` and `threshold` default to the configured values. Embedding or
    /// store failures yield an empty list.
    #[instrument(skip(self, query, filter), fields(query_len = query.len()))]
    pub async fn search(
        &self,
        query: &str,
        top_k: Option<usize>,
        threshold: Option<f32>,
        filter: Option<&MetadataFilter>,
    ) -> Vec<RetrievedEvidence> {
        let top_k = top_k.unwrap_or(self.settings.top_k_retrieval);
        let threshold = threshold.unwrap_or(self.settings.similarity_threshold);

        let embedding = match self.embedder.embed_query(query).await {
            Ok(embedding) => embedding,
            Err(e) => {
                error!(embedder = self.embedder.name(), error = %e, "Failed to embed query");
                return Vec::new();
            }
        };

        let hits = match self.store.try_search(&embedding, top_k, filter) {
            Ok(hits) => hits,
            Err(e) => {
                error!(error = %e, "Error searching vector database");
                return Vec::new();
            }
        };

        let mut candidates: Vec<RetrievedEvidence> = hits
            .into_iter()
            .map(|hit| RetrievedEvidence::from_distance(hit.id, hit.text, hit.metadata, hit.distance))
            .collect();
        candidates.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

        for (i, c) in candidates.iter().take(3).enumerate() {
            let preview: String = c.text.chars().take(100).collect();
            debug!(position = i + 1, similarity = c.similarity, text = %preview, "Candidate");
        }

        let best = candidates.first().map(|c| c.similarity);
        candidates.retain(|c| c.similarity >= threshold);

        if candidates.is_empty() {
            if let Some(best) = best {
                warn!(threshold, top_similarity = best, "No results above threshold");
            }
        }
        info!(count = candidates.len(), threshold, "Retrieved facts above threshold");
        candidates
    }

    /// Reorder candidates by relevance and keep the first `top_k`.
    ///
    /// With an adjudicator the model proposes the order; candidates it leaves
    /// out follow in their original order. Without one, or if the model call
    /// or its answer fails, candidates are ordered by similarity.
    #[instrument(skip(self, query, candidates, adjudicator), fields(candidates = candidates.len()))]
    pub async fn rerank(
        &self,
        query: &str,
        candidates: Vec<RetrievedEvidence>,
        top_k: Option<usize>,
        adjudicator: Option<&Adjudicator>,
    ) -> Vec<RetrievedEvidence> {
        let top_k = top_k.unwrap_or(self.settings.top_k_rerank);
        if candidates.is_empty() {
            return candidates;
        }

        let order = match adjudicator {
            Some(adj) => match adj.generate(&prompts::reranking(query, &candidates), None).await {
                Ok(response) => {
                    let order = parse_ranking(&response, candidates.len());
                    if order.is_none() {
                        warn!(response = %response.trim(), "Unparseable rerank response, using similarity order");
                    }
                    order
                }
                Err(e) => {
                    error!(error = %e, "Error in LLM reranking");
                    None
                }
            },
            None => None,
        };

        let mut reranked = match order {
            Some(order) => apply_order(candidates, &order),
            None => {
                let mut by_similarity = candidates;
                by_similarity.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
                by_similarity
            }
        };

        reranked.truncate(top_k);
        for (i, c) in reranked.iter_mut().enumerate() {
            c.rank = Some(i + 1);
        }
        reranked
    }

    /// Retrieve `top_k_retrieval` candidates and rerank down to `top_k_rerank`
    pub async fn search_and_rerank(
        &self,
        query: &str,
        adjudicator: Option<&Adjudicator>,
    ) -> Vec<RetrievedEvidence> {
        let candidates = self
            .search(query, Some(self.settings.top_k_retrieval), None, None)
            .await;
        let adjudicator = adjudicator.filter(|_| self.settings.llm_rerank);
        self.rerank(query, candidates, Some(self.settings.top_k_rerank), adjudicator)
            .await
    }
}

/// Put `order` first, then everything it omitted, in original order
fn apply_order(candidates: Vec<RetrievedEvidence>, order: &[usize]) -> Vec<RetrievedEvidence> {
    let mut slots: Vec<Option<RetrievedEvidence>> = candidates.into_iter().map(Some).collect();
    let mut reordered = Vec::with_capacity(slots.len());

    for &index in order {
        if let Some(c) = slots.get_mut(index).and_then(Option::take) {
            reordered.push(c);
        }
    }
    reordered.extend(slots.into_iter().flatten());
    reordered
}
