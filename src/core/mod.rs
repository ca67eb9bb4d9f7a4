//! Retrieval-and-verification core.
//!
//! This module contains:
//! - Adjudicator: Language-model verdicts and structured output
//! - Extractor: Claim extraction (rule-based or model-assisted)
//! - Retriever: Evidence search, thresholding and reranking
//! - Pipeline: End-to-end claim verification

pub mod adjudicator;
pub mod extractor;
pub mod pipeline;
pub mod prompts;
pub mod retriever;
mod syntax;

// Re-export commonly used types
pub use adjudicator::{strip_code_fence, Adjudicator, AdjudicatorError, RawJudgement};
pub use extractor::{parse_claim_lines, ClaimExtractor};
pub use pipeline::{FactCheckPipeline, NO_EVIDENCE_REASONING};
pub use retriever::{is_vague_claim, parse_ranking, Retriever};
