//! factcheck - Retrieval-augmented claim verification
//!
//! Verifies natural-language factual claims against a curated evidence
//! base using semantic retrieval plus language-model adjudication.
//!
//! # Architecture
//!
//! ```text
//! text → [ClaimExtractor] → claims → for each claim:
//!     [Retriever] (embed → EvidenceStore → threshold → rerank) → evidence
//!     [Adjudicator] → Verdict
//! ```
//!
//! Verification never fails: missing evidence, backend outages and
//! malformed model output all end in an `Unverifiable` verdict.
//!
//! # Modules
//!
//! - `adapters`: External backends (embedding endpoint, Anthropic Messages API)
//! - `store`: SQLite-backed vector index of facts
//! - `core`: Extraction, retrieval, adjudication and the pipeline
//! - `domain`: Data structures (Claim, Fact, Verdict)
//! - `ingest`: CSV and prose ingestion
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Load verified facts
//! factcheck ingest verified_facts.csv
//!
//! # Verify a claim
//! factcheck verify "The 2024 election turnout was 62%"
//!
//! # Check every claim in a document
//! cat article.txt | factcheck check --method model
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod ingest;
pub mod store;

// Re-export main types at crate root for convenience
pub use adapters::{AdapterError, Embedder, LanguageModel};
pub use config::Settings;
pub use crate::core::{Adjudicator, ClaimExtractor, FactCheckPipeline, Retriever};
pub use domain::{Claim, ExtractionMethod, Fact, FactMetadata, NewFact, RetrievedEvidence, Verdict, VerdictLabel};
pub use store::EvidenceStore;
