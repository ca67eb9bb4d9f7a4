//! Domain types for the fact checker.
//!
//! This module contains the core data structures:
//! - Claim: A statement awaiting verification
//! - Fact: A stored, embedded evidence unit
//! - Verdict: The labelled outcome of verification

pub mod claim;
pub mod fact;
pub mod verdict;

// Re-export commonly used types
pub use claim::{Claim, ExtractionMethod};
pub use fact::{Fact, FactMetadata, NewFact, RetrievedEvidence};
pub use verdict::{BatchSummary, Polarity, Verdict, VerdictLabel};
