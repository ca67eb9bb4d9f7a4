//! Claim extraction.
//!
//! Two interchangeable strategies:
//! - Rule-based: sentence split plus a syntactic "subject and predicate" filter
//! - Model-assisted: the language model lists claims one per line, with
//!   fallback to the rule-based pass on any failure
//!
//! Extraction never fails the caller.

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, instrument, warn};

use super::adjudicator::Adjudicator;
use super::prompts;
use super::syntax;
use crate::domain::{Claim, ExtractionMethod};

lazy_static! {
    static ref NUMBERED_MARKER: Regex = Regex::new(r"^\d+[.)]\s+").unwrap();
}

/// Minimum sentence length (in characters) for a rule-based claim
pub const MIN_CLAIM_CHARS: usize = 20;

/// Splits free text into checkable claims
#[derive(Debug, Clone)]
pub struct ClaimExtractor {
    min_chars: usize,
}

impl Default for ClaimExtractor {
    fn default() -> Self {
        Self {
            min_chars: MIN_CLAIM_CHARS,
        }
    }
}

impl ClaimExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Extract claims with the requested strategy.
    ///
    /// Model-assisted extraction without an adjudicator degrades to the
    /// rule-based pass. `Verbatim` returns the whole text as one claim.
    pub async fn extract(
        &self,
        text: &str,
        method: ExtractionMethod,
        adjudicator: Option<&Adjudicator>,
    ) -> Vec<Claim> {
        match (method, adjudicator) {
            (ExtractionMethod::ModelAssisted, Some(adj)) => self.extract_with_model(text, adj).await,
            (ExtractionMethod::ModelAssisted, None) => {
                warn!("Model-assisted extraction requested without a language model, using rule-based");
                self.extract_rule_based(text)
            }
            (ExtractionMethod::RuleBased, _) => self.extract_rule_based(text),
            (ExtractionMethod::Verbatim, _) => {
                let claim = Claim::verbatim(text);
                if claim.text.is_empty() {
                    Vec::new()
                } else {
                    vec![claim]
                }
            }
        }
    }

    /// Accept sentences that are long enough, declarative, and have both a
    /// verb-like and a noun-like token
    pub fn extract_rule_based(&self, text: &str) -> Vec<Claim> {
        let claims: Vec<Claim> = syntax::split_sentences(text)
            .into_iter()
            .filter(|s| self.is_candidate(s))
            .map(|s| Claim::new(s, ExtractionMethod::RuleBased))
            .collect();

        info!(count = claims.len(), "Extracted claims using rule-based pass");
        claims
    }

    fn is_candidate(&self, sentence: &str) -> bool {
        let sentence = sentence.trim();
        sentence.chars().count() >= self.min_chars
            && !sentence.ends_with('?')
            && !sentence.ends_with('!')
            && syntax::has_subject_and_predicate(sentence)
    }

    /// Ask the language model for claims, falling back to the rule-based pass
    #[instrument(skip(self, text, adjudicator), fields(text_len = text.len()))]
    pub async fn extract_with_model(&self, text: &str, adjudicator: &Adjudicator) -> Vec<Claim> {
        match adjudicator.generate(&prompts::claim_extraction(text), None).await {
            Ok(response) => {
                let claims = parse_claim_lines(&response);
                info!(count = claims.len(), "Extracted claims using language model");
                claims
            }
            Err(e) => {
                error!(error = %e, "Error extracting claims with language model");
                info!("Falling back to rule-based extraction");
                self.extract_rule_based(text)
            }
        }
    }
}

/// One claim per non-trivial line, with leading list markers removed
pub fn parse_claim_lines(response: &str) -> Vec<Claim> {
    response
        .trim()
        .lines()
        .map(str::trim)
        .filter(|line| line.chars().count() > 2)
        .filter_map(|line| {
            let line = strip_list_marker(line);
            (!line.is_empty()).then(|| Claim::new(line, ExtractionMethod::ModelAssisted))
        })
        .collect()
}

fn strip_list_marker(line: &str) -> &str {
    // "1. claim" / "12) claim"; a leading decimal such as "3.5 million" is content
    if let Some(marker) = NUMBERED_MARKER.find(line) {
        return line[marker.end()..].trim();
    }
    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .or_else(|| line.strip_prefix("• "))
        .map(str::trim)
        .unwrap_or(line)
}
