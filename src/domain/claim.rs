//! Claims extracted from input text.

use serde::{Deserialize, Serialize};

/// How a claim was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Sentence segmentation plus a syntactic filter
    RuleBased,

    /// Language model asked to list the claims
    ModelAssisted,

    /// Supplied verbatim by the caller
    Verbatim,
}

impl Default for ExtractionMethod {
    fn default() -> Self {
        Self::RuleBased
    }
}

impl std::fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::RuleBased => "rule",
            Self::ModelAssisted => "model",
            Self::Verbatim => "verbatim",
        };
        f.write_str(name)
    }
}

/// A candidate factual statement, not yet verified.
///
/// Claims are never persisted; they live for the duration of one
/// verification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Statement text (trimmed)
    pub text: String,

    /// Provenance of the statement
    pub method: ExtractionMethod,
}

impl Claim {
    /// Create a claim with the given provenance
    pub fn new(text: impl Into<String>, method: ExtractionMethod) -> Self {
        Self {
            text: text.into().trim().to_string(),
            method,
        }
    }

    /// Wrap caller-supplied text as a claim
    pub fn verbatim(text: impl Into<String>) -> Self {
        Self::new(text, ExtractionMethod::Verbatim)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl AsRef<str> for Claim {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl From<&str> for Claim {
    fn from(text: &str) -> Self {
        Self::verbatim(text)
    }
}

impl From<String> for Claim {
    fn from(text: String) -> Self {
        Self::verbatim(text)
    }
}
