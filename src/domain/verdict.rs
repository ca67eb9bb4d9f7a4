//! Verdict labels and verification results.
//!
//! The label is a pure function of the model's raw polarity and its
//! confidence:
//!
//! | polarity   | >= 0.8           | >= 0.6       | < 0.6          |
//! |------------|------------------|--------------|----------------|
//! | true-like  | Definitely True  | Likely True  | Possibly True  |
//! | false-like | Definitely False | Likely False | Possibly False |
//!
//! Any other polarity is `Unverifiable`, whatever the confidence.

use serde::{Deserialize, Serialize};

use super::fact::RetrievedEvidence;

/// Confidence at or above which a verdict is "Definitely"
pub const DEFINITE_CONFIDENCE: f64 = 0.8;

/// Confidence at or above which a verdict is "Likely"
pub const LIKELY_CONFIDENCE: f64 = 0.6;

/// Raw polarity reported by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    TrueLike,
    FalseLike,
    Unrecognized,
}

impl Polarity {
    /// Classify a raw verdict string (case-insensitive)
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_uppercase().as_str() {
            "TRUE" | "CORRECT" | "ACCURATE" | "YES" => Self::TrueLike,
            "FALSE" | "INCORRECT" | "INACCURATE" | "NO" => Self::FalseLike,
            _ => Self::Unrecognized,
        }
    }
}

/// Closed set of verdict labels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VerdictLabel {
    #[serde(rename = "Definitely True")]
    DefinitelyTrue,
    #[serde(rename = "Likely True")]
    LikelyTrue,
    #[serde(rename = "Possibly True")]
    PossiblyTrue,
    #[serde(rename = "Definitely False")]
    DefinitelyFalse,
    #[serde(rename = "Likely False")]
    LikelyFalse,
    #[serde(rename = "Possibly False")]
    PossiblyFalse,
    #[serde(rename = "Unverifiable")]
    Unverifiable,
}

impl VerdictLabel {
    /// Band a polarity by confidence
    pub fn from_polarity(polarity: Polarity, confidence: f64) -> Self {
        match polarity {
            Polarity::TrueLike if confidence >= DEFINITE_CONFIDENCE => Self::DefinitelyTrue,
            Polarity::TrueLike if confidence >= LIKELY_CONFIDENCE => Self::LikelyTrue,
            Polarity::TrueLike => Self::PossiblyTrue,
            Polarity::FalseLike if confidence >= DEFINITE_CONFIDENCE => Self::DefinitelyFalse,
            Polarity::FalseLike if confidence >= LIKELY_CONFIDENCE => Self::LikelyFalse,
            Polarity::FalseLike => Self::PossiblyFalse,
            Polarity::Unrecognized => Self::Unverifiable,
        }
    }

    pub fn polarity(&self) -> Polarity {
        match self {
            Self::DefinitelyTrue | Self::LikelyTrue | Self::PossiblyTrue => Polarity::TrueLike,
            Self::DefinitelyFalse | Self::LikelyFalse | Self::PossiblyFalse => Polarity::FalseLike,
            Self::Unverifiable => Polarity::Unrecognized,
        }
    }

    pub fn is_true(&self) -> bool {
        self.polarity() == Polarity::TrueLike
    }

    pub fn is_false(&self) -> bool {
        self.polarity() == Polarity::FalseLike
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DefinitelyTrue => "Definitely True",
            Self::LikelyTrue => "Likely True",
            Self::PossiblyTrue => "Possibly True",
            Self::DefinitelyFalse => "Definitely False",
            Self::LikelyFalse => "Likely False",
            Self::PossiblyFalse => "Possibly False",
            Self::Unverifiable => "Unverifiable",
        }
    }
}

impl std::fmt::Display for VerdictLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of verifying one claim
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    pub claim: String,

    #[serde(rename = "verdict")]
    pub label: VerdictLabel,

    /// Model confidence in [0, 1]
    pub confidence: f64,

    pub reasoning: String,

    /// Evidence texts the verdict was reached against
    pub evidence: Vec<String>,

    /// Retrieved facts with metadata (empty when evidence was supplied)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retrieved: Vec<RetrievedEvidence>,

    /// Advisory vagueness flag, never gates verification
    #[serde(default)]
    pub vague: bool,
}

impl Verdict {
    /// Terminal "cannot verify" result
    pub fn unverifiable(claim: impl Into<String>, reasoning: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
            label: VerdictLabel::Unverifiable,
            confidence: 0.0,
            reasoning: reasoning.into(),
            evidence: Vec::new(),
            retrieved: Vec::new(),
            vague: false,
        }
    }

    pub fn with_evidence(mut self, evidence: Vec<String>) -> Self {
        self.evidence = evidence;
        self
    }

    pub fn with_retrieved(mut self, retrieved: Vec<RetrievedEvidence>) -> Self {
        self.retrieved = retrieved;
        self
    }

    pub fn with_vague(mut self, vague: bool) -> Self {
        self.vague = vague;
        self
    }
}

/// Label counts over a batch of verdicts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub true_count: usize,
    pub false_count: usize,
    pub unverifiable_count: usize,
}

impl BatchSummary {
    pub fn from_verdicts(verdicts: &[Verdict]) -> Self {
        verdicts.iter().fold(Self::default(), |mut acc, v| {
            acc.total += 1;
            match v.label.polarity() {
                Polarity::TrueLike => acc.true_count += 1,
                Polarity::FalseLike => acc.false_count += 1,
                Polarity::Unrecognized => acc.unverifiable_count += 1,
            }
            acc
        })
    }
}
