//! Stored evidence units and retrieval results.

use serde::{Deserialize, Serialize};

/// Placeholder shown when a metadata field is empty
pub const UNKNOWN: &str = "unknown";

/// Provenance attached to every stored fact
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactMetadata {
    #[serde(default)]
    pub source: String,

    #[serde(default)]
    pub date: String,

    #[serde(default)]
    pub context: String,
}

impl FactMetadata {
    pub fn new(
        source: impl Into<String>,
        date: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            date: date.into(),
            context: context.into(),
        }
    }

    /// Source, or "unknown" when empty
    pub fn source_or_unknown(&self) -> &str {
        non_empty_or_unknown(&self.source)
    }

    /// Date, or "unknown" when empty
    pub fn date_or_unknown(&self) -> &str {
        non_empty_or_unknown(&self.date)
    }
}

fn non_empty_or_unknown(value: &str) -> &str {
    if value.trim().is_empty() {
        UNKNOWN
    } else {
        value
    }
}

/// A fact waiting to be embedded and stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFact {
    pub text: String,
    #[serde(default)]
    pub metadata: FactMetadata,
}

impl NewFact {
    pub fn new(text: impl Into<String>, metadata: FactMetadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}

/// A persisted fact (embedding omitted)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    /// Opaque, collision-free identifier assigned by the store
    pub id: String,

    pub text: String,

    pub metadata: FactMetadata,

    /// Insertion time (RFC 3339)
    pub created_at: String,
}

/// A fact returned by a similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedEvidence {
    pub id: String,

    pub text: String,

    pub metadata: FactMetadata,

    /// `1 - cosine distance`, clamped to [0, 1]
    pub similarity: f32,

    /// Position after reranking (1-based)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<usize>,
}

impl RetrievedEvidence {
    /// Convert a store distance into a similarity-scored result
    pub fn from_distance(
        id: String,
        text: String,
        metadata: FactMetadata,
        distance: f32,
    ) -> Self {
        Self {
            id,
            text,
            metadata,
            similarity: (1.0 - distance).clamp(0.0, 1.0),
            rank: None,
        }
    }

    /// Render as an evidence paragraph for the verification prompt
    pub fn to_prompt_block(&self, position: usize) -> String {
        format!(
            "Evidence {}:\n{}\nSource: {}\nDate: {}",
            position,
            self.text,
            self.metadata.source_or_unknown(),
            self.metadata.date_or_unknown()
        )
    }
}
