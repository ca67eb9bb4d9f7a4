//! Language-model adjudication.
//!
//! Wraps a [`LanguageModel`] with the structured-output contract the rest
//! of the pipeline relies on: fenced JSON is unwrapped and parsed strictly,
//! and verdict generation always yields a [`Verdict`], even when the
//! backend or the response fails.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, instrument};

use super::prompts;
use crate::adapters::{AdapterError, LanguageModel};
use crate::domain::{FactMetadata, NewFact, Polarity, Verdict, VerdictLabel};

/// Confidence used when the model omits one
pub const DEFAULT_CONFIDENCE: f64 = 0.5;

const NO_REASONING: &str = "No reasoning provided";

/// Errors from a single adjudicator call
#[derive(Debug, Error)]
pub enum AdjudicatorError {
    #[error("Backend error: {0}")]
    Backend(#[from] AdapterError),

    #[error("Failed to parse structured response: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        response: String,
    },

    #[error("Unexpected response shape: {0}")]
    Shape(String),
}

/// Remove a surrounding Markdown code fence (```` ```json ```` or ```` ``` ````)
pub fn strip_code_fence(response: &str) -> &str {
    let mut body = response.trim();
    if let Some(rest) = body.strip_prefix("```json") {
        body = rest;
    } else if let Some(rest) = body.strip_prefix("```") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix("```") {
        body = rest;
    }
    body.trim()
}

/// Parsed verification fields before banding
#[derive(Debug, Clone, PartialEq)]
pub struct RawJudgement {
    pub polarity: Polarity,
    pub confidence: f64,
    pub reasoning: String,
}

impl RawJudgement {
    /// Read verdict, confidence and reasoning out of a model response object
    pub fn from_value(value: &Value) -> Result<Self, AdjudicatorError> {
        let object = value
            .as_object()
            .ok_or_else(|| AdjudicatorError::Shape(format!("expected a JSON object, got {}", value)))?;

        let polarity = match object.get("verdict") {
            Some(Value::String(raw)) => Polarity::parse(raw),
            _ => Polarity::Unrecognized,
        };

        let confidence = match object.get("confidence") {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|c| c.is_finite())
        .unwrap_or(DEFAULT_CONFIDENCE)
        .clamp(0.0, 1.0);

        let reasoning = ["reasoning", "explanation"]
            .iter()
            .find_map(|key| object.get(*key).and_then(Value::as_str))
            .unwrap_or(NO_REASONING)
            .to_string();

        Ok(Self {
            polarity,
            confidence,
            reasoning,
        })
    }

    pub fn label(&self) -> VerdictLabel {
        VerdictLabel::from_polarity(self.polarity, self.confidence)
    }
}

#[derive(Debug, Deserialize)]
struct GeneratedFact {
    #[serde(default)]
    fact: String,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    context: Option<String>,
}

/// Language-model front end for generation, structured output and verdicts
#[derive(Clone)]
pub struct Adjudicator {
    model: Arc<dyn LanguageModel>,
}

impl std::fmt::Debug for Adjudicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Adjudicator")
            .field("model", &self.model.name())
            .finish()
    }
}

impl Adjudicator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Free-text generation
    pub async fn generate(&self, prompt: &str, system: Option<&str>) -> Result<String, AdjudicatorError> {
        self.model.generate(prompt, system).await.map_err(|e| {
            error!(backend = self.model.name(), error = %e, "Error generating LLM response");
            AdjudicatorError::from(e)
        })
    }

    /// Generate and parse a JSON value. Parse failures are errors.
    pub async fn generate_structured(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<Value, AdjudicatorError> {
        self.generate_as(prompt, system).await
    }

    /// Generate and deserialize into `T`
    pub async fn generate_as<T: DeserializeOwned>(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<T, AdjudicatorError> {
        let response = self.generate(prompt, system).await?;
        let body = strip_code_fence(&response);
        serde_json::from_str(body).map_err(|source| {
            error!(error = %source, "Failed to parse JSON response");
            debug!(response = %response, "Unparseable response");
            AdjudicatorError::Parse {
                source,
                response: response.clone(),
            }
        })
    }

    /// Judge `claim` against an evidence block.
    ///
    /// Never fails: any error becomes an `Unverifiable` verdict with zero
    /// confidence and the failure in its reasoning.
    #[instrument(skip(self, claim, evidence), fields(claim_len = claim.len(), evidence_len = evidence.len()))]
    pub async fn verify(&self, claim: &str, evidence: &str) -> Verdict {
        let prompt = prompts::verification(claim, evidence);
        let outcome = self
            .generate_structured(&prompt, Some(prompts::VERIFICATION_SYSTEM))
            .await
            .and_then(|value| RawJudgement::from_value(&value));

        match outcome {
            Ok(judgement) => {
                let label = judgement.label();
                info!(verdict = %label, confidence = judgement.confidence, "Claim verification");
                Verdict {
                    claim: claim.to_string(),
                    label,
                    confidence: judgement.confidence,
                    reasoning: judgement.reasoning,
                    evidence: Vec::new(),
                    retrieved: Vec::new(),
                    vague: false,
                }
            }
            Err(e) => {
                error!(error = %e, "Error verifying claim");
                Verdict::unverifiable(claim, format!("Error during verification: {}", e))
            }
        }
    }

    /// Pull structured fact records out of prose
    pub async fn generate_facts(&self, text: &str) -> Result<Vec<NewFact>, AdjudicatorError> {
        let records: Vec<GeneratedFact> = self
            .generate_as(&prompts::fact_generation(text), None)
            .await?;

        let facts: Vec<NewFact> = records
            .into_iter()
            .filter(|r| !r.fact.trim().is_empty())
            .map(|r| {
                NewFact::new(
                    r.fact.trim(),
                    FactMetadata::new(
                        r.source.unwrap_or_default(),
                        r.date.unwrap_or_default(),
                        r.context.unwrap_or_default(),
                    ),
                )
            })
            .collect();

        debug!(count = facts.len(), "Generated facts");
        Ok(facts)
    }
}
