//! Deterministic stand-ins for the embedding and language-model backends.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use factcheck::adapters::{AdapterError, Embedder, LanguageModel};
use factcheck::config::{RetrievalSettings, VerificationSettings};
use factcheck::core::{Adjudicator, ClaimExtractor, FactCheckPipeline, Retriever};
use factcheck::store::EvidenceStore;

/// Embeds text as counts of keyword groups, one dimension per group.
///
/// Texts sharing the same groups in the same proportions embed identically;
/// texts with no keywords embed as the zero vector (similarity 0).
pub struct KeywordEmbedder {
    groups: Vec<Vec<&'static str>>,
    pub calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn new(groups: &[&[&'static str]]) -> Self {
        Self {
            groups: groups.iter().map(|g| g.to_vec()).collect(),
            calls: AtomicUsize::new(0),
        }
    }

    /// Groups used across the integration tests
    pub fn standard() -> Self {
        Self::new(&[
            &["election", "turnout", "vote", "voters"],
            &["2024", "62"],
            &["paris", "france", "capital"],
            &["moon", "nasa", "apollo", "landing"],
        ])
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .map(|w| w.to_lowercase())
            .collect();
        self.groups
            .iter()
            .map(|group| words.iter().filter(|w| group.contains(&w.as_str())).count() as f32)
            .collect()
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn name(&self) -> &str {
        "keyword"
    }

    fn dimension(&self) -> usize {
        self.groups.len()
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|t| self.vector(t)).collect())
    }
}

/// Language model that answers by prompt kind and counts every call
pub struct ScriptedModel {
    pub verification: Mutex<String>,
    pub rerank: Mutex<String>,
    pub extraction: Mutex<String>,
    /// Delay applied to verification calls whose claim contains "slow"
    pub slow_delay: Duration,
    pub calls: AtomicUsize,
    pub verify_calls: AtomicUsize,
    pub prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(verification: &str) -> Self {
        Self {
            verification: Mutex::new(verification.to_string()),
            rerank: Mutex::new("1".to_string()),
            extraction: Mutex::new(String::new()),
            slow_delay: Duration::from_secs(5),
            calls: AtomicUsize::new(0),
            verify_calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn true_like(confidence: f64) -> Self {
        Self::new(&format!(
            r#"{{"verdict": "True", "confidence": {}, "reasoning": "Evidence 1 supports the claim."}}"#,
            confidence
        ))
    }

    pub fn with_extraction(self, extraction: &str) -> Self {
        *self.extraction.lock().unwrap() = extraction.to_string();
        self
    }

    pub fn with_rerank(self, rerank: &str) -> Self {
        *self.rerank.lock().unwrap() = rerank.to_string();
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str, _system: Option<&str>) -> Result<String, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());

        if prompt.starts_with("Rank the following") {
            return Ok(self.rerank.lock().unwrap().clone());
        }
        if prompt.starts_with("Extract all factual claims") {
            return Ok(self.extraction.lock().unwrap().clone());
        }

        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        let claim_line = prompt.lines().find(|l| l.starts_with("Claim: ")).unwrap_or("");
        if claim_line.contains("slow") {
            tokio::time::sleep(self.slow_delay).await;
        }
        if claim_line.contains("explode") {
            return Err(AdapterError::Api {
                status: 500,
                message: "backend exploded".into(),
            });
        }
        Ok(self.verification.lock().unwrap().clone())
    }
}

/// Language model whose every call fails
pub struct FailingModel;

#[async_trait]
impl LanguageModel for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    async fn generate(&self, _prompt: &str, _system: Option<&str>) -> Result<String, AdapterError> {
        Err(AdapterError::Timeout(Duration::from_secs(60)))
    }
}

/// In-memory store sized for [`KeywordEmbedder::standard`]
pub fn memory_store() -> Arc<EvidenceStore> {
    Arc::new(EvidenceStore::open_in_memory("test_facts", 4).unwrap())
}

pub fn pipeline(
    embedder: Arc<KeywordEmbedder>,
    store: Arc<EvidenceStore>,
    model: Arc<dyn LanguageModel>,
    verification: VerificationSettings,
) -> FactCheckPipeline {
    FactCheckPipeline::new(
        ClaimExtractor::new(),
        Retriever::new(embedder, store, RetrievalSettings::default()),
        Adjudicator::new(model),
        verification,
    )
}
