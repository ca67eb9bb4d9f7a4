//! Pipeline Integration Tests
//!
//! End-to-end verification over an in-memory store with stub backends.

mod common;

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use common::{memory_store, pipeline, FailingModel, KeywordEmbedder, ScriptedModel};
use factcheck::config::VerificationSettings;
use factcheck::core::NO_EVIDENCE_REASONING;
use factcheck::domain::{ExtractionMethod, FactMetadata, NewFact, VerdictLabel};
use factcheck::ingest::{CsvIngestor, FactLoader};
use factcheck::store::EvidenceStore;
use tempfile::TempDir;

fn seed(embedder: &KeywordEmbedder, store: &EvidenceStore, facts: &[(&str, &str, &str)]) {
    let new_facts: Vec<NewFact> = facts
        .iter()
        .map(|(text, source, date)| NewFact::new(*text, FactMetadata::new(*source, *date, "")))
        .collect();
    let embeddings: Vec<Vec<f32>> = facts.iter().map(|(text, _, _)| embedder.vector(text)).collect();
    store.add(&new_facts, &embeddings).unwrap();
}

#[tokio::test]
async fn test_no_matching_facts_is_unverifiable_without_model_call() {
    let embedder = Arc::new(KeywordEmbedder::standard());
    let store = memory_store();
    seed(&embedder, &store, &[("NASA landed Apollo 11 on the Moon.", "NASA", "1969-07-20")]);
    let model = Arc::new(ScriptedModel::true_like(0.9));
    let pipeline = pipeline(embedder, store, model.clone(), VerificationSettings::default());

    let claim = "The Indian government announced free electricity to all farmers starting July 2025";
    let verdict = pipeline.verify_claim(claim, None).await;

    assert_eq!(verdict.label, VerdictLabel::Unverifiable);
    assert_eq!(verdict.confidence, 0.0);
    assert!(verdict.evidence.is_empty());
    assert!(verdict.retrieved.is_empty());
    assert_eq!(verdict.reasoning, NO_EVIDENCE_REASONING);
    assert_eq!(verdict.claim, claim);
    assert_eq!(model.calls(), 0);
}

#[tokio::test]
async fn test_ingested_fact_verifies_definitely_true() {
    let temp = TempDir::new().unwrap();
    let csv_path = temp.path().join("verified_facts.csv");
    let mut file = std::fs::File::create(&csv_path).unwrap();
    writeln!(file, "fact,source,date,context").unwrap();
    writeln!(file, "The 2024 election turnout was 62%.,ElectionCommission,2024-06-10,national").unwrap();
    writeln!(file, "Paris is the capital of France.,Atlas,,").unwrap();
    drop(file);

    let embedder = Arc::new(KeywordEmbedder::standard());
    let store = memory_store();
    let ingestor = CsvIngestor::new(FactLoader::new(embedder.clone(), store.clone(), 50));
    let report = ingestor.ingest(&csv_path).await.unwrap();
    assert_eq!(report.facts_added, 2);

    let model = Arc::new(ScriptedModel::true_like(0.9));
    let pipeline = pipeline(embedder, store, model.clone(), VerificationSettings::default());

    let verdict = pipeline
        .verify_claim("Election turnout in 2024 was 62 percent", None)
        .await;

    assert_eq!(verdict.label, VerdictLabel::DefinitelyTrue);
    assert_eq!(verdict.confidence, 0.9);
    assert_eq!(verdict.evidence, vec!["The 2024 election turnout was 62%."]);
    assert_eq!(verdict.retrieved.len(), 1);
    assert!(verdict.retrieved[0].similarity >= 0.65);
    assert_eq!(verdict.retrieved[0].metadata.source, "ElectionCommission");
    assert!(!verdict.vague);

    // One rerank call plus one verification call
    assert_eq!(model.calls(), 2);
    let prompts = model.prompts.lock().unwrap();
    let verification = prompts.last().unwrap();
    assert!(verification.contains("Evidence 1:\nThe 2024 election turnout was 62%.\nSource: ElectionCommission\nDate: 2024-06-10"));
}

#[tokio::test]
async fn test_adjudicator_failure_is_terminal_unverifiable() {
    let embedder = Arc::new(KeywordEmbedder::standard());
    let store = memory_store();
    seed(&embedder, &store, &[("The 2024 election turnout was 62%.", "ElectionCommission", "2024-06-10")]);
    let pipeline = pipeline(embedder, store, Arc::new(FailingModel), VerificationSettings::default());

    let verdict = pipeline
        .verify_claim("Election turnout in 2024 was 62 percent", None)
        .await;

    assert_eq!(verdict.label, VerdictLabel::Unverifiable);
    assert_eq!(verdict.confidence, 0.0);
    assert!(verdict.reasoning.starts_with("Error during verification:"));
    // Reranking failed too but fell back to similarity order
    assert_eq!(verdict.retrieved.len(), 1);
}

#[tokio::test]
async fn test_explicit_evidence_skips_retrieval() {
    let embedder = Arc::new(KeywordEmbedder::standard());
    let model = Arc::new(ScriptedModel::new(
        r#"{"verdict": "False", "confidence": 0.7, "reasoning": "The evidence gives 58%."}"#,
    ));
    let pipeline = pipeline(embedder.clone(), memory_store(), model.clone(), VerificationSettings::default());

    let evidence = "Official turnout in 2024 was 58%.";
    let verdict = pipeline
        .verify_claim("Election turnout in 2024 was 62 percent", Some(evidence))
        .await;

    assert_eq!(verdict.label, VerdictLabel::LikelyFalse);
    assert_eq!(verdict.evidence, vec![evidence]);
    assert!(verdict.retrieved.is_empty());
    assert_eq!(embedder.calls.load(std::sync::atomic::Ordering::SeqCst), 0);
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn test_batch_preserves_order_and_isolates_failures() {
    let embedder = Arc::new(KeywordEmbedder::standard());
    let store = memory_store();
    seed(&embedder, &store, &[("The 2024 election turnout was 62%.", "ElectionCommission", "2024-06-10")]);

    let mut model = ScriptedModel::true_like(0.85);
    model.slow_delay = Duration::from_secs(3);
    let settings = VerificationSettings {
        concurrency: 3,
        claim_timeout_seconds: 1,
        ..Default::default()
    };
    let pipeline = pipeline(embedder, store, Arc::new(model), settings);

    let claims = [
        "Election turnout explode in 2024 was 62",
        "Voters turnout in 2024 reached 62",
        "Election slow turnout in 2024 was 62",
        "Paris is the capital of France",
    ];
    let verdicts = pipeline.verify_multiple_claims(&claims).await;

    assert_eq!(verdicts.len(), 4);
    for (verdict, claim) in verdicts.iter().zip(claims) {
        assert_eq!(verdict.claim, claim);
    }

    assert_eq!(verdicts[0].label, VerdictLabel::Unverifiable);
    assert!(verdicts[0].reasoning.starts_with("Error during verification:"));

    assert_eq!(verdicts[1].label, VerdictLabel::DefinitelyTrue);

    assert_eq!(verdicts[2].label, VerdictLabel::Unverifiable);
    assert_eq!(verdicts[2].confidence, 0.0);
    assert!(verdicts[2].reasoning.contains("timed out"));

    assert_eq!(verdicts[3].label, VerdictLabel::Unverifiable);
    assert_eq!(verdicts[3].reasoning, NO_EVIDENCE_REASONING);
}

#[tokio::test]
async fn test_verify_text_with_model_extraction() {
    let embedder = Arc::new(KeywordEmbedder::standard());
    let store = memory_store();
    seed(&embedder, &store, &[("The 2024 election turnout was 62%.", "ElectionCommission", "2024-06-10")]);
    let model = Arc::new(
        ScriptedModel::true_like(0.65)
            .with_extraction("1. Election turnout in 2024 was 62 percent\n2. Paris is the capital of France\n"),
    );
    let pipeline = pipeline(embedder, store, model, VerificationSettings::default());

    let verdicts = pipeline
        .verify_text("Some article text.", true, ExtractionMethod::ModelAssisted)
        .await;

    assert_eq!(verdicts.len(), 2);
    assert_eq!(verdicts[0].claim, "Election turnout in 2024 was 62 percent");
    assert_eq!(verdicts[0].label, VerdictLabel::LikelyTrue);
    assert_eq!(verdicts[1].claim, "Paris is the capital of France");
    assert_eq!(verdicts[1].label, VerdictLabel::Unverifiable);
}

#[tokio::test]
async fn test_verify_text_without_extraction_or_claims() {
    let embedder = Arc::new(KeywordEmbedder::standard());
    let model = Arc::new(ScriptedModel::true_like(0.9));
    let pipeline = pipeline(embedder, memory_store(), model.clone(), VerificationSettings::default());

    let verdicts = pipeline
        .verify_text("Is any of this true?", true, ExtractionMethod::RuleBased)
        .await;
    assert!(verdicts.is_empty());

    let verdicts = pipeline
        .verify_text("  Some voters might say anything  ", false, ExtractionMethod::RuleBased)
        .await;
    assert_eq!(verdicts.len(), 1);
    assert_eq!(verdicts[0].claim, "Some voters might say anything");
    assert!(verdicts[0].vague);

    let verdicts = pipeline
        .verify_text(" \n\t ", false, ExtractionMethod::RuleBased)
        .await;
    assert!(verdicts.is_empty());
    assert_eq!(model.calls(), 0);
}
