//! Retrieval Integration Tests
//!
//! Threshold, ordering and rerank guarantees over a seeded store.

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use common::{memory_store, KeywordEmbedder, ScriptedModel};
use factcheck::config::RetrievalSettings;
use factcheck::core::{Adjudicator, Retriever};
use factcheck::domain::{FactMetadata, NewFact};

fn seeded_retriever() -> Retriever {
    let embedder = Arc::new(KeywordEmbedder::standard());
    let store = memory_store();
    let facts = [
        "The 2024 election turnout was 62%.",
        "Voter turnout rose in the election.",
        "The election was held in 2024.",
        "Paris is the capital of France.",
        "Turnout in 2024 hit 62 percent amid election fatigue in Paris.",
        "Apollo 11 made the first Moon landing.",
    ];
    let new_facts: Vec<NewFact> = facts
        .iter()
        .map(|t| NewFact::new(*t, FactMetadata::new("Archive", "", "")))
        .collect();
    let embeddings: Vec<Vec<f32>> = facts.iter().map(|t| embedder.vector(t)).collect();
    store.add(&new_facts, &embeddings).unwrap();

    let settings = RetrievalSettings {
        top_k_retrieval: 10,
        ..Default::default()
    };
    Retriever::new(embedder, store, settings)
}

#[tokio::test]
async fn test_search_respects_every_threshold() {
    let retriever = seeded_retriever();

    for threshold in [0.0_f32, 0.3, 0.5, 0.65, 0.8, 0.95, 1.0] {
        let results = retriever
            .search("Election turnout in 2024 was 62 percent", None, Some(threshold), None)
            .await;

        assert!(results.iter().all(|r| r.similarity >= threshold), "threshold {}", threshold);
        assert!(
            results.windows(2).all(|w| w[0].similarity >= w[1].similarity),
            "unsorted at threshold {}",
            threshold
        );
    }

    let loose = retriever.search("election turnout 2024 62", None, Some(0.0), None).await;
    let strict = retriever.search("election turnout 2024 62", None, Some(0.95), None).await;
    assert!(loose.len() > strict.len());
    assert!(strict.iter().any(|r| r.text == "The 2024 election turnout was 62%."));
}

#[tokio::test]
async fn test_rerank_is_a_permutation() {
    let retriever = seeded_retriever();
    let candidates = retriever
        .search("election turnout 2024 62", None, Some(0.0), None)
        .await;
    assert!(candidates.len() >= 4);
    let input_ids: HashSet<String> = candidates.iter().map(|c| c.id.clone()).collect();

    for response in ["2, 2, 99, 1", "4,3,2,1", "", "0, -3", "not a ranking"] {
        let model = Arc::new(ScriptedModel::true_like(0.9).with_rerank(response));
        let adjudicator = Adjudicator::new(model);

        let reranked = retriever
            .rerank("q", candidates.clone(), Some(candidates.len()), Some(&adjudicator))
            .await;

        let output_ids: Vec<String> = reranked.iter().map(|c| c.id.clone()).collect();
        let unique: HashSet<String> = output_ids.iter().cloned().collect();
        assert_eq!(output_ids.len(), candidates.len(), "response {:?}", response);
        assert_eq!(unique, input_ids, "response {:?}", response);
    }
}

#[tokio::test]
async fn test_rerank_model_order_wins() {
    let retriever = seeded_retriever();
    let candidates = retriever
        .search("election turnout 2024 62", None, Some(0.0), None)
        .await;

    let adjudicator = Adjudicator::new(Arc::new(ScriptedModel::true_like(0.9).with_rerank("3, 1")));
    let reranked = retriever
        .rerank("q", candidates.clone(), Some(3), Some(&adjudicator))
        .await;

    assert_eq!(reranked.len(), 3);
    assert_eq!(reranked[0].id, candidates[2].id);
    assert_eq!(reranked[1].id, candidates[0].id);
    assert_eq!(reranked[2].id, candidates[1].id);
    assert_eq!(reranked[2].rank, Some(3));
}
