//! Prompt templates sent to the language model.
//!
//! Each builder fills one template. The response formats are part of the
//! contract with the parsers in the adjudicator, extractor and retriever:
//! extraction expects one claim per line, verification a JSON object,
//! reranking a comma-separated list of 1-based indices.

use crate::domain::RetrievedEvidence;

/// System prompt for verdicts
pub const VERIFICATION_SYSTEM: &str =
    "You are a careful fact-checker. Judge claims strictly against the evidence you are given.";

/// Claim extraction: newline-delimited claims
pub fn claim_extraction(text: &str) -> String {
    format!(
        "Extract all factual claims from the following text.\n\
         A claim is a statement that can be verified as true or false.\n\
         \n\
         Text: {text}\n\
         \n\
         Return only the claims, one per line. Be precise and specific."
    )
}

/// Verification: JSON object with verdict, confidence and reasoning
pub fn verification(claim: &str, evidence: &str) -> String {
    format!(
        r#"Verify the following claim against the provided evidence.

Claim: {claim}

Evidence:
{evidence}

Based on the evidence provided, determine:
1. Verdict: One of "True", "False", or "Unverifiable"
   - "True" if evidence supports the claim
   - "False" if evidence contradicts the claim
   - "Unverifiable" if evidence is insufficient or unclear
2. Confidence: a number between 0.0 and 1.0 for how strongly the evidence decides the verdict
3. Reasoning: Brief explanation (2-3 sentences) explaining your verdict

Format your response as JSON:
{{
    "verdict": "True" | "False" | "Unverifiable",
    "confidence": 0.0-1.0,
    "reasoning": "Your explanation here"
}}"#
    )
}

/// Reranking: numbered candidate list, answer is comma-separated indices
pub fn reranking(claim: &str, candidates: &[RetrievedEvidence]) -> String {
    let results = candidates
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}\n   Source: {}", i + 1, c.text, c.metadata.source_or_unknown()))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Rank the following search results by relevance to the claim.\n\
         \n\
         Claim: {claim}\n\
         \n\
         Search Results:\n\
         {results}\n\
         \n\
         Rank them from most relevant (1) to least relevant ({count}).\n\
         Return only the indices in order of relevance, comma-separated.",
        count = candidates.len()
    )
}

/// Fact generation: JSON array of fact records
pub fn fact_generation(text: &str) -> String {
    format!(
        r#"Extract structured factual information from the following text.

Text: {text}

Extract:
1. Key factual statements
2. Source information
3. Date/context if available

Format as JSON array:
[
    {{
        "fact": "The factual statement",
        "source": "Source information",
        "date": "Date if available",
        "context": "Additional context"
    }}
]"#
    )
}
