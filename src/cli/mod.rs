//! Command-line interface for factcheck.
//!
//! Provides commands for verifying claims and text, extracting claims,
//! searching evidence, ingesting facts, and managing the fact store.

use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::warn;

use crate::adapters::{
    AnthropicClient, ApiCredential, Embedder, HttpEmbedder, ANTHROPIC_API_KEY_ENV,
};
use crate::config::Settings;
use crate::core::{Adjudicator, ClaimExtractor, FactCheckPipeline, Retriever};
use crate::domain::{BatchSummary, ExtractionMethod, RetrievedEvidence, Verdict};
use crate::ingest::{CsvIngestor, FactLoader, IngestReport, TextIngestor};
use crate::store::EvidenceStore;

pub mod facts;

/// Optional bearer token for hosted embedding endpoints
pub const EMBEDDING_API_KEY_ENV: &str = "FACTCHECK_EMBEDDING_API_KEY";

/// factcheck - Verify factual claims against a curated evidence base
#[derive(Parser, Debug)]
#[command(name = "factcheck")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to the nearest .factcheck/config.yaml)
    #[arg(long, global = true, env = "FACTCHECK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Verify a single claim
    Verify {
        /// Claim to verify
        claim: String,

        /// Judge against this text instead of retrieving evidence
        #[arg(short, long)]
        evidence: Option<String>,

        /// Print the verdict as JSON
        #[arg(long)]
        json: bool,
    },

    /// Extract and verify every claim in a text
    Check {
        /// Input file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Claim extraction method
        #[arg(short, long, value_enum, default_value = "rule")]
        method: MethodArg,

        /// Verify the whole text as one claim
        #[arg(long)]
        no_extract: bool,

        /// Print verdicts as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the claims found in a text
    Extract {
        /// Input file (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Claim extraction method
        #[arg(short, long, value_enum, default_value = "rule")]
        method: MethodArg,
    },

    /// Search the evidence store
    Search {
        /// Search query
        query: String,

        /// Maximum results
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Minimum similarity (0.0-1.0)
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Rerank results with the language model
        #[arg(long)]
        rerank: bool,
    },

    /// Load verified facts from a CSV file
    Ingest {
        /// CSV file (defaults to the configured ingest path)
        csv: Option<PathBuf>,

        /// Facts embedded per batch
        #[arg(short, long)]
        batch_size: Option<usize>,
    },

    /// Extract facts from prose with the language model and store them
    IngestText {
        /// Text file to read
        file: PathBuf,
    },

    /// Manage stored facts
    Facts {
        #[command(subcommand)]
        command: facts::FactsCommands,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Extraction method for CLI (maps to ExtractionMethod)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum MethodArg {
    /// Sentence splitting with a syntactic filter
    Rule,

    /// Ask the language model
    Model,
}

impl From<MethodArg> for ExtractionMethod {
    fn from(m: MethodArg) -> Self {
        match m {
            MethodArg::Rule => ExtractionMethod::RuleBased,
            MethodArg::Model => ExtractionMethod::ModelAssisted,
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self, settings: Settings) -> Result<()> {
        match self.command {
            Commands::Verify {
                claim,
                evidence,
                json,
            } => verify(&settings, &claim, evidence.as_deref(), json).await,
            Commands::Check {
                input,
                method,
                no_extract,
                json,
            } => check(&settings, input, method.into(), !no_extract, json).await,
            Commands::Extract { input, method } => extract(&settings, input, method.into()).await,
            Commands::Search {
                query,
                top_k,
                threshold,
                rerank,
            } => search(&settings, &query, top_k, threshold, rerank).await,
            Commands::Ingest { csv, batch_size } => ingest_csv(&settings, csv, batch_size).await,
            Commands::IngestText { file } => ingest_text(&settings, &file).await,
            Commands::Facts { command } => facts::execute(&settings, command),
            Commands::Config => show_config(&settings),
        }
    }
}

/// Open the configured store, warning loudly if it had to be reset
pub(crate) fn open_store(settings: &Settings) -> Result<Arc<EvidenceStore>> {
    let store = EvidenceStore::open(
        &settings.store.path,
        &settings.store.collection,
        settings.embedding.dimension,
        settings.retrieval.metric,
    )
    .with_context(|| format!("Failed to open evidence store at {}", settings.store.path.display()))?;

    if let Some(dropped) = store.dropped_on_open() {
        eprintln!(
            "⚠️  Collection '{}' was recreated for dimension {}; {} stored facts were dropped. Re-ingest your facts.",
            store.collection(),
            store.dimension(),
            dropped
        );
    }
    Ok(Arc::new(store))
}

fn build_embedder(settings: &Settings) -> Result<Arc<dyn Embedder>> {
    let mut embedder = HttpEmbedder::new(&settings.embedding, settings.retry.clone())
        .context("Failed to create embedding client")?;
    if let Ok(credential) = ApiCredential::from_env(EMBEDDING_API_KEY_ENV, "embedding") {
        embedder = embedder.with_credential(credential);
    }
    Ok(Arc::new(embedder))
}

/// Language model client; a missing API key is fatal here, before any request
fn build_adjudicator(settings: &Settings) -> Result<Adjudicator> {
    let client = AnthropicClient::from_env(&settings.llm, settings.retry.clone())
        .with_context(|| format!("{} must be set to use the language model", ANTHROPIC_API_KEY_ENV))?;
    Ok(Adjudicator::new(Arc::new(client)))
}

fn build_retriever(settings: &Settings) -> Result<Retriever> {
    Ok(Retriever::new(
        build_embedder(settings)?,
        open_store(settings)?,
        settings.retrieval.clone(),
    ))
}

fn build_pipeline(settings: &Settings) -> Result<FactCheckPipeline> {
    let adjudicator = build_adjudicator(settings)?;
    Ok(FactCheckPipeline::new(
        ClaimExtractor::new(),
        build_retriever(settings)?,
        adjudicator,
        settings.verification.clone(),
    ))
}

fn build_loader(settings: &Settings, batch_size: Option<usize>) -> Result<FactLoader> {
    Ok(FactLoader::new(
        build_embedder(settings)?,
        open_store(settings)?,
        batch_size.unwrap_or(settings.ingest.batch_size),
    ))
}

/// Read input from a file, or from stdin when it is piped
fn read_input(input: Option<PathBuf>) -> Result<String> {
    let text = if let Some(path) = input {
        std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read input file: {}", path.display()))?
    } else if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .context("Failed to read from stdin")?;
        buffer
    } else {
        anyhow::bail!("No input provided. Use --input <file> or pipe to stdin");
    };

    if text.trim().is_empty() {
        anyhow::bail!("Input is empty");
    }
    Ok(text)
}

async fn verify(settings: &Settings, claim: &str, evidence: Option<&str>, json: bool) -> Result<()> {
    let pipeline = build_pipeline(settings)?;
    let verdict = pipeline.verify_claim(claim, evidence).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&verdict)?);
    } else {
        print_verdict(&verdict);
    }
    Ok(())
}

async fn check(
    settings: &Settings,
    input: Option<PathBuf>,
    method: ExtractionMethod,
    extract: bool,
    json: bool,
) -> Result<()> {
    let text = read_input(input)?;
    let pipeline = build_pipeline(settings)?;
    let verdicts = pipeline.verify_text(&text, extract, method).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&verdicts)?);
        return Ok(());
    }

    if verdicts.is_empty() {
        println!("No verifiable claims found.");
        return Ok(());
    }

    for (i, verdict) in verdicts.iter().enumerate() {
        println!("\n═══ Claim {} of {} ═══", i + 1, verdicts.len());
        print_verdict(verdict);
    }

    let summary = BatchSummary::from_verdicts(&verdicts);
    let confident = verdicts
        .iter()
        .filter(|v| v.confidence >= settings.verification.confidence_threshold)
        .count();
    println!("\nSummary: {} claims", summary.total);
    println!("  ✅ True:         {}", summary.true_count);
    println!("  ❌ False:        {}", summary.false_count);
    println!("  ❔ Unverifiable: {}", summary.unverifiable_count);
    println!(
        "  Confidence ≥ {:.0}%: {}",
        settings.verification.confidence_threshold * 100.0,
        confident
    );
    Ok(())
}

async fn extract(settings: &Settings, input: Option<PathBuf>, method: ExtractionMethod) -> Result<()> {
    let text = read_input(input)?;
    let extractor = ClaimExtractor::new();

    let claims = match method {
        ExtractionMethod::ModelAssisted => {
            let adjudicator = build_adjudicator(settings)?;
            extractor.extract(&text, method, Some(&adjudicator)).await
        }
        _ => extractor.extract(&text, method, None).await,
    };

    if claims.is_empty() {
        println!("No claims found.");
        return Ok(());
    }
    for (i, claim) in claims.iter().enumerate() {
        println!("{}. {}", i + 1, claim.text);
    }
    eprintln!("\n[{} claim(s), method: {}]", claims.len(), method);
    Ok(())
}

async fn search(
    settings: &Settings,
    query: &str,
    top_k: Option<usize>,
    threshold: Option<f32>,
    rerank: bool,
) -> Result<()> {
    let retriever = build_retriever(settings)?;
    let mut results = retriever.search(query, top_k, threshold, None).await;

    if rerank {
        let adjudicator = build_adjudicator(settings)?;
        let k = results.len();
        results = retriever.rerank(query, results, Some(k), Some(&adjudicator)).await;
    }

    if results.is_empty() {
        println!("No evidence found for: {}", query);
        return Ok(());
    }

    println!("Found {} result(s) for \"{}\":\n", results.len(), query);
    for (i, e) in results.iter().enumerate() {
        print_evidence(i + 1, e);
    }
    Ok(())
}

async fn ingest_csv(settings: &Settings, csv: Option<PathBuf>, batch_size: Option<usize>) -> Result<()> {
    let path = csv.unwrap_or_else(|| settings.ingest.csv_path.clone());
    if !path.exists() {
        anyhow::bail!("CSV file not found: {}", path.display());
    }

    eprintln!("📥 Ingesting facts from: {}", path.display());
    let ingestor = CsvIngestor::new(build_loader(settings, batch_size)?);
    let report = ingestor
        .ingest(&path)
        .await
        .with_context(|| format!("Failed to ingest {}", path.display()))?;
    print_report(&report);
    Ok(())
}

async fn ingest_text(settings: &Settings, file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read input file: {}", file.display()))?;
    if text.trim().is_empty() {
        anyhow::bail!("Input is empty");
    }

    eprintln!("📥 Extracting facts from: {}", file.display());
    let ingestor = TextIngestor::new(build_loader(settings, None)?, build_adjudicator(settings)?);
    let report = ingestor.ingest(&text).await.context("Failed to ingest text")?;
    print_report(&report);
    Ok(())
}

fn show_config(settings: &Settings) -> Result<()> {
    let key_set = std::env::var(ANTHROPIC_API_KEY_ENV)
        .map(|v| !v.trim().is_empty())
        .unwrap_or(false);

    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("  factcheck Configuration");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    println!(
        "Config file: {}",
        settings
            .config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!("Home:        {}", settings.home.display());
    println!();
    println!("Store:");
    println!("  Path:       {}", settings.store.path.display());
    println!("  Collection: {}", settings.store.collection);
    println!();
    println!("Embedding:");
    println!("  Model:     {}", settings.embedding.model);
    println!("  Dimension: {}", settings.embedding.dimension);
    println!("  Endpoint:  {}", settings.embedding.base_url);
    println!();
    println!("Retrieval:");
    println!("  Threshold:      {}", settings.retrieval.similarity_threshold);
    println!("  Top-k retrieve: {}", settings.retrieval.top_k_retrieval);
    println!("  Top-k rerank:   {}", settings.retrieval.top_k_rerank);
    println!("  Metric:         {}", settings.retrieval.metric);
    println!("  LLM rerank:     {}", settings.retrieval.llm_rerank);
    println!();
    println!("Language model:");
    println!("  Model:       {}", settings.llm.model);
    println!("  Max tokens:  {}", settings.llm.max_tokens);
    println!("  Temperature: {}", settings.llm.temperature);
    println!("  API key:     {}", if key_set { "set" } else { "unset" });
    println!();
    println!("Verification:");
    println!("  Concurrency:   {}", settings.verification.concurrency);
    println!("  Claim timeout: {}s", settings.verification.claim_timeout_seconds);
    println!();
    println!("Ingest:");
    println!("  CSV path:   {}", settings.ingest.csv_path.display());
    println!("  Batch size: {}", settings.ingest.batch_size);

    if !key_set {
        warn!("{} is not set; verification commands will fail", ANTHROPIC_API_KEY_ENV);
    }
    Ok(())
}

fn verdict_icon(verdict: &Verdict) -> &'static str {
    if verdict.label.is_true() {
        "✅"
    } else if verdict.label.is_false() {
        "❌"
    } else {
        "❔"
    }
}

fn print_verdict(verdict: &Verdict) {
    println!("Claim: {}", verdict.claim);
    println!(
        "{} {} ({:.0}% confidence)",
        verdict_icon(verdict),
        verdict.label,
        verdict.confidence * 100.0
    );
    if verdict.vague {
        println!("   ⚠️  Claim is vague; the verdict may be weak");
    }
    println!("\nReasoning: {}", verdict.reasoning);

    if !verdict.retrieved.is_empty() {
        println!("\nEvidence:");
        for (i, e) in verdict.retrieved.iter().take(verdict.evidence.len()).enumerate() {
            print_evidence(i + 1, e);
        }
    } else if !verdict.evidence.is_empty() {
        println!("\nEvidence:");
        for (i, text) in verdict.evidence.iter().enumerate() {
            println!("  {}. {}", i + 1, text);
        }
    }
}

fn print_evidence(position: usize, e: &RetrievedEvidence) {
    println!("  {}. {}", position, e.text);
    println!(
        "     Source: {} | Date: {} | Similarity: {:.2}",
        e.metadata.source_or_unknown(),
        e.metadata.date_or_unknown(),
        e.similarity
    );
}

fn print_report(report: &IngestReport) {
    eprintln!("\n✅ Ingestion finished");
    eprintln!("   Rows read:      {}", report.rows_read);
    eprintln!("   Rows skipped:   {}", report.rows_skipped);
    eprintln!("   Facts added:    {}", report.facts_added);
    eprintln!("   Failed batches: {}", report.batches_failed);
    eprintln!("   Store count:    {} → {}", report.count_before, report.count_after);
}
