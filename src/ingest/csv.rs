//! CSV fact ingestion.
//!
//! Expected header: `fact` (required), `source`, `date`, `context`
//! (optional, any order, case-insensitive). Extra columns are ignored.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{info, warn};

use super::{FactLoader, IngestError, IngestReport};
use crate::domain::fact::UNKNOWN;
use crate::domain::{FactMetadata, NewFact};

/// Column positions resolved from the header row
#[derive(Debug, Clone, Copy)]
struct Columns {
    fact: usize,
    source: Option<usize>,
    date: Option<usize>,
    context: Option<usize>,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self, IngestError> {
        let find = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
        Ok(Self {
            fact: find("fact").ok_or_else(|| IngestError::MissingColumn("fact".to_string()))?,
            source: find("source"),
            date: find("date"),
            context: find("context"),
        })
    }

    fn read(&self, record: &StringRecord) -> Option<NewFact> {
        let field = |i: Option<usize>| i.and_then(|i| record.get(i)).unwrap_or("").trim();

        let text = field(Some(self.fact));
        if text.is_empty() {
            return None;
        }

        let source = match field(self.source) {
            "" => UNKNOWN,
            s => s,
        };
        Some(NewFact::new(
            text,
            FactMetadata::new(source, field(self.date), field(self.context)),
        ))
    }
}

/// Loads a CSV file of verified facts into the evidence store
#[derive(Debug, Clone)]
pub struct CsvIngestor {
    loader: FactLoader,
}

impl CsvIngestor {
    pub fn new(loader: FactLoader) -> Self {
        Self { loader }
    }

    /// Ingest the CSV at `path`
    pub async fn ingest(&self, path: &Path) -> Result<IngestReport, IngestError> {
        info!(path = %path.display(), "Loading facts from CSV");
        let file = File::open(path)?;
        self.ingest_reader(file).await
    }

    /// Ingest CSV content from any reader
    pub async fn ingest_reader<R: Read>(&self, reader: R) -> Result<IngestReport, IngestError> {
        let (facts, report) = parse_facts(reader)?;
        info!(rows = report.rows_read, skipped = report.rows_skipped, "Parsed CSV");
        self.loader.load(facts, report).await
    }
}

/// Parse every usable row; malformed and empty rows are counted, not fatal
fn parse_facts<R: Read>(reader: R) -> Result<(Vec<NewFact>, IngestReport), IngestError> {
    let mut csv = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);

    let columns = Columns::from_headers(csv.headers()?)?;
    let mut report = IngestReport::default();
    let mut facts = Vec::new();

    for (line, record) in csv.records().enumerate() {
        report.rows_read += 1;
        match record {
            Ok(record) => match columns.read(&record) {
                Some(fact) => facts.push(fact),
                None => {
                    warn!(row = line + 1, "Skipping row with empty fact");
                    report.rows_skipped += 1;
                }
            },
            Err(e) => {
                warn!(row = line + 1, error = %e, "Skipping malformed row");
                report.rows_skipped += 1;
            }
        }
    }

    Ok((facts, report))
}
