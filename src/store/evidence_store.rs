//! SQLite-backed evidence store.
//!
//! Layout: one `evidence.sqlite3` file under the store directory holding
//! a `collections` table (name, dimension, metric) and a `facts` table
//! (text, metadata, little-endian f32 embedding blob). Collection identity
//! is (name, store path).
//!
//! Opening a collection whose persisted dimension or metric differs from
//! the configured one drops every fact in it and starts over empty.
//! Mixed-dimension vectors would produce meaningless distances, so the
//! loss is accepted and logged at warn level.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::vector::{self, DistanceMetric};
use super::StoreError;
use crate::domain::{Fact, FactMetadata, NewFact};

/// Database file name inside the store directory
pub const DB_FILE: &str = "evidence.sqlite3";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS collections (
    name        TEXT PRIMARY KEY,
    dimension   INTEGER NOT NULL,
    metric      TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS facts (
    id          TEXT PRIMARY KEY,
    collection  TEXT NOT NULL,
    text        TEXT NOT NULL,
    source      TEXT NOT NULL DEFAULT '',
    date        TEXT NOT NULL DEFAULT '',
    context     TEXT NOT NULL DEFAULT '',
    embedding   BLOB NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_facts_collection ON facts(collection);
"#;

/// Exact-match metadata constraints for a search
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataFilter {
    pub source: Option<String>,
    pub date: Option<String>,
    pub context: Option<String>,
}

impl MetadataFilter {
    pub fn source(source: impl Into<String>) -> Self {
        Self {
            source: Some(source.into()),
            ..Default::default()
        }
    }

    fn clauses(&self) -> Vec<(&'static str, &str)> {
        let mut clauses = Vec::new();
        if let Some(ref source) = self.source {
            clauses.push(("source", source.as_str()));
        }
        if let Some(ref date) = self.date {
            clauses.push(("date", date.as_str()));
        }
        if let Some(ref context) = self.context {
            clauses.push(("context", context.as_str()));
        }
        clauses
    }
}

/// One nearest-neighbour result, ordered by ascending distance
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub id: String,
    pub text: String,
    pub metadata: FactMetadata,
    pub distance: f32,
}

/// Persistent vector index over embedded facts
pub struct EvidenceStore {
    conn: Mutex<Connection>,
    collection: String,
    dimension: usize,
    metric: DistanceMetric,
    /// Facts dropped by a dimension/metric reset on open
    dropped_on_open: Option<usize>,
}

impl std::fmt::Debug for EvidenceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvidenceStore")
            .field("collection", &self.collection)
            .field("dimension", &self.dimension)
            .field("metric", &self.metric)
            .finish()
    }
}

impl EvidenceStore {
    /// Open (or create) a collection under `dir`
    pub fn open(
        dir: &Path,
        collection: &str,
        dimension: usize,
        metric: DistanceMetric,
    ) -> Result<Self, StoreError> {
        std::fs::create_dir_all(dir)?;
        let conn = Connection::open(dir.join(DB_FILE))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| {
            row.get::<_, String>(0)
        })?;
        Self::init(conn, collection, dimension, metric)
    }

    /// Open a throwaway in-memory collection
    pub fn open_in_memory(collection: &str, dimension: usize) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn, collection, dimension, DistanceMetric::Cosine)
    }

    fn init(
        conn: Connection,
        collection: &str,
        dimension: usize,
        metric: DistanceMetric,
    ) -> Result<Self, StoreError> {
        if dimension == 0 {
            return Err(StoreError::InvalidConfig(
                "vector dimension must be at least 1".to_string(),
            ));
        }
        if collection.trim().is_empty() {
            return Err(StoreError::InvalidConfig(
                "collection name cannot be empty".to_string(),
            ));
        }

        conn.execute_batch(SCHEMA)?;
        let dropped_on_open = ensure_collection(&conn, collection, dimension, metric)?;

        Ok(Self {
            conn: Mutex::new(conn),
            collection: collection.to_string(),
            dimension,
            metric,
            dropped_on_open,
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Number of facts discarded because the collection was recreated on open
    pub fn dropped_on_open(&self) -> Option<usize> {
        self.dropped_on_open
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    /// Insert facts with their embeddings, returning the fresh ids in order.
    ///
    /// Content is not deduplicated.
    pub fn add(&self, facts: &[NewFact], embeddings: &[Vec<f32>]) -> Result<Vec<String>, StoreError> {
        if facts.len() != embeddings.len() {
            return Err(StoreError::LengthMismatch {
                facts: facts.len(),
                embeddings: embeddings.len(),
            });
        }
        if let Some(bad) = embeddings.iter().find(|e| e.len() != self.dimension) {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: bad.len(),
            });
        }
        if facts.is_empty() {
            return Ok(Vec::new());
        }

        let millis = Utc::now().timestamp_millis();
        let created_at = Utc::now().to_rfc3339();
        let ids: Vec<String> = (0..facts.len()).map(|i| new_fact_id(millis, i)).collect();

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO facts (id, collection, text, source, date, context, embedding, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for ((id, fact), embedding) in ids.iter().zip(facts).zip(embeddings) {
                stmt.execute(params![
                    id,
                    self.collection,
                    fact.text,
                    fact.metadata.source,
                    fact.metadata.date,
                    fact.metadata.context,
                    vector::encode(embedding),
                    created_at,
                ])?;
            }
        }
        tx.commit()?;

        info!(collection = %self.collection, added = ids.len(), "Added facts");
        Ok(ids)
    }

    /// Nearest neighbours of `query`, at most `k`, closest first.
    ///
    /// Backend failures are logged and reported as an empty result.
    pub fn search(&self, query: &[f32], k: usize, filter: Option<&MetadataFilter>) -> Vec<SearchHit> {
        match self.try_search(query, k, filter) {
            Ok(hits) => hits,
            Err(e) => {
                error!(collection = %self.collection, error = %e, "Search failed, returning no results");
                Vec::new()
            }
        }
    }

    /// Like [`EvidenceStore::search`] but surfaces errors
    pub fn try_search(
        &self,
        query: &[f32],
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchHit>, StoreError> {
        if query.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let clauses = filter.map(|f| f.clauses()).unwrap_or_default();
        let mut sql = String::from(
            "SELECT id, text, source, date, context, embedding FROM facts WHERE collection = ?1",
        );
        for (i, (column, _)) in clauses.iter().enumerate() {
            sql.push_str(&format!(" AND {} = ?{}", column, i + 2));
        }

        let mut values: Vec<&str> = vec![self.collection.as_str()];
        values.extend(clauses.iter().map(|(_, value)| *value));

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                FactMetadata {
                    source: row.get(2)?,
                    date: row.get(3)?,
                    context: row.get(4)?,
                },
                row.get::<_, Vec<u8>>(5)?,
            ))
        })?;

        let mut hits = Vec::new();
        for row in rows {
            let (id, text, metadata, blob) = row?;
            let embedding = vector::decode(&blob)
                .filter(|v| v.len() == self.dimension)
                .ok_or_else(|| StoreError::CorruptEmbedding(id.clone()))?;
            let distance = self.metric.distance(query, &embedding);
            hits.push(SearchHit {
                id,
                text,
                metadata,
                distance,
            });
        }

        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits.truncate(k);
        debug!(collection = %self.collection, k, returned = hits.len(), "Search complete");
        Ok(hits)
    }

    /// Every fact in insertion order
    pub fn get_all(&self) -> Result<Vec<Fact>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, text, source, date, context, created_at FROM facts
             WHERE collection = ?1 ORDER BY rowid",
        )?;
        let facts = stmt
            .query_map(params![self.collection], row_to_fact)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(facts)
    }

    /// Look up one fact by id
    pub fn get(&self, id: &str) -> Result<Option<Fact>, StoreError> {
        let conn = self.lock()?;
        let fact = conn
            .query_row(
                "SELECT id, text, source, date, context, created_at FROM facts
                 WHERE collection = ?1 AND id = ?2",
                params![self.collection, id],
                row_to_fact,
            )
            .optional()?;
        Ok(fact)
    }

    /// Remove a fact by id. Returns whether it existed.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let removed = conn.execute(
            "DELETE FROM facts WHERE collection = ?1 AND id = ?2",
            params![self.collection, id],
        )?;
        debug!(collection = %self.collection, id, removed, "Delete");
        Ok(removed > 0)
    }

    /// Replace a fact by deleting it and inserting the new version.
    ///
    /// Returns the id of the reinserted fact; ids are never reused.
    pub fn update(&self, id: &str, fact: NewFact, embedding: Vec<f32>) -> Result<String, StoreError> {
        if embedding.len() != self.dimension {
            return Err(StoreError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        if !self.delete(id)? {
            return Err(StoreError::NotFound(id.to_string()));
        }
        let mut ids = self.add(&[fact], &[embedding])?;
        ids.pop()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    pub fn count(&self) -> Result<usize, StoreError> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM facts WHERE collection = ?1",
            params![self.collection],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn row_to_fact(row: &rusqlite::Row<'_>) -> rusqlite::Result<Fact> {
    Ok(Fact {
        id: row.get(0)?,
        text: row.get(1)?,
        metadata: FactMetadata {
            source: row.get(2)?,
            date: row.get(3)?,
            context: row.get(4)?,
        },
        created_at: row.get(5)?,
    })
}

/// `fact_{millis}_{index}_{random}`: time-ordered, unique across batches
fn new_fact_id(millis: i64, index: usize) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("fact_{}_{}_{}", millis, index, &suffix[..8])
}

/// Create the collection record or reset it on a contract mismatch.
///
/// Returns the number of facts dropped by a reset.
fn ensure_collection(
    conn: &Connection,
    name: &str,
    dimension: usize,
    metric: DistanceMetric,
) -> Result<Option<usize>, StoreError> {
    let existing: Option<(i64, String)> = conn
        .query_row(
            "SELECT dimension, metric FROM collections WHERE name = ?1",
            params![name],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;

    match existing {
        None => {
            conn.execute(
                "INSERT INTO collections (name, dimension, metric, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![name, dimension as i64, metric.as_str(), Utc::now().to_rfc3339()],
            )?;
            info!(collection = name, dimension, %metric, "Created collection");
            Ok(None)
        }
        Some((stored_dim, stored_metric))
            if stored_dim as usize == dimension && DistanceMetric::parse(&stored_metric) == Some(metric) =>
        {
            debug!(collection = name, dimension, "Opened collection");
            Ok(None)
        }
        Some((stored_dim, stored_metric)) => {
            let dropped = conn.execute("DELETE FROM facts WHERE collection = ?1", params![name])?;
            conn.execute(
                "UPDATE collections SET dimension = ?2, metric = ?3, created_at = ?4 WHERE name = ?1",
                params![name, dimension as i64, metric.as_str(), Utc::now().to_rfc3339()],
            )?;
            warn!(
                collection = name,
                persisted_dimension = stored_dim,
                persisted_metric = %stored_metric,
                expected_dimension = dimension,
                expected_metric = %metric,
                facts_dropped = dropped,
                "Collection contract mismatch: recreated collection EMPTY, all prior facts were deleted"
            );
            Ok(Some(dropped))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fact(text: &str, source: &str) -> NewFact {
        NewFact::new(text, FactMetadata::new(source, "2024-06-10", ""))
    }

    #[test]
    fn test_add_rejects_length_mismatch() {
        let store = EvidenceStore::open_in_memory("test", 2).unwrap();
        let err = store
            .add(&[fact("a", "s"), fact("b", "s")], &[vec![1.0, 0.0]])
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::LengthMismatch {
                facts: 2,
                embeddings: 1
            }
        ));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_add_rejects_wrong_dimension() {
        let store = EvidenceStore::open_in_memory("test", 2).unwrap();
        let err = store.add(&[fact("a", "s")], &[vec![1.0, 0.0, 0.0]]).unwrap_err();
        assert!(matches!(err, StoreError::DimensionMismatch { expected: 2, actual: 3 }));
    }

    #[test]
    fn test_ids_are_unique_across_batches() {
        let store = EvidenceStore::open_in_memory("test", 2).unwrap();
        let mut ids = store.add(&[fact("a", "s"), fact("b", "s")], &[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
        ids.extend(store.add(&[fact("a", "s"), fact("b", "s")], &[vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap());

        let unique: std::collections::HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 4);
        assert!(ids.iter().all(|id| id.starts_with("fact_")));
        // Duplicated content is stored twice
        assert_eq!(store.count().unwrap(), 4);
    }

    #[test]
    fn test_search_orders_by_distance() {
        let store = EvidenceStore::open_in_memory("test", 2).unwrap();
        store
            .add(
                &[fact("far", "s"), fact("near", "s"), fact("middle", "s")],
                &[vec![0.0, 1.0], vec![1.0, 0.0], vec![0.8, 0.6]],
            )
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 2, None);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "near");
        assert_eq!(hits[1].text, "middle");
        assert!(hits[0].distance.abs() < 1e-6);
        assert!((hits[1].distance - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_search_with_metadata_filter() {
        let store = EvidenceStore::open_in_memory("test", 2).unwrap();
        store
            .add(
                &[fact("a", "Reuters"), fact("b", "AP")],
                &[vec![1.0, 0.0], vec![1.0, 0.0]],
            )
            .unwrap();

        let hits = store.search(&[1.0, 0.0], 5, Some(&MetadataFilter::source("AP")));
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].metadata.source, "AP");
    }

    #[test]
    fn test_search_degrades_to_empty() {
        let store = EvidenceStore::open_in_memory("test", 2).unwrap();
        store.add(&[fact("a", "s")], &[vec![1.0, 0.0]]).unwrap();

        // Wrong query dimension is a backend error, reported as no results
        assert!(store.search(&[1.0, 0.0, 0.0], 5, None).is_empty());
        assert!(store.try_search(&[1.0, 0.0, 0.0], 5, None).is_err());
    }

    #[test]
    fn test_get_delete_update() {
        let store = EvidenceStore::open_in_memory("test", 2).unwrap();
        let ids = store.add(&[fact("old text", "s")], &[vec![1.0, 0.0]]).unwrap();
        let id = &ids[0];

        assert_eq!(store.get(id).unwrap().unwrap().text, "old text");

        let new_id = store
            .update(id, fact("new text", "s2"), vec![0.0, 1.0])
            .unwrap();
        assert_ne!(&new_id, id);
        assert!(store.get(id).unwrap().is_none());
        let updated = store.get(&new_id).unwrap().unwrap();
        assert_eq!(updated.text, "new text");
        assert_eq!(updated.metadata.source, "s2");
        assert_eq!(store.count().unwrap(), 1);

        assert!(store.delete(&new_id).unwrap());
        assert!(!store.delete(&new_id).unwrap());
        assert!(matches!(
            store.update(&new_id, fact("x", "s"), vec![1.0, 0.0]),
            Err(StoreError::NotFound(_))
        ));
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_collections_are_isolated() {
        let temp = TempDir::new().unwrap();
        let a = EvidenceStore::open(temp.path(), "a", 2, DistanceMetric::Cosine).unwrap();
        let b = EvidenceStore::open(temp.path(), "b", 2, DistanceMetric::Cosine).unwrap();

        a.add(&[fact("only in a", "s")], &[vec![1.0, 0.0]]).unwrap();
        assert_eq!(a.count().unwrap(), 1);
        assert_eq!(b.count().unwrap(), 0);
        assert!(b.search(&[1.0, 0.0], 5, None).is_empty());
    }

    #[test]
    fn test_reopen_keeps_facts() {
        let temp = TempDir::new().unwrap();
        {
            let store = EvidenceStore::open(temp.path(), "facts", 2, DistanceMetric::Cosine).unwrap();
            store.add(&[fact("persisted", "s")], &[vec![1.0, 0.0]]).unwrap();
        }
        let store = EvidenceStore::open(temp.path(), "facts", 2, DistanceMetric::Cosine).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert_eq!(store.dropped_on_open(), None);
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            EvidenceStore::open_in_memory("test", 0),
            Err(StoreError::InvalidConfig(_))
        ));
        assert!(matches!(
            EvidenceStore::open_in_memory("  ", 3),
            Err(StoreError::InvalidConfig(_))
        ));
    }
}
