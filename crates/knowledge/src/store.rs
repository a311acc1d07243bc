//! Persistent vector index.
//!
//! Entries live in a SQLite database inside the persist directory, next to
//! a `manifest.json` describing how they were embedded. Opening the index
//! reads every entry once into memory; searches are a brute-force cosine
//! scan over that immutable snapshot, so any number of callers can search
//! concurrently without locking.

use crate::embeddings::{embed_in_batches, EmbeddingProvider};
use crate::types::{Chunk, IndexEntry, IndexStats, Metadata, SearchHit};
use askdocs_core::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// SQLite database file inside the persist directory.
pub const INDEX_FILE: &str = "index.sqlite";

/// Build manifest inside the persist directory.
pub const MANIFEST_FILE: &str = "manifest.json";

const FORMAT_VERSION: u32 = 1;

/// Search over stored embeddings.
///
/// Implementations must be safe to share between threads; `search` takes
/// `&self` and never mutates.
pub trait VectorSearch: Send + Sync {
    /// Return up to `k` entries most similar to `query`, best first.
    ///
    /// Ties keep insertion order. An empty index returns an empty list.
    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<SearchHit>>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector length every query must have.
    fn dimensions(&self) -> usize;
}

/// How an index was built. Stored as `manifest.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub format_version: u32,
    pub provider: String,
    pub model: String,
    pub dimensions: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub entries_count: usize,
    pub sources_count: usize,
    pub built_at: DateTime<Utc>,
}

impl IndexManifest {
    /// Ensure `provider` embeds into the same space the index was built in.
    pub fn validate_consistency(&self, provider: &dyn EmbeddingProvider) -> AppResult<()> {
        if self.provider != provider.provider_name() {
            return Err(AppError::Index(format!(
                "Provider mismatch: index built with '{}', configured '{}'. Rebuild the index.",
                self.provider,
                provider.provider_name()
            )));
        }

        if self.model != provider.model_name() {
            return Err(AppError::Index(format!(
                "Model mismatch: index built with '{}', configured '{}'. Rebuild the index.",
                self.model,
                provider.model_name()
            )));
        }

        if self.dimensions != provider.dimensions() {
            return Err(AppError::Index(format!(
                "Dimension mismatch: index has {}, provider produces {}",
                self.dimensions,
                provider.dimensions()
            )));
        }

        Ok(())
    }

    fn read(persist_dir: &Path) -> AppResult<Self> {
        let path = persist_dir.join(MANIFEST_FILE);
        let content = fs::read_to_string(&path)
            .map_err(|e| AppError::Index(format!("Failed to read manifest {:?}: {}", path, e)))?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Index(format!("Failed to parse manifest {:?}: {}", path, e)))
    }

    fn write(&self, persist_dir: &Path) -> AppResult<()> {
        let path = persist_dir.join(MANIFEST_FILE);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json)
            .map_err(|e| AppError::Index(format!("Failed to write manifest {:?}: {}", path, e)))
    }
}

/// Chunking and batching parameters recorded with a build.
#[derive(Debug, Clone, Copy)]
pub struct BuildOptions {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub batch_size: usize,
}

/// In-memory snapshot of a persisted index.
#[derive(Debug, Clone)]
pub struct SqliteVectorIndex {
    entries: Vec<IndexEntry>,
    dimensions: usize,
    manifest: Option<IndexManifest>,
}

impl SqliteVectorIndex {
    /// An index with no entries, as before any build.
    pub fn empty(dimensions: usize) -> Self {
        Self {
            entries: Vec::new(),
            dimensions,
            manifest: None,
        }
    }

    /// Whether `persist_dir` holds a built index (exists and is non-empty).
    pub fn is_built(persist_dir: &Path) -> bool {
        fs::read_dir(persist_dir)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false)
    }

    /// Load a persisted index, checking it was built with `provider`.
    pub fn open(persist_dir: &Path, provider: &dyn EmbeddingProvider) -> AppResult<Self> {
        let manifest = IndexManifest::read(persist_dir)?;
        manifest.validate_consistency(provider)?;

        let db_path = persist_dir.join(INDEX_FILE);
        if !db_path.is_file() {
            return Err(AppError::Index(format!("Index database missing: {:?}", db_path)));
        }

        let conn = Connection::open(&db_path)
            .map_err(|e| AppError::Index(format!("Failed to open SQLite index: {}", e)))?;
        let entries = read_entries(&conn, manifest.dimensions)?;

        if entries.len() != manifest.entries_count {
            tracing::warn!(
                "Manifest lists {} entries but the database holds {}",
                manifest.entries_count,
                entries.len()
            );
        }

        tracing::info!(
            "Loaded {} entries from {:?} (model: {}, built {})",
            entries.len(),
            persist_dir,
            manifest.model,
            manifest.built_at.to_rfc3339()
        );

        Ok(Self {
            entries,
            dimensions: manifest.dimensions,
            manifest: Some(manifest),
        })
    }

    /// Embed `chunks` and persist them to `persist_dir`.
    ///
    /// All embeddings are computed before anything is written. If writing
    /// fails, `persist_dir` is removed so it is not mistaken for a built
    /// index.
    pub async fn build(
        persist_dir: &Path,
        chunks: Vec<Chunk>,
        provider: &dyn EmbeddingProvider,
        options: BuildOptions,
    ) -> AppResult<Self> {
        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = embed_in_batches(provider, &texts, options.batch_size).await?;

        let entries: Vec<IndexEntry> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, embedding)| IndexEntry {
                id: uuid::Uuid::new_v4().to_string(),
                position: chunk.position,
                text: chunk.text,
                metadata: chunk.metadata,
                embedding,
            })
            .collect();

        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            provider: provider.provider_name().to_string(),
            model: provider.model_name().to_string(),
            dimensions: provider.dimensions(),
            chunk_size: options.chunk_size,
            chunk_overlap: options.chunk_overlap,
            entries_count: entries.len(),
            sources_count: count_sources(&entries),
            built_at: Utc::now(),
        };

        if let Err(e) = persist(persist_dir, &entries, &manifest) {
            tracing::error!("Index build failed, removing {:?}", persist_dir);
            if persist_dir.exists() {
                if let Err(cleanup) = fs::remove_dir_all(persist_dir) {
                    tracing::warn!("Failed to remove {:?}: {}", persist_dir, cleanup);
                }
            }
            return Err(e);
        }

        tracing::info!(
            "Persisted {} entries from {} sources to {:?}",
            manifest.entries_count,
            manifest.sources_count,
            persist_dir
        );

        Ok(Self {
            dimensions: manifest.dimensions,
            entries,
            manifest: Some(manifest),
        })
    }

    /// Manifest of the loaded or built index (`None` for `empty`).
    pub fn manifest(&self) -> Option<&IndexManifest> {
        self.manifest.as_ref()
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }
}

impl VectorSearch for SqliteVectorIndex {
    fn search(&self, query: &[f32], k: usize) -> AppResult<Vec<SearchHit>> {
        if self.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }

        if query.len() != self.dimensions {
            return Err(AppError::Index(format!(
                "Query has {} dimensions, index has {}",
                query.len(),
                self.dimensions
            )));
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, cosine_similarity(query, &entry.embedding)))
            .collect();

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        let hits: Vec<SearchHit> = scored
            .into_iter()
            .enumerate()
            .map(|(rank, (i, score))| {
                let entry = &self.entries[i];
                SearchHit {
                    text: entry.text.clone(),
                    metadata: entry.metadata.clone(),
                    score,
                    rank: rank + 1,
                }
            })
            .collect();

        tracing::debug!(
            "Retrieved {} entries (requested top-{}) - scores: {:?}",
            hits.len(),
            k,
            hits.iter().map(|h| h.score).collect::<Vec<_>>()
        );

        Ok(hits)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Read statistics of the index persisted in `persist_dir`.
pub fn stats(persist_dir: &Path) -> AppResult<IndexStats> {
    if !SqliteVectorIndex::is_built(persist_dir) {
        return Err(AppError::Index(format!(
            "No index found at {:?}. Run 'askdocs build' first.",
            persist_dir
        )));
    }

    let manifest = IndexManifest::read(persist_dir)?;
    let db_size_bytes = fs::metadata(persist_dir.join(INDEX_FILE))
        .map(|m| m.len())
        .unwrap_or(0);

    Ok(IndexStats {
        persist_dir: PathBuf::from(persist_dir),
        entries_count: manifest.entries_count,
        sources_count: manifest.sources_count,
        provider: manifest.provider,
        model: manifest.model,
        dimensions: manifest.dimensions,
        chunk_size: manifest.chunk_size,
        chunk_overlap: manifest.chunk_overlap,
        db_size_bytes,
        built_at: manifest.built_at,
    })
}

/// Cosine similarity; 0.0 when either vector has zero norm or the lengths
/// differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

fn count_sources(entries: &[IndexEntry]) -> usize {
    entries
        .iter()
        .filter_map(|e| e.metadata.get("source").and_then(|v| v.as_str()))
        .collect::<HashSet<_>>()
        .len()
}

fn persist(persist_dir: &Path, entries: &[IndexEntry], manifest: &IndexManifest) -> AppResult<()> {
    fs::create_dir_all(persist_dir)
        .map_err(|e| AppError::Index(format!("Failed to create index directory: {}", e)))?;

    let db_path = persist_dir.join(INDEX_FILE);
    let mut conn = Connection::open(&db_path)
        .map_err(|e| AppError::Index(format!("Failed to open SQLite index: {}", e)))?;

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS entries (
            id TEXT PRIMARY KEY,
            position INTEGER NOT NULL,
            text TEXT NOT NULL,
            metadata TEXT NOT NULL,
            embedding BLOB NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_entries_position ON entries(position);
        "#,
    )
    .map_err(|e| AppError::Index(format!("Failed to create tables: {}", e)))?;

    let tx = conn
        .transaction()
        .map_err(|e| AppError::Index(format!("Failed to begin transaction: {}", e)))?;
    {
        let mut stmt = tx
            .prepare(
                "INSERT INTO entries (id, position, text, metadata, embedding)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )
            .map_err(|e| AppError::Index(format!("Failed to prepare insert: {}", e)))?;

        for entry in entries {
            let metadata_json = serde_json::to_string(&entry.metadata)?;
            stmt.execute(params![
                entry.id,
                entry.position as i64,
                entry.text,
                metadata_json,
                embedding_to_bytes(&entry.embedding),
            ])
            .map_err(|e| AppError::Index(format!("Failed to insert entry: {}", e)))?;
        }
    }
    tx.commit()
        .map_err(|e| AppError::Index(format!("Failed to commit index: {}", e)))?;

    // Written last: a directory without a manifest cannot be opened.
    manifest.write(persist_dir)
}

fn read_entries(conn: &Connection, dimensions: usize) -> AppResult<Vec<IndexEntry>> {
    let mut stmt = conn
        .prepare("SELECT id, position, text, metadata, embedding FROM entries ORDER BY position")
        .map_err(|e| AppError::Index(format!("Failed to prepare query: {}", e)))?;

    let rows = stmt
        .query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Vec<u8>>(4)?,
            ))
        })
        .map_err(|e| AppError::Index(format!("Failed to query entries: {}", e)))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Index(format!("Failed to read entry: {}", e)))?;

    rows.into_iter()
        .map(|(id, position, text, metadata_json, blob)| {
            let embedding = bytes_to_embedding(&blob)?;
            if embedding.len() != dimensions {
                return Err(AppError::Index(format!(
                    "Entry {} has {} dimensions, expected {}",
                    id,
                    embedding.len(),
                    dimensions
                )));
            }
            let metadata: Metadata = serde_json::from_str(&metadata_json)?;
            Ok(IndexEntry {
                id,
                position: position as usize,
                text,
                metadata,
                embedding,
            })
        })
        .collect()
}

/// Convert embedding vector to little-endian bytes for storage.
fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Convert bytes back to embedding vector.
fn bytes_to_embedding(bytes: &[u8]) -> AppResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(AppError::Index("Invalid embedding bytes length".to_string()));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::MockProvider;
    use serde_json::Value;
    use tempfile::TempDir;

    fn entry(position: usize, embedding: Vec<f32>) -> IndexEntry {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), Value::from(format!("doc{}.txt", position % 2)));
        IndexEntry {
            id: format!("e{}", position),
            position,
            text: format!("entry {}", position),
            metadata,
            embedding,
        }
    }

    fn in_memory(entries: Vec<IndexEntry>, dimensions: usize) -> SqliteVectorIndex {
        SqliteVectorIndex {
            entries,
            dimensions,
            manifest: None,
        }
    }

    fn chunk(position: usize, text: &str) -> Chunk {
        let mut metadata = Metadata::new();
        metadata.insert("source".to_string(), Value::from("data/a.txt"));
        Chunk {
            text: text.to_string(),
            metadata,
            offset: 0,
            position,
        }
    }

    fn options() -> BuildOptions {
        BuildOptions {
            chunk_size: 1000,
            chunk_overlap: 200,
            batch_size: 2,
        }
    }

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0, 0.0], &[1.0, 0.0, 0.0]) - 1.0).abs() < 0.001);
        assert!(cosine_similarity(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0]).abs() < 0.001);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 0.001);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_search_orders_by_similarity() {
        let index = in_memory(
            vec![
                entry(0, vec![0.0, 1.0]),
                entry(1, vec![1.0, 0.1]),
                entry(2, vec![0.7, 0.7]),
            ],
            2,
        );

        let hits = index.search(&[1.0, 0.0], 3).unwrap();
        let texts: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["entry 1", "entry 2", "entry 0"]);
        assert_eq!(hits.iter().map(|h| h.rank).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let index = in_memory(
            (0..5).map(|i| entry(i, vec![1.0, 1.0])).collect(),
            2,
        );
        let hits = index.search(&[1.0, 1.0], 3).unwrap();
        let texts: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec!["entry 0", "entry 1", "entry 2"]);
    }

    #[test]
    fn test_result_length_is_min_of_k_and_size() {
        let index = in_memory((0..3).map(|i| entry(i, vec![i as f32, 1.0])).collect(), 2);
        assert_eq!(index.search(&[1.0, 0.0], 10).unwrap().len(), 3);
        assert_eq!(index.search(&[1.0, 0.0], 2).unwrap().len(), 2);
        assert!(index.search(&[1.0, 0.0], 0).unwrap().is_empty());
    }

    #[test]
    fn test_empty_index_returns_nothing() {
        let index = SqliteVectorIndex::empty(4);
        assert!(index.is_empty());
        assert!(index.search(&[1.0, 0.0, 0.0, 0.0], 5).unwrap().is_empty());
        assert!(index.search(&[1.0], 5).unwrap().is_empty());
    }

    #[test]
    fn test_dimension_mismatch_is_index_error() {
        let index = in_memory(vec![entry(0, vec![1.0, 0.0])], 2);
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 1),
            Err(AppError::Index(_))
        ));
    }

    #[test]
    fn test_embedding_bytes_roundtrip() {
        let v = vec![0.25, -1.5, f32::MIN_POSITIVE];
        assert_eq!(bytes_to_embedding(&embedding_to_bytes(&v)).unwrap(), v);
        assert!(bytes_to_embedding(&[0, 1, 2]).is_err());
    }

    #[tokio::test]
    async fn test_build_then_open_gives_same_results() {
        let temp = TempDir::new().unwrap();
        let persist_dir = temp.path().join("index");
        let provider = MockProvider::new(64);

        let chunks = vec![
            chunk(0, "The sky is blue."),
            chunk(1, "Grass is green."),
            chunk(2, "Snow is white and cold."),
        ];
        assert!(!SqliteVectorIndex::is_built(&persist_dir));

        let built = SqliteVectorIndex::build(&persist_dir, chunks, &provider, options())
            .await
            .unwrap();
        assert!(SqliteVectorIndex::is_built(&persist_dir));
        assert_eq!(built.len(), 3);

        let reopened = SqliteVectorIndex::open(&persist_dir, &provider).unwrap();
        assert_eq!(reopened.entries(), built.entries());

        let query = provider.embed("blue sky").await.unwrap();
        assert_eq!(
            built.search(&query, 2).unwrap(),
            reopened.search(&query, 2).unwrap()
        );

        let stats = stats(&persist_dir).unwrap();
        assert_eq!(stats.entries_count, 3);
        assert_eq!(stats.sources_count, 1);
        assert_eq!(stats.model, "trigram-v1");
        assert!(stats.db_size_bytes > 0);
    }

    #[tokio::test]
    async fn test_open_with_other_model_fails() {
        let temp = TempDir::new().unwrap();
        let persist_dir = temp.path().join("index");
        SqliteVectorIndex::build(&persist_dir, vec![chunk(0, "text")], &MockProvider::new(8), options())
            .await
            .unwrap();

        let result = SqliteVectorIndex::open(&persist_dir, &MockProvider::new(16));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Dimension mismatch"));
    }

    #[tokio::test]
    async fn test_build_with_no_chunks_is_empty_but_built() {
        let temp = TempDir::new().unwrap();
        let persist_dir = temp.path().join("index");
        let provider = MockProvider::new(8);

        let index = SqliteVectorIndex::build(&persist_dir, Vec::new(), &provider, options())
            .await
            .unwrap();
        assert!(index.is_empty());
        assert!(SqliteVectorIndex::is_built(&persist_dir));

        let reopened = SqliteVectorIndex::open(&persist_dir, &provider).unwrap();
        assert!(reopened.search(&[0.0; 8], 5).unwrap().is_empty());
    }

    #[test]
    fn test_directory_without_manifest_cannot_open() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("stray.txt"), "x").unwrap();
        assert!(SqliteVectorIndex::is_built(temp.path()));

        let result = SqliteVectorIndex::open(temp.path(), &MockProvider::new(8));
        assert!(matches!(result, Err(AppError::Index(_))));
    }

    #[test]
    fn test_stats_without_index() {
        let temp = TempDir::new().unwrap();
        assert!(matches!(
            stats(&temp.path().join("missing")),
            Err(AppError::Index(_))
        ));
    }
}
