use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::config::StorageBackend;
use super::MemoryEntry;

/// Storage backend error types
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Connection failed: {0}")]
    ConnectionError(String),
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    ConfigError(String),
    #[error("Entry '{0}' has no embedding")]
    MissingEmbedding(String),
}

/// Vector storage for embedded memory entries
#[async_trait]
pub trait VectorStorage: Send + Sync {
    async fn store(&mut self, entry: &MemoryEntry) -> Result<(), StorageError>;
    /// Entries scoring at least `similarity_threshold`, best first
    async fn search(&self, query_vector: &[f32], limit: usize, similarity_threshold: f32) -> Result<Vec<MemoryEntry>, StorageError>;
    async fn delete(&mut self, id: &str) -> Result<(), StorageError>;
    async fn clear(&mut self) -> Result<(), StorageError>;
    async fn count(&self) -> Result<usize, StorageError>;
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

fn rank(mut scored: Vec<MemoryEntry>, limit: usize, similarity_threshold: f32) -> Vec<MemoryEntry> {
    scored.retain(|entry| entry.score.unwrap_or(0.0) >= similarity_threshold);
    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    scored.truncate(limit);
    scored
}

/// In-memory vector storage, dropped with the crew run
#[derive(Default)]
pub struct InMemoryVectorStorage {
    entries: HashMap<String, MemoryEntry>,
}

impl InMemoryVectorStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl VectorStorage for InMemoryVectorStorage {
    async fn store(&mut self, entry: &MemoryEntry) -> Result<(), StorageError> {
        if entry.embedding.is_none() {
            return Err(StorageError::MissingEmbedding(entry.id.clone()));
        }
        self.entries.insert(entry.id.clone(), entry.clone());
        Ok(())
    }

    async fn search(&self, query_vector: &[f32], limit: usize, similarity_threshold: f32) -> Result<Vec<MemoryEntry>, StorageError> {
        let scored = self
            .entries
            .values()
            .filter_map(|entry| {
                let vector = entry.embedding.as_ref()?;
                let mut hit = entry.clone();
                hit.score = Some(cosine_similarity(query_vector, vector));
                Some(hit)
            })
            .collect();
        Ok(rank(scored, limit, similarity_threshold))
    }

    async fn delete(&mut self, id: &str) -> Result<(), StorageError> {
        self.entries.remove(id);
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), StorageError> {
        self.entries.clear();
        Ok(())
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.entries.len())
    }
}

/// SQLite-backed storage; similarity is computed in process
pub struct SqliteVectorStorage {
    pool: sqlx::sqlite::SqlitePool,
}

impl SqliteVectorStorage {
    pub async fn new(database_path: &str) -> Result<Self, StorageError> {
        use sqlx::sqlite::SqliteConnectOptions;
        use std::str::FromStr;

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", database_path))
            .map_err(|e| StorageError::ConfigError(e.to_string()))?
            .create_if_missing(true);

        let pool = sqlx::sqlite::SqlitePool::connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionError(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS short_term_memory (
                id TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                metadata TEXT NOT NULL,
                embedding TEXT NOT NULL,
                timestamp DATETIME NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl VectorStorage for SqliteVectorStorage {
    async fn store(&mut self, entry: &MemoryEntry) -> Result<(), StorageError> {
        let embedding = entry
            .embedding
            .as_ref()
            .ok_or_else(|| StorageError::MissingEmbedding(entry.id.clone()))?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO short_term_memory (id, content, metadata, embedding, timestamp)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.content)
        .bind(serde_json::to_string(&entry.metadata)?)
        .bind(serde_json::to_string(embedding)?)
        .bind(entry.timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn search(&self, query_vector: &[f32], limit: usize, similarity_threshold: f32) -> Result<Vec<MemoryEntry>, StorageError> {
        let rows = sqlx::query_as::<_, (String, String, String, String, DateTime<Utc>)>(
            "SELECT id, content, metadata, embedding, timestamp FROM short_term_memory",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::DatabaseError(e.to_string()))?;

        let mut scored = Vec::with_capacity(rows.len());
        for (id, content, metadata_json, embedding_json, timestamp) in rows {
            let embedding: Vec<f32> = serde_json::from_str(&embedding_json)?;
            let score = cosine_similarity(query_vector, &embedding);
            scored.push(MemoryEntry {
                id,
                content,
                metadata: serde_json::from_str(&metadata_json)?,
                timestamp,
                score: Some(score),
                embedding: Some(embedding),
            });
        }

        Ok(rank(scored, limit, similarity_threshold))
    }

    async fn delete(&mut self, id: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM short_term_memory WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    async fn clear(&mut self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM short_term_memory")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;
        Ok(())
    }

    async fn count(&self) -> Result<usize, StorageError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM short_term_memory")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;
        Ok(count as usize)
    }
}

/// Factory function for the configured storage backend
pub async fn create_vector_storage(backend: &StorageBackend) -> Result<Box<dyn VectorStorage>, StorageError> {
    match backend {
        StorageBackend::InMemory => Ok(Box::new(InMemoryVectorStorage::new())),
        StorageBackend::Sqlite { path } => {
            if path.trim().is_empty() {
                return Err(StorageError::ConfigError("sqlite storage needs a path".to_string()));
            }
            Ok(Box::new(SqliteVectorStorage::new(path).await?))
        }
    }
}
