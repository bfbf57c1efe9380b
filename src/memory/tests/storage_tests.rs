use super::super::storage::*;
use super::super::config::StorageBackend;
use super::test_utils::entry;
use tempfile::TempDir;

#[tokio::test]
async fn test_in_memory_ranking() {
    let mut storage = InMemoryVectorStorage::new();
    storage.store(&entry("a", "beach trip", vec![1.0, 0.0, 0.0])).await.unwrap();
    storage.store(&entry("b", "mixed trip", vec![1.0, 1.0, 0.0])).await.unwrap();
    storage.store(&entry("c", "ski trip", vec![0.0, 1.0, 0.0])).await.unwrap();

    let hits = storage.search(&[1.0, 0.0, 0.0], 10, 0.5).await.unwrap();

    let ids: Vec<&str> = hits.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
    assert!((hits[0].score.unwrap() - 1.0).abs() < 1e-6);
    assert!(hits[0].score >= hits[1].score);
}

#[tokio::test]
async fn test_in_memory_rejects_entries_without_embedding() {
    let mut storage = InMemoryVectorStorage::new();
    let mut bare = entry("x", "no vector", vec![]);
    bare.embedding = None;

    assert!(matches!(storage.store(&bare).await, Err(StorageError::MissingEmbedding(_))));
}

#[tokio::test]
async fn test_in_memory_delete_and_clear() {
    let mut storage = InMemoryVectorStorage::new();
    storage.store(&entry("a", "one", vec![1.0])).await.unwrap();
    storage.store(&entry("b", "two", vec![1.0])).await.unwrap();

    storage.delete("a").await.unwrap();
    assert_eq!(storage.count().await.unwrap(), 1);

    storage.clear().await.unwrap();
    assert_eq!(storage.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_sqlite_round_trip_across_connections() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memory.db");
    let path = path.to_str().unwrap();

    {
        let mut storage = SqliteVectorStorage::new(path).await.unwrap();
        storage.store(&entry("a", "beach", vec![1.0, 0.0])).await.unwrap();
        storage.store(&entry("b", "ski", vec![0.0, 1.0])).await.unwrap();
    }

    let mut storage = SqliteVectorStorage::new(path).await.unwrap();
    assert_eq!(storage.count().await.unwrap(), 2);

    let hits = storage.search(&[0.9, 0.1], 1, 0.0).await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].content, "beach");
    assert_eq!(hits[0].metadata["agent"], "tester");

    storage.delete("a").await.unwrap();
    assert_eq!(storage.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_factory_requires_sqlite_path() {
    let result = create_vector_storage(&StorageBackend::Sqlite { path: String::new() }).await;
    assert!(matches!(result, Err(StorageError::ConfigError(_))));

    let storage = create_vector_storage(&StorageBackend::InMemory).await.unwrap();
    assert_eq!(storage.count().await.unwrap(), 0);
}

#[test]
fn test_cosine_similarity_edge_cases() {
    assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 1.0]), 0.0);
    assert!((cosine_similarity(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
}
