use super::super::*;
use super::test_utils::KeywordEmbedder;
use std::collections::HashMap;

fn memory(limits: MemoryLimits) -> ShortTermMemory {
    ShortTermMemory::new(
        Box::new(KeywordEmbedder::new()),
        Box::new(storage::InMemoryVectorStorage::new()),
        4,
        limits,
    )
}

#[tokio::test]
async fn test_save_then_search_prefers_similar_entries() {
    let mut memory = memory(MemoryLimits::default());
    memory.save("Beach resorts in Bali, great beach food", HashMap::new()).await.unwrap();
    memory.save("Ski chalets in the Alps", HashMap::new()).await.unwrap();
    memory.save("Museum passes for Paris", HashMap::new()).await.unwrap();

    let hits = memory.search("quiet beach with local food", None).await.unwrap();

    assert_eq!(hits.len(), 1);
    assert!(hits[0].content.starts_with("Beach resorts"));
    assert!(hits[0].score.unwrap() > 0.9);
}

#[tokio::test]
async fn test_search_limit_and_threshold() {
    let limits = MemoryLimits {
        max_retrieval_results: 2,
        similarity_threshold: 0.0,
    };
    let mut memory = memory(limits);
    for text in ["beach", "ski", "museum", "food"] {
        memory.save(text, HashMap::new()).await.unwrap();
    }

    assert_eq!(memory.search("beach ski", None).await.unwrap().len(), 2);
    assert_eq!(memory.search("beach ski", Some(1)).await.unwrap().len(), 1);
    assert_eq!(memory.count().await.unwrap(), 4);
}

#[tokio::test]
async fn test_empty_memory_skips_embedding() {
    let memory = ShortTermMemory::new(
        Box::new(KeywordEmbedder { dimension: 99 }),
        Box::new(storage::InMemoryVectorStorage::new()),
        4,
        MemoryLimits::default(),
    );
    // Would be a dimension mismatch if the query were embedded
    assert!(memory.search("anything", None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_dimension_mismatch_is_rejected() {
    let mut memory = ShortTermMemory::new(
        Box::new(KeywordEmbedder::new()),
        Box::new(storage::InMemoryVectorStorage::new()),
        1024,
        MemoryLimits::default(),
    );

    let err = memory.save("beach", HashMap::new()).await.unwrap_err();
    assert!(matches!(err, MemoryError::DimensionMismatch { expected: 1024, actual: 4 }));
}

#[tokio::test]
async fn test_metadata_is_kept_and_reset_clears() {
    let mut memory = memory(MemoryLimits::default());
    let metadata = HashMap::from([("task".to_string(), "research".to_string())]);
    let id = memory.save("beach notes", metadata).await.unwrap();

    let hits = memory.search("beach", None).await.unwrap();
    assert_eq!(hits[0].id, id);
    assert_eq!(hits[0].metadata["task"], "research");

    memory.reset().await.unwrap();
    assert_eq!(memory.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_from_config_rejects_unknown_provider() {
    let config = MemoryConfig::new("chroma", "all-minilm", 384);
    assert!(matches!(
        ShortTermMemory::from_config(&config).await,
        Err(MemoryError::Config(_))
    ));
}
