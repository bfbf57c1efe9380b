use super::super::config::*;
use super::super::MemoryError;

#[test]
fn test_default_config() {
    let config = MemoryConfig::default();
    assert_eq!(config.embedding_provider().unwrap(), EmbeddingProvider::Bedrock);
    assert_eq!(config.model, "amazon.titan-embed-text-v2:0");
    assert_eq!(config.dimension, 1024);
    assert_eq!(config.storage, StorageBackend::InMemory);

    let limits = config.limits;
    assert_eq!(limits.max_retrieval_results, 3);
    assert_eq!(limits.similarity_threshold, 0.35);
}

#[test]
fn test_provider_names() {
    for name in ["bedrock", "aws_bedrock", "Bedrock"] {
        let config = MemoryConfig::new(name, "amazon.titan-embed-text-v1", 1536);
        assert_eq!(config.embedding_provider().unwrap(), EmbeddingProvider::Bedrock);
    }
    let config = MemoryConfig::new("openai", "text-embedding-3-small", 1536);
    assert_eq!(config.embedding_provider().unwrap(), EmbeddingProvider::OpenAI);
}

#[test]
fn test_invalid_configs() {
    let unknown = MemoryConfig::new("chroma", "x", 10);
    assert!(matches!(unknown.validate(), Err(MemoryError::Config(_))));

    let no_model = MemoryConfig::new("bedrock", " ", 10);
    assert!(matches!(no_model.validate(), Err(MemoryError::Config(_))));

    let no_dimension = MemoryConfig::new("bedrock", "amazon.titan-embed-text-v2:0", 0);
    assert!(matches!(no_dimension.validate(), Err(MemoryError::Config(_))));
}

#[test]
fn test_bedrock_embedding_config_uses_explicit_region() {
    let config = MemoryConfig::default().with_region("eu-central-1".to_string());
    let embedding = config.embedding_config().unwrap();

    assert_eq!(embedding.provider, EmbeddingProvider::Bedrock);
    assert_eq!(embedding.region, "eu-central-1");
    assert_eq!(embedding.dimension, 1024);
}

#[test]
fn test_storage_backend_from_toml() {
    let config: MemoryConfig = toml::from_str(
        r#"
        provider = "aws_bedrock"
        model = "amazon.titan-embed-text-v1"
        dimension = 1536

        [storage]
        type = "sqlite"
        path = "memory.db"
        "#,
    )
    .unwrap();

    assert_eq!(config.storage, StorageBackend::Sqlite { path: "memory.db".to_string() });
    assert_eq!(config.limits, MemoryLimits::default());
    assert_eq!(config.region, None);
}
