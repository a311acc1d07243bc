//! Build-or-load behavior of the persisted index.

use super::*;
use crate::store::{INDEX_FILE, MANIFEST_FILE};
use crate::{build_or_load, stats, SqliteVectorIndex};

fn corpus() -> Vec<(&'static str, &'static str)> {
    vec![
        ("sky.txt", "The sky is blue. Grass is green."),
        ("snow.txt", "Snow is white and cold in winter."),
        ("notes.md", "Markdown is not a recognized format."),
    ]
}

#[tokio::test]
async fn test_second_start_loads_without_embedding() {
    let (_temp, config) = workspace(&corpus());

    let first = CountingEmbedder::new();
    let (built, build_stats) = build_or_load(&config, first.as_ref(), false).await.unwrap();
    assert!(!build_stats.loaded_existing);
    assert_eq!(build_stats.documents_count, 2);
    assert_eq!(build_stats.chunks_count, 2);
    assert_eq!(first.embedded(), 2);
    assert!(config.persist_dir.join(INDEX_FILE).is_file());
    assert!(config.persist_dir.join(MANIFEST_FILE).is_file());

    let second = CountingEmbedder::new();
    let (loaded, load_stats) = build_or_load(&config, second.as_ref(), false).await.unwrap();
    assert!(load_stats.loaded_existing);
    assert_eq!(load_stats.chunks_count, 2);
    assert_eq!(second.embedded(), 0);

    let query = MockProvider::new(DIMENSIONS).embed("cold snow").await.unwrap();
    assert_eq!(
        built.search(&query, 2).unwrap(),
        loaded.search(&query, 2).unwrap()
    );
    assert!(loaded.search(&query, 1).unwrap()[0].text.contains("Snow"));
}

#[tokio::test]
async fn test_rebuild_embeds_again() {
    let (temp, config) = workspace(&corpus());
    build_or_load(&config, &MockProvider::new(DIMENSIONS), false)
        .await
        .unwrap();

    fs::write(temp.path().join("data").join("rain.txt"), "Rain is wet.").unwrap();

    let embedder = CountingEmbedder::new();
    let (index, build_stats) = build_or_load(&config, embedder.as_ref(), true).await.unwrap();
    assert!(!build_stats.loaded_existing);
    assert_eq!(index.len(), 3);
    assert_eq!(embedder.embedded(), 3);
}

#[tokio::test]
async fn test_stats_reflect_build() {
    let (_temp, config) = workspace(&corpus());
    build_or_load(&config, &MockProvider::new(DIMENSIONS), false)
        .await
        .unwrap();

    let stats = stats(&config).unwrap();
    assert_eq!(stats.entries_count, 2);
    assert_eq!(stats.sources_count, 2);
    assert_eq!(stats.provider, "mock");
    assert_eq!(stats.dimensions, DIMENSIONS);
    assert_eq!(stats.chunk_size, config.chunk_size);
    assert_eq!(stats.chunk_overlap, config.chunk_overlap);
}

#[tokio::test]
async fn test_missing_data_dir_is_load_error() {
    let (temp, mut config) = workspace(&[]);
    config.data_dir = temp.path().join("nowhere");

    let result = build_or_load(&config, &MockProvider::new(DIMENSIONS), false).await;
    assert!(matches!(result, Err(AppError::Load(_))));
    assert!(!SqliteVectorIndex::is_built(&config.persist_dir));
}

#[tokio::test]
async fn test_failed_embedding_leaves_nothing_behind() {
    let (_temp, config) = workspace(&corpus());

    let result = build_or_load(&config, &UnreachableEmbedder, false).await;
    assert!(matches!(result, Err(AppError::Embedding(_))));
    assert!(!SqliteVectorIndex::is_built(&config.persist_dir));

    let (index, build_stats) = build_or_load(&config, &MockProvider::new(DIMENSIONS), false)
        .await
        .unwrap();
    assert!(!build_stats.loaded_existing);
    assert_eq!(index.len(), 2);
}

#[tokio::test]
async fn test_other_embedding_model_is_rejected() {
    let (_temp, config) = workspace(&corpus());
    build_or_load(&config, &MockProvider::new(DIMENSIONS), false)
        .await
        .unwrap();

    let result = build_or_load(&config, &MockProvider::new(DIMENSIONS / 2), false).await;
    match result {
        Err(AppError::Index(msg)) => assert!(msg.contains("Dimension mismatch")),
        other => panic!("expected index error, got {:?}", other.map(|(_, s)| s)),
    }
}

#[tokio::test]
async fn test_chunk_positions_survive_reload() {
    let long = "Alpha beta gamma delta. ".repeat(100);
    let (_temp, mut config) = workspace(&[("long.txt", long.as_str())]);
    config.chunk_size = 300;
    config.chunk_overlap = 50;

    let (built, _) = build_or_load(&config, &MockProvider::new(DIMENSIONS), false)
        .await
        .unwrap();
    let (loaded, _) = build_or_load(&config, &MockProvider::new(DIMENSIONS), false)
        .await
        .unwrap();

    assert_eq!(built.len(), (long.len() - 50).div_ceil(250));
    assert_eq!(built.entries(), loaded.entries());
    let positions: Vec<usize> = loaded.entries().iter().map(|e| e.position).collect();
    assert_eq!(positions, (0..loaded.len()).collect::<Vec<_>>());
}
