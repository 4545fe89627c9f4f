//! End-to-end build, publish, load and query scenarios

use ragvec_common::RagVecError;
use ragvec_embed::{embed, Embedder, HashEmbedder};
use ragvec_vector::store::{ID_MAP_FILE, INDEX_FILE};
use ragvec_vector::{
    embedding_checksum, ArtifactStore, Chunk, Filters, HealthResponse, IndexBuilder, IndexParams,
    SearchService,
};
use sha2::{Digest, Sha256};
use std::fs;
use std::sync::Arc;

const DIM: usize = 64;

fn corpus() -> Vec<Chunk> {
    (0..10)
        .map(|i| {
            Chunk::new(
                format!("chunk-{}", i),
                format!("doc-{}", i / 5),
                format!("passage number {} about topic {}", i, i % 3),
            )
        })
        .collect()
}

fn builder() -> IndexBuilder {
    IndexBuilder::new(Arc::new(HashEmbedder::new(DIM)), IndexParams::default())
}

fn published(versions: &[&str]) -> (tempfile::TempDir, ArtifactStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = ArtifactStore::new(dir.path().join("index"));
    for version in versions {
        builder().build_and_publish(&store, version, &corpus()).unwrap();
    }
    (dir, store)
}

#[test]
fn self_retrieval_returns_the_chunk() {
    let (_dir, store) = published(&["v1"]);
    let service = SearchService::new(store);
    service.reload("v1").unwrap();

    let chunks = corpus();
    let query = embed(&chunks[3].text, DIM);
    let response = service.search(&query, 1, &Filters::new()).unwrap();

    assert_eq!(response.index_version, "v1");
    assert_eq!(response.results.len(), 1);
    assert_eq!(response.results[0].chunk_id, "chunk-3");
    assert_eq!(response.results[0].doc_id, "doc-0");
    assert!(response.results[0].vec_score > 0.999);
}

#[test]
fn health_follows_load_lifecycle() {
    let (_dir, store) = published(&["v1"]);
    let service = SearchService::new(store);

    assert!(matches!(service.health(), Err(RagVecError::NotLoaded)));

    service.reload("v1").unwrap();
    assert_eq!(service.health().unwrap(), HealthResponse::ok("v1"));
}

#[test]
fn filter_on_unknown_doc_returns_nothing() {
    let (_dir, store) = published(&["v1"]);
    let service = SearchService::new(store);
    service.reload("v1").unwrap();

    let mut filters = Filters::new();
    filters.insert("doc_id".to_string(), "doc-missing".to_string());
    let response = service.search(&embed("anything", DIM), 5, &filters).unwrap();
    assert!(response.results.is_empty());
    assert_eq!(response.index_version, "v1");
}

#[test]
fn failed_reload_keeps_serving_previous_version() {
    let (_dir, store) = published(&["v1"]);
    let service = SearchService::new(store);
    service.reload("v1").unwrap();

    assert!(matches!(
        service.reload("v2"),
        Err(RagVecError::ArtifactNotFound { .. })
    ));
    assert_eq!(service.health().unwrap().loaded_index_version, "v1");
    let response = service.search(&embed("topic", DIM), 3, &Filters::new()).unwrap();
    assert_eq!(response.index_version, "v1");
}

#[test]
fn corrupt_id_map_is_rejected_on_load() {
    let (dir, store) = published(&["v1", "v2"]);
    let service = SearchService::new(store);
    service.reload("v1").unwrap();

    fs::write(dir.path().join("index/v2").join(ID_MAP_FILE), b"[]").unwrap();
    assert!(matches!(
        service.reload("v2"),
        Err(RagVecError::CorruptArtifact { .. })
    ));
    assert_eq!(service.health().unwrap().loaded_index_version, "v1");
}

#[test]
fn results_are_bounded_by_top_n() {
    let (_dir, store) = published(&["v1"]);
    let service = SearchService::new(store);
    service.reload("v1").unwrap();

    for top_n in [1, 3, 10, 25] {
        let response = service.search(&embed("topic 1", DIM), top_n, &Filters::new()).unwrap();
        assert!(response.results.len() <= top_n);
        assert!(response.results.len() <= 10);
    }
}

#[test]
fn huge_top_n_returns_whole_corpus() {
    let (_dir, store) = published(&["v1"]);
    let service = SearchService::new(store);
    service.reload("v1").unwrap();

    for top_n in [usize::MAX, 1usize << 40] {
        let response = service.search(&embed("q", DIM), top_n, &Filters::new()).unwrap();
        assert_eq!(response.results.len(), 10);
    }
}

#[test]
fn dimension_guard_rejects_short_query() {
    let (_dir, store) = published(&["v1"]);
    let service = SearchService::new(store);
    service.reload("v1").unwrap();

    let err = service
        .search(&vec![0.1; DIM / 2], 3, &Filters::new())
        .unwrap_err();
    assert!(matches!(
        err,
        RagVecError::DimensionMismatch {
            expected: 64,
            actual: 32
        }
    ));
    assert_eq!(err.status_code(), 400);
}

#[test]
fn ledger_checksums_match_recomputed_vectors() {
    let (_dir, store) = published(&["v1"]);
    let ledger = store.load_ledger("v1").unwrap();
    let embedder = HashEmbedder::new(DIM);

    assert_eq!(ledger.len(), 10);
    for (record, chunk) in ledger.iter().zip(corpus()) {
        let vector = embedder.embed(&chunk.text);
        let bytes: Vec<u8> = vector.iter().flat_map(|v| v.to_le_bytes()).collect();
        let expected = hex::encode(Sha256::digest(&bytes));

        assert_eq!(record.chunk_id, chunk.chunk_id);
        assert_eq!(record.embedding_checksum, expected);
        assert_eq!(record.embedding_checksum, embedding_checksum(&vector));
        assert_eq!(record.embedder_version, embedder.metadata().version);
    }
}

#[test]
fn rebuild_is_byte_identical() {
    let (dir, _store) = published(&["v1", "v2"]);
    for file in [INDEX_FILE, ID_MAP_FILE] {
        let a = fs::read(dir.path().join("index/v1").join(file)).unwrap();
        let b = fs::read(dir.path().join("index/v2").join(file)).unwrap();
        assert_eq!(a, b, "{} differs between builds", file);
    }
}

#[test]
fn existing_version_cannot_be_republished() {
    let (dir, store) = published(&["v1"]);
    let before = fs::read(dir.path().join("index/v1").join(INDEX_FILE)).unwrap();

    let mut other = corpus();
    other.truncate(4);
    assert!(matches!(
        builder().build_and_publish(&store, "v1", &other),
        Err(RagVecError::InputValidation(_))
    ));
    let after = fs::read(dir.path().join("index/v1").join(INDEX_FILE)).unwrap();
    assert_eq!(before, after);
}

#[test]
fn activate_then_reload_current_and_rollback() {
    let (_dir, store) = published(&["v1", "v2"]);
    let service = SearchService::new(store);

    service.store().activate("v2").unwrap();
    service.reload_current().unwrap();
    assert_eq!(service.health().unwrap().loaded_index_version, "v2");

    service.store().activate("v1").unwrap();
    service.reload_current().unwrap();
    assert_eq!(service.health().unwrap().loaded_index_version, "v1");
    assert_eq!(service.store().list_versions().unwrap(), vec!["v1", "v2"]);
}
