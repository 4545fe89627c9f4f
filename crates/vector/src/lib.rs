//! RAG Vector Index
//!
//! Offline build and online serving of versioned vector indexes:
//!
//! - `corpus` / `builder`: chunks in, co-versioned artifact bundle out
//! - `store`: immutable on-disk versions with staged publish and a CURRENT pointer
//! - `service`: loads a version and answers nearest-chunk queries, with atomic reload
//! - `ledger`: per-vector checksums for external audit

pub mod ann;
pub mod builder;
pub mod corpus;
pub mod ledger;
pub mod service;
pub mod similarity;
pub mod store;
pub mod types;

pub use ann::{AnnIndex, IndexKind, IndexParams, Neighbor, NOT_FOUND};
pub use builder::{ArtifactBundle, BuildReport, IndexBuilder};
pub use corpus::{parse_corpus, read_corpus, validate_chunks};
pub use ledger::{embedding_checksum, IntegrityRecord};
pub use service::{LoadedIndex, SearchService};
pub use store::{ArtifactStore, LoadedArtifact};
pub use types::{Chunk, Filters, HealthResponse, IdMapEntry, SearchResponse, SearchResult};
