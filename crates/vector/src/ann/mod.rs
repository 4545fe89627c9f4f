//! Approximate nearest neighbor capability
//!
//! Any structure implementing [`AnnIndex`] can back an artifact version:
//!
//! - `build_index(dim, vectors, params)` inserts vectors in order, so the
//!   k-th vector gets internal id k-1
//! - `AnnIndex::search(query, k)` returns candidates best first
//! - `AnnIndex::write_to` / `read_index` round-trip the opaque index file
//!
//! Two implementations ship: a multi-layer navigable graph ([`Hnsw`]) and an
//! exhaustive scan ([`FlatIndex`]) for small corpora and tests.

mod codec;
mod flat;
mod hnsw;

use ragvec_common::{RagVecError, Result};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::str::FromStr;

pub use flat::FlatIndex;
pub use hnsw::Hnsw;

/// Candidate id an index may emit for a slot it could not fill
pub const NOT_FOUND: usize = usize::MAX;

/// Search candidate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Internal id
    pub id: usize,

    /// Cosine similarity to the query
    pub score: f32,
}

/// ANN implementation selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Hnsw,
    Flat,
}

impl IndexKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hnsw => "hnsw",
            Self::Flat => "flat",
        }
    }
}

impl FromStr for IndexKind {
    type Err = RagVecError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hnsw" => Ok(Self::Hnsw),
            "flat" => Ok(Self::Flat),
            other => Err(RagVecError::input_validation(format!(
                "Unknown index kind: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Index construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexParams {
    /// Index implementation
    pub kind: IndexKind,

    /// Max neighbors per node on upper layers (layer 0 allows twice this)
    pub max_neighbors: usize,

    /// Candidate breadth while wiring new nodes
    pub ef_construction: usize,

    /// Candidate breadth at query time (raised to k when smaller)
    pub ef_search: usize,

    /// Seed for layer assignment; fixed seed gives reproducible graphs
    pub seed: u64,
}

impl Default for IndexParams {
    fn default() -> Self {
        Self {
            kind: IndexKind::Hnsw,
            max_neighbors: 32,
            ef_construction: 80,
            ef_search: 64,
            seed: 42,
        }
    }
}

impl IndexParams {
    /// Flat (exhaustive) parameters
    pub fn flat() -> Self {
        Self {
            kind: IndexKind::Flat,
            ..Self::default()
        }
    }

    /// Check parameters before a build starts
    pub fn validate(&self) -> Result<()> {
        if self.kind == IndexKind::Hnsw {
            if self.max_neighbors < 2 {
                return Err(RagVecError::input_validation(
                    "max_neighbors must be at least 2",
                ));
            }
            if self.ef_construction == 0 {
                return Err(RagVecError::input_validation(
                    "ef_construction must be positive",
                ));
            }
        }
        if self.ef_search == 0 {
            return Err(RagVecError::input_validation("ef_search must be positive"));
        }
        Ok(())
    }
}

/// Nearest neighbor index over dense internal ids
pub trait AnnIndex: Send + Sync + std::fmt::Debug {
    /// Implementation kind
    fn kind(&self) -> IndexKind;

    /// Vector dimension
    fn dim(&self) -> usize;

    /// Number of indexed vectors
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored vector for an internal id
    fn vector(&self, id: usize) -> Option<&[f32]>;

    /// Up to `k` candidates, best first
    fn search(&self, query: &[f32], k: usize) -> Vec<Neighbor>;

    /// Serialize to the opaque index format
    fn write_to(&self, writer: &mut dyn Write) -> io::Result<()>;
}

/// Build an index by inserting `vectors` in order
pub fn build_index(
    dim: usize,
    vectors: &[Vec<f32>],
    params: &IndexParams,
) -> Result<Box<dyn AnnIndex>> {
    params.validate()?;

    match params.kind {
        IndexKind::Hnsw => {
            let mut index = Hnsw::new(dim, params);
            for vector in vectors {
                index.insert(vector)?;
            }
            Ok(Box::new(index))
        }
        IndexKind::Flat => {
            let mut index = FlatIndex::new(dim);
            for vector in vectors {
                index.add(vector)?;
            }
            Ok(Box::new(index))
        }
    }
}

/// Deserialize an index, dispatching on its magic bytes
pub fn read_index<R: Read>(reader: &mut R) -> io::Result<Box<dyn AnnIndex>> {
    let mut magic = [0u8; 8];
    reader.read_exact(&mut magic)?;

    match &magic {
        hnsw::MAGIC => Ok(Box::new(Hnsw::read_body(reader)?)),
        flat::MAGIC => Ok(Box::new(FlatIndex::read_body(reader)?)),
        _ => Err(io::Error::new(io::ErrorKind::InvalidData, "Unknown index magic")),
    }
}

/// Serialize an index into a byte buffer
pub fn index_to_bytes(index: &dyn AnnIndex) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    index.write_to(&mut buf)?;
    Ok(buf)
}
