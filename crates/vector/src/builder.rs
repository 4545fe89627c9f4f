use chrono::{DateTime, Utc};
use ragvec_common::{RagVecError, Result};
use ragvec_embed::{Embedder, EmbedderMetadata};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

use crate::ann::{build_index, AnnIndex, IndexKind, IndexParams};
use crate::corpus::validate_chunks;
use crate::ledger::IntegrityRecord;
use crate::store::ArtifactStore;
use crate::types::{Chunk, IdMapEntry};

/// Everything one build run produces, before it is published
#[derive(Debug)]
pub struct ArtifactBundle {
    pub index: Box<dyn AnnIndex>,
    pub id_map: Vec<IdMapEntry>,
    pub metadata: EmbedderMetadata,
    pub ledger: Vec<IntegrityRecord>,
}

/// Summary of a published build
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub version: String,
    pub vector_count: usize,
    pub dim: usize,
    pub index_kind: IndexKind,
    pub embedder_version: String,
    pub elapsed_ms: u128,
    pub built_at: DateTime<Utc>,
}

/// Turns a corpus snapshot into a co-versioned artifact bundle
pub struct IndexBuilder {
    embedder: Arc<dyn Embedder>,
    params: IndexParams,
}

impl IndexBuilder {
    /// Create new builder
    pub fn new(embedder: Arc<dyn Embedder>, params: IndexParams) -> Self {
        Self { embedder, params }
    }

    /// Embed and index `chunks` in order
    ///
    /// Chunk k (0-based) becomes internal id k. Input problems surface as
    /// `InputValidation`; any failure while constructing the index surfaces
    /// as `BuildAborted`.
    pub fn build(&self, chunks: &[Chunk]) -> Result<ArtifactBundle> {
        validate_chunks(chunks)?;
        self.params.validate()?;

        let metadata = self.embedder.metadata().clone();
        if metadata.dim == 0 {
            return Err(RagVecError::input_validation(format!(
                "Embedder {} reports dimension 0",
                metadata.name
            )));
        }
        info!(
            "Building {} index - {} chunks, embedder {}@{} (dim={})",
            self.params.kind,
            chunks.len(),
            metadata.name,
            metadata.version,
            metadata.dim
        );

        let mut vectors = Vec::with_capacity(chunks.len());
        let mut id_map = Vec::with_capacity(chunks.len());
        let mut ledger = Vec::with_capacity(chunks.len());

        for (internal_id, chunk) in chunks.iter().enumerate() {
            let vector = self.embedder.embed(&chunk.text);
            if vector.len() != metadata.dim {
                return Err(RagVecError::build_aborted(format!(
                    "Embedder returned {} values for chunk {}, expected {}",
                    vector.len(),
                    chunk.chunk_id,
                    metadata.dim
                )));
            }

            let entry = IdMapEntry::from_chunk(internal_id, chunk);
            ledger.push(IntegrityRecord::new(&entry, &vector, &metadata.version));
            id_map.push(entry);
            vectors.push(vector);
        }
        debug!("Embedded {} chunks", vectors.len());

        let index = build_index(metadata.dim, &vectors, &self.params).map_err(|e| {
            error!("Index construction failed: {}", e);
            RagVecError::build_aborted(format!("Index construction failed: {}", e))
        })?;

        if index.len() != id_map.len() {
            return Err(RagVecError::build_aborted(format!(
                "Index holds {} vectors but id map has {} entries",
                index.len(),
                id_map.len()
            )));
        }

        Ok(ArtifactBundle {
            index,
            id_map,
            metadata,
            ledger,
        })
    }

    /// Build and publish as `version`; nothing is visible unless both succeed
    pub fn build_and_publish(
        &self,
        store: &ArtifactStore,
        version: &str,
        chunks: &[Chunk],
    ) -> Result<BuildReport> {
        ArtifactStore::validate_version(version)?;
        if store.exists(version) {
            return Err(RagVecError::input_validation(format!(
                "Version {} is already published",
                version
            )));
        }

        let started = Instant::now();
        let bundle = self.build(chunks)?;
        store.publish(
            version,
            bundle.index.as_ref(),
            &bundle.id_map,
            &bundle.metadata,
            &bundle.ledger,
        )?;

        let report = BuildReport {
            version: version.to_string(),
            vector_count: bundle.id_map.len(),
            dim: bundle.metadata.dim,
            index_kind: bundle.index.kind(),
            embedder_version: bundle.metadata.version.clone(),
            elapsed_ms: started.elapsed().as_millis(),
            built_at: Utc::now(),
        };

        info!(
            "Build completed - version {}: {} vectors, dim {}, {} ms",
            report.version, report.vector_count, report.dim, report.elapsed_ms
        );
        Ok(report)
    }
}
