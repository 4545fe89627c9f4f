use arc_swap::ArcSwapOption;
use chrono::{DateTime, Utc};
use ragvec_common::{RagVecError, Result};
use ragvec_embed::EmbedderMetadata;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::ann::{AnnIndex, NOT_FOUND};
use crate::ledger::IntegrityRecord;
use crate::store::{ArtifactStore, LoadedArtifact};
use crate::types::{Filters, HealthResponse, IdMapEntry, SearchResponse, SearchResult};

/// One loaded artifact version, immutable once constructed
#[derive(Debug)]
pub struct LoadedIndex {
    version: String,
    index: Box<dyn AnnIndex>,
    id_map: Vec<IdMapEntry>,
    metadata: EmbedderMetadata,
    ledger: Vec<IntegrityRecord>,
    loaded_at: DateTime<Utc>,
}

impl LoadedIndex {
    pub fn from_artifact(version: impl Into<String>, artifact: LoadedArtifact) -> Self {
        Self {
            version: version.into(),
            index: artifact.index,
            id_map: artifact.id_map,
            metadata: artifact.metadata,
            ledger: artifact.ledger,
            loaded_at: Utc::now(),
        }
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn metadata(&self) -> &EmbedderMetadata {
        &self.metadata
    }

    pub fn id_map(&self) -> &[IdMapEntry] {
        &self.id_map
    }

    pub fn ledger(&self) -> &[IntegrityRecord] {
        &self.ledger
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    pub fn len(&self) -> usize {
        self.id_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_map.is_empty()
    }

    pub fn health(&self) -> HealthResponse {
        HealthResponse::ok(&self.version)
    }

    /// Nearest chunks to `query`
    ///
    /// The index is asked for `top_n` candidates; filters are applied
    /// afterwards, so a filtered search can return fewer than `top_n` hits.
    pub fn search(
        &self,
        query: &[f32],
        top_n: usize,
        filters: &Filters,
    ) -> Result<SearchResponse> {
        let dim = self.metadata.dim;
        if query.len() != dim {
            return Err(RagVecError::dimension_mismatch(dim, query.len()));
        }
        if query.iter().any(|v| !v.is_finite()) {
            return Err(RagVecError::input_validation(
                "Query vector contains non-finite values",
            ));
        }

        if top_n == 0 || self.index.is_empty() {
            return Ok(SearchResponse {
                results: Vec::new(),
                index_version: self.version.clone(),
            });
        }

        let top_n = top_n.min(self.index.len());
        let candidates = self.index.search(query, top_n);
        let mut results = Vec::with_capacity(candidates.len());

        for candidate in candidates {
            if candidate.id == NOT_FOUND {
                continue;
            }
            let Some(entry) = self.id_map.get(candidate.id) else {
                warn!(
                    "Index returned id {} with no id map entry (version {})",
                    candidate.id, self.version
                );
                continue;
            };
            if !entry.matches(filters) {
                continue;
            }
            results.push(SearchResult {
                chunk_id: entry.chunk_id.clone(),
                doc_id: entry.doc_id.clone(),
                vec_score: candidate.score,
            });
        }
        results.truncate(top_n);

        debug!(
            "Search on {} - top_n {}, {} filters, {} results",
            self.version,
            top_n,
            filters.len(),
            results.len()
        );

        Ok(SearchResponse {
            results,
            index_version: self.version.clone(),
        })
    }
}

/// Serves queries against whichever version is currently loaded
///
/// The loaded version sits behind an atomic pointer. A query takes one
/// snapshot and runs entirely against it; a reload builds the replacement
/// off to the side and swaps only after it has fully loaded.
pub struct SearchService {
    store: ArtifactStore,
    current: ArcSwapOption<LoadedIndex>,
}

impl SearchService {
    /// Create service with nothing loaded
    pub fn new(store: ArtifactStore) -> Self {
        Self {
            store,
            current: ArcSwapOption::empty(),
        }
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Snapshot of the loaded version
    pub fn handle(&self) -> Result<Arc<LoadedIndex>> {
        self.current.load_full().ok_or(RagVecError::NotLoaded)
    }

    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }

    /// Load `version` and make it current
    ///
    /// On any failure the previously loaded version keeps serving.
    pub fn reload(&self, version: &str) -> Result<Arc<LoadedIndex>> {
        info!("Loading index version {}", version);

        let artifact = self.store.load(version).map_err(|e| {
            error!("Failed to load version {}: {}", version, e);
            e
        })?;
        let loaded = Arc::new(LoadedIndex::from_artifact(version, artifact));

        let previous = self.current.swap(Some(loaded.clone()));
        match previous {
            Some(prev) => info!(
                "Index version {} replaced {} - {} vectors",
                loaded.version(),
                prev.version(),
                loaded.len()
            ),
            None => info!(
                "Index version {} loaded - {} vectors",
                loaded.version(),
                loaded.len()
            ),
        }

        Ok(loaded)
    }

    /// Load whatever version CURRENT points at
    pub fn reload_current(&self) -> Result<Arc<LoadedIndex>> {
        let version = self.store.current()?.ok_or_else(|| {
            RagVecError::artifact_not_found("(none)", crate::store::CURRENT_FILE)
        })?;
        self.reload(&version)
    }

    /// Health of the loaded version; `NotLoaded` before the first load
    pub fn health(&self) -> Result<HealthResponse> {
        Ok(self.handle()?.health())
    }

    pub fn search(
        &self,
        query: &[f32],
        top_n: usize,
        filters: &Filters,
    ) -> Result<SearchResponse> {
        self.handle()?.search(query, top_n, filters)
    }

    /// Ledger of the loaded version
    pub fn ledger(&self) -> Result<(String, Vec<IntegrityRecord>)> {
        let loaded = self.handle()?;
        Ok((loaded.version().to_string(), loaded.ledger().to_vec()))
    }
}
