use ragvec_common::{AppConfig, RagVecError, Result};
use ragvec_vector::{ArtifactStore, SearchService};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared application state
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,

    /// Search service over the artifact store
    pub service: Arc<SearchService>,
}

impl AppState {
    /// Create new application state and load the startup version
    ///
    /// `INDEX_VERSION` wins over the CURRENT pointer. When neither names a
    /// loadable version the server still starts, reporting unhealthy until
    /// an admin reload succeeds.
    pub fn new(config: AppConfig) -> Result<Self> {
        let service = Arc::new(SearchService::new(ArtifactStore::new(&config.artifact_root)));

        let loaded = match &config.index_version {
            Some(version) => service.reload(version),
            None => service.reload_current(),
        };
        match loaded {
            Ok(index) => info!("Serving index version {}", index.version()),
            Err(RagVecError::ArtifactNotFound { version, artifact }) => warn!(
                "No index loaded at startup ({} missing for version {})",
                artifact, version
            ),
            Err(e) => return Err(e),
        }

        Ok(Self::with_service(config, service))
    }

    /// State around an already configured service
    pub fn with_service(config: AppConfig, service: Arc<SearchService>) -> Self {
        Self { config, service }
    }
}
