use crate::error::RagVecError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// ragvec application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root directory holding one subdirectory per artifact version
    pub artifact_root: PathBuf,

    /// Version to load at startup (falls back to the CURRENT pointer)
    pub index_version: Option<String>,

    /// Server bind address
    pub server_host: String,

    /// Server port
    pub server_port: u16,

    /// Log directory
    pub log_dir: PathBuf,

    /// Log level
    pub log_level: String,

    /// Embedding dimension
    pub embedding_dim: usize,

    /// ANN index kind ("hnsw" or "flat")
    pub index_kind: String,

    /// Max neighbors per graph node
    pub hnsw_max_neighbors: usize,

    /// Candidate breadth during graph construction
    pub hnsw_ef_construction: usize,

    /// Candidate breadth at query time
    pub hnsw_ef_search: usize,

    /// Seed for graph layer assignment
    pub build_seed: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            artifact_root: PathBuf::from("./artifacts/index"),
            index_version: None,
            server_host: "0.0.0.0".to_string(),
            server_port: 8080,
            log_dir: PathBuf::from("./artifacts/log"),
            log_level: "info".to_string(),
            embedding_dim: 64,
            index_kind: "hnsw".to_string(),
            hnsw_max_neighbors: 32,
            hnsw_ef_construction: 80,
            hnsw_ef_search: 64,
            build_seed: 42,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and .env file
    pub fn from_env() -> Result<Self, RagVecError> {
        // Load .env file (ignore if not exists)
        let _ = dotenv::dotenv();

        let defaults = Self::default();
        let config = Self {
            artifact_root: Self::get_env_path("ARTIFACT_ROOT")
                .unwrap_or(defaults.artifact_root),
            index_version: std::env::var("INDEX_VERSION")
                .ok()
                .filter(|v| !v.trim().is_empty()),
            server_host: std::env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: Self::get_env_parsed("SERVER_PORT").unwrap_or(defaults.server_port),
            log_dir: Self::get_env_path("LOG_DIR").unwrap_or(defaults.log_dir),
            log_level: std::env::var("LOG_LEVEL").unwrap_or(defaults.log_level),
            embedding_dim: Self::get_env_parsed("EMBEDDING_DIM")
                .unwrap_or(defaults.embedding_dim),
            index_kind: std::env::var("INDEX_KIND").unwrap_or(defaults.index_kind),
            hnsw_max_neighbors: Self::get_env_parsed("HNSW_MAX_NEIGHBORS")
                .unwrap_or(defaults.hnsw_max_neighbors),
            hnsw_ef_construction: Self::get_env_parsed("HNSW_EF_CONSTRUCTION")
                .unwrap_or(defaults.hnsw_ef_construction),
            hnsw_ef_search: Self::get_env_parsed("HNSW_EF_SEARCH")
                .unwrap_or(defaults.hnsw_ef_search),
            build_seed: Self::get_env_parsed("BUILD_SEED").unwrap_or(defaults.build_seed),
        };

        // Ensure required directories exist
        config.ensure_directories()?;

        Ok(config)
    }

    /// Get PathBuf from environment variable
    fn get_env_path(key: &str) -> Option<PathBuf> {
        std::env::var(key).ok().map(PathBuf::from)
    }

    /// Parse environment variable, ignoring unset or unparsable values
    fn get_env_parsed<T: std::str::FromStr>(key: &str) -> Option<T> {
        std::env::var(key).ok().and_then(|s| s.trim().parse().ok())
    }

    /// Ensure required directories exist, create if not
    pub fn ensure_directories(&self) -> Result<(), RagVecError> {
        for dir in [&self.artifact_root, &self.log_dir] {
            if !dir.exists() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    RagVecError::config(format!(
                        "Failed to create directory {}: {}",
                        dir.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(())
    }

    /// Get server bind address (host:port)
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), RagVecError> {
        if self.embedding_dim == 0 {
            return Err(RagVecError::config("Embedding dimension cannot be 0"));
        }

        if !matches!(self.index_kind.as_str(), "hnsw" | "flat") {
            return Err(RagVecError::config(format!(
                "Unknown index kind '{}', expected 'hnsw' or 'flat'",
                self.index_kind
            )));
        }

        if self.hnsw_max_neighbors < 2 {
            return Err(RagVecError::config("HNSW max neighbors must be at least 2"));
        }

        if self.hnsw_ef_construction == 0 || self.hnsw_ef_search == 0 {
            return Err(RagVecError::config("HNSW search breadth cannot be 0"));
        }

        // Validate port range
        if self.server_port == 0 {
            return Err(RagVecError::config("Server port cannot be 0"));
        }

        Ok(())
    }
}
