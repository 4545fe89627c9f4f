use serde::{Deserialize, Serialize};

/// Describes which deterministic function produced a set of vectors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedderMetadata {
    /// Embedder name (e.g., "deterministic-hash-embedder")
    pub name: String,

    /// Embedder version, recorded in every integrity record
    pub version: String,

    /// Hash identifying the model weights or algorithm
    pub model_hash: String,

    /// Output dimension
    pub dim: usize,
}

impl EmbedderMetadata {
    /// Create new metadata
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        model_hash: impl Into<String>,
        dim: usize,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            model_hash: model_hash.into(),
            dim,
        }
    }
}

/// Euclidean norm, accumulated in f64
pub fn l2_norm(vector: &[f32]) -> f32 {
    vector
        .iter()
        .map(|&v| f64::from(v) * f64::from(v))
        .sum::<f64>()
        .sqrt() as f32
}
