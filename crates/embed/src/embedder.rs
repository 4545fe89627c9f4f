use crate::types::EmbedderMetadata;

/// Common trait for embedding functions
///
/// Implementations must be pure: the same text always maps to the same
/// vector for a given `metadata().model_hash`.
pub trait Embedder: Send + Sync {
    /// Describes the function producing the vectors
    fn metadata(&self) -> &EmbedderMetadata;

    /// Embed a single text into a vector of length `metadata().dim`
    fn embed(&self, text: &str) -> Vec<f32>;

    /// Output dimension
    fn dim(&self) -> usize {
        self.metadata().dim
    }
}
