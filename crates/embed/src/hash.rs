use sha2::{Digest, Sha256};
use tracing::debug;

use crate::embedder::Embedder;
use crate::types::EmbedderMetadata;

pub const HASH_EMBEDDER_NAME: &str = "deterministic-hash-embedder";
pub const HASH_EMBEDDER_VERSION: &str = "1.0.0";
pub const HASH_EMBEDDER_MODEL_HASH: &str =
    "sha256:2cb170fbb6d2d7f6f0f7b221b2f5f6b94e9a7b55ecf31fd5fe2f5b295f020e95";
pub const DEFAULT_DIM: usize = 64;

/// Embed text into a `dim`-length unit vector
///
/// Component `i` is the first four bytes of `SHA-256("{text}|{i}")` read as a
/// big-endian u32 and scaled into [0, 1), then stored as f32. The result is
/// L2-normalized in f32 unless every component is exactly zero.
pub fn embed(text: &str, dim: usize) -> Vec<f32> {
    let raw: Vec<f32> = (0..dim).map(|i| raw_component(text, i)).collect();

    let norm = raw.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return raw;
    }

    raw.into_iter().map(|v| v / norm).collect()
}

fn raw_component(text: &str, i: usize) -> f32 {
    let digest = Sha256::digest(format!("{}|{}", text, i).as_bytes());
    let word = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    (f64::from(word) / 4_294_967_296.0) as f32
}

/// Hash-based stand-in for a learned embedding model
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    metadata: EmbedderMetadata,
}

impl HashEmbedder {
    /// Create embedder with the given output dimension
    pub fn new(dim: usize) -> Self {
        Self {
            metadata: EmbedderMetadata::new(
                HASH_EMBEDDER_NAME,
                HASH_EMBEDDER_VERSION,
                HASH_EMBEDDER_MODEL_HASH,
                dim,
            ),
        }
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_DIM)
    }
}

impl Embedder for HashEmbedder {
    fn metadata(&self) -> &EmbedderMetadata {
        &self.metadata
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        debug!("Embedding text - length: {}, dim: {}", text.len(), self.metadata.dim);
        embed(text, self.metadata.dim)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::l2_norm;

    #[test]
    fn test_embed_deterministic() {
        for text in ["", "hello", "같은 텍스트", "a much longer passage of text"] {
            for dim in [1, 7, 64, 384] {
                let a = embed(text, dim);
                let b = embed(text, dim);
                assert_eq!(a.len(), dim);
                let a_bits: Vec<u32> = a.iter().map(|v| v.to_bits()).collect();
                let b_bits: Vec<u32> = b.iter().map(|v| v.to_bits()).collect();
                assert_eq!(a_bits, b_bits);
            }
        }
    }

    #[test]
    fn test_embed_unit_norm() {
        for text in ["alpha", "beta", "gamma"] {
            let v = embed(text, 64);
            assert!((l2_norm(&v) - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_embed_zero_dim_is_zero_vector() {
        let v = embed("anything", 0);
        assert!(v.is_empty());
        assert_eq!(l2_norm(&v), 0.0);
    }

    #[test]
    fn test_embed_values_non_negative() {
        assert!(embed("chunk", 32).iter().all(|&x| x >= 0.0));
    }

    #[test]
    fn test_different_texts_differ() {
        assert_ne!(embed("first", 16), embed("second", 16));
    }

    #[test]
    fn test_first_component_matches_hash() {
        let digest = Sha256::digest(b"doc|0");
        let word = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
        let raw0 = f64::from(word) / 4_294_967_296.0;
        let v = embed("doc", 1);
        // A single component normalizes to exactly 1 unless the raw value is zero
        if raw0 == 0.0 {
            assert_eq!(v[0], 0.0);
        } else {
            assert_eq!(v[0], 1.0);
        }
    }

    #[test]
    fn test_components_rounded_to_f32_before_normalizing() {
        let raw: Vec<f32> = (0..2)
            .map(|i| {
                let digest = Sha256::digest(format!("doc|{}", i).as_bytes());
                let word = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
                (f64::from(word) / 4_294_967_296.0) as f32
            })
            .collect();
        let norm = (raw[0] * raw[0] + raw[1] * raw[1]).sqrt();

        let v = embed("doc", 2);
        assert_eq!(v[0].to_bits(), (raw[0] / norm).to_bits());
        assert_eq!(v[1].to_bits(), (raw[1] / norm).to_bits());
    }

    #[test]
    fn test_hash_embedder_metadata() {
        let embedder = HashEmbedder::default();
        assert_eq!(embedder.dim(), 64);
        assert_eq!(embedder.metadata().name, HASH_EMBEDDER_NAME);
        assert_eq!(embedder.metadata().version, "1.0.0");
        assert_eq!(embedder.embed("x"), embed("x", 64));
    }
}
