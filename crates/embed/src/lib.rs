//! ragvec embedding
//!
//! Deterministic text-to-vector functions behind a pluggable trait

mod embedder;
mod hash;
mod types;

pub use embedder::Embedder;
pub use hash::{embed, HashEmbedder};
pub use types::{l2_norm, EmbedderMetadata};
