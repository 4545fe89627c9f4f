use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::IdMapEntry;

/// Per-vector audit record, written alongside the index
///
/// An external store compares these checksums against the vectors it serves.
/// Nothing in this crate enforces them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityRecord {
    /// Chunk ID
    pub chunk_id: String,

    /// Document ID
    pub doc_id: String,

    /// SHA-256 hex digest of the vector's little-endian f32 bytes
    pub embedding_checksum: String,

    /// Embedder version that produced the vector
    pub embedder_version: String,
}

impl IntegrityRecord {
    /// Record for the vector stored under `entry`
    pub fn new(entry: &IdMapEntry, vector: &[f32], embedder_version: &str) -> Self {
        Self {
            chunk_id: entry.chunk_id.clone(),
            doc_id: entry.doc_id.clone(),
            embedding_checksum: embedding_checksum(vector),
            embedder_version: embedder_version.to_string(),
        }
    }
}

/// Exact bytes a vector occupies in the index file
pub fn vector_bytes(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// SHA-256 hex digest of a vector's serialized bytes
pub fn embedding_checksum(vector: &[f32]) -> String {
    hex::encode(Sha256::digest(vector_bytes(vector)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Chunk;

    #[test]
    fn test_checksum_of_known_bytes() {
        // 1.0f32 little-endian is 00 00 80 3f
        let expected = hex::encode(Sha256::digest([0x00u8, 0x00, 0x80, 0x3f]));
        assert_eq!(embedding_checksum(&[1.0]), expected);
        assert_eq!(embedding_checksum(&[1.0]).len(), 64);
    }

    #[test]
    fn test_checksum_sensitive_to_single_bit() {
        let a = [0.5f32, 0.25];
        let b = [0.5f32, f32::from_bits(0.25f32.to_bits() + 1)];
        assert_ne!(embedding_checksum(&a), embedding_checksum(&b));
    }

    #[test]
    fn test_record_fields() {
        let entry = IdMapEntry::from_chunk(0, &Chunk::new("c-9", "doc-2", "t"));
        let record = IntegrityRecord::new(&entry, &[0.0, 1.0], "1.0.0");
        assert_eq!(record.chunk_id, "c-9");
        assert_eq!(record.doc_id, "doc-2");
        assert_eq!(record.embedder_version, "1.0.0");
        assert_eq!(record.embedding_checksum, embedding_checksum(&[0.0, 1.0]));
    }
}
