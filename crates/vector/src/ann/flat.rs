use ragvec_common::{RagVecError, Result};
use std::cmp::Ordering;
use std::io::{self, Read, Write};

use super::codec::{invalid, read_f32s, read_u32, write_f32s, write_len};
use super::{AnnIndex, IndexKind, Neighbor};
use crate::similarity::cosine_similarity;

pub(super) const MAGIC: &[u8; 8] = b"RVGFLAT1";

/// Exhaustive cosine scan over contiguous vectors
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dim: usize,
    vectors: Vec<f32>,
}

impl FlatIndex {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            vectors: Vec::new(),
        }
    }

    /// Append a vector; returns its internal id
    pub fn add(&mut self, vector: &[f32]) -> Result<usize> {
        if vector.len() != self.dim {
            return Err(RagVecError::dimension_mismatch(self.dim, vector.len()));
        }
        let id = self.len();
        self.vectors.extend_from_slice(vector);
        Ok(id)
    }

    pub(super) fn read_body<R: Read>(reader: &mut R) -> io::Result<Self> {
        let dim = read_u32(reader)? as usize;
        let count = read_u32(reader)? as usize;
        if dim == 0 && count > 0 {
            return Err(invalid("Zero dimension with non-empty index"));
        }

        let total = dim
            .checked_mul(count)
            .ok_or_else(|| invalid("Vector block too large"))?;
        let vectors = read_f32s(reader, total)?;

        Ok(Self { dim, vectors })
    }
}

impl AnnIndex for FlatIndex {
    fn kind(&self) -> IndexKind {
        IndexKind::Flat
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        if self.dim == 0 {
            0
        } else {
            self.vectors.len() / self.dim
        }
    }

    fn vector(&self, id: usize) -> Option<&[f32]> {
        if id >= self.len() {
            return None;
        }
        let start = id * self.dim;
        self.vectors.get(start..start + self.dim)
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        if k == 0 || self.dim == 0 {
            return Vec::new();
        }

        let mut scored: Vec<Neighbor> = self
            .vectors
            .chunks_exact(self.dim)
            .enumerate()
            .map(|(id, v)| Neighbor {
                id,
                score: cosine_similarity(query, v),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.id.cmp(&b.id))
        });
        scored.truncate(k);
        scored
    }

    fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_all(MAGIC)?;
        write_len(writer, self.dim)?;
        write_len(writer, self.len())?;
        write_f32s(writer, &self.vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> FlatIndex {
        let mut index = FlatIndex::new(2);
        index.add(&[1.0, 0.0]).unwrap();
        index.add(&[0.0, 1.0]).unwrap();
        index.add(&[0.8, 0.6]).unwrap();
        index
    }

    #[test]
    fn test_search_orders_best_first() {
        let hits = sample().search(&[1.0, 0.0], 3);
        let ids: Vec<usize> = hits.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![0, 2, 1]);
        assert!(hits[0].score >= hits[1].score && hits[1].score >= hits[2].score);
    }

    #[test]
    fn test_search_bounded_by_corpus() {
        assert_eq!(sample().search(&[1.0, 0.0], 10).len(), 3);
        assert!(sample().search(&[1.0, 0.0], 0).is_empty());
    }

    #[test]
    fn test_add_wrong_dimension() {
        let mut index = FlatIndex::new(3);
        assert!(matches!(
            index.add(&[1.0]),
            Err(RagVecError::DimensionMismatch { expected: 3, actual: 1 })
        ));
    }

    #[test]
    fn test_write_read() {
        let index = sample();
        let mut buf = Vec::new();
        index.write_to(&mut buf).unwrap();
        assert_eq!(&buf[..8], MAGIC);
        let restored = FlatIndex::read_body(&mut &buf[8..]).unwrap();
        assert_eq!(restored.len(), 3);
        assert_eq!(restored.vector(2), Some(&[0.8f32, 0.6][..]));
    }
}
