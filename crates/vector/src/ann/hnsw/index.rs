use ragvec_common::{RagVecError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt;

use super::node::Node;
use crate::ann::{AnnIndex, IndexKind, IndexParams, Neighbor};
use crate::similarity::cosine_similarity;

/// Highest layer a node can be assigned (stored as u8 on disk)
pub(crate) const MAX_LEVEL: usize = 16;

/// Frontier entry, popped nearest first
#[derive(Clone, Copy)]
struct Candidate {
    id: usize,
    distance: f32,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .distance
            .total_cmp(&self.distance)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Result entry, popped furthest first so the beam can evict its worst
#[derive(Clone, Copy)]
struct Furthest {
    id: usize,
    distance: f32,
}

impl PartialEq for Furthest {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Furthest {}

impl Ord for Furthest {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Furthest {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn by_distance(a: &(usize, f32), b: &(usize, f32)) -> Ordering {
    a.1.total_cmp(&b.1).then(a.0.cmp(&b.0))
}

/// HNSW index owning its vectors
///
/// Node ids are dense insertion positions, so node `i` is vector `i`.
/// Distance is `1 - cosine`, reported back to callers as cosine similarity.
pub struct Hnsw {
    pub(super) dim: usize,
    pub(super) vectors: Vec<f32>,
    pub(super) nodes: Vec<Node>,
    pub(super) entry_point: Option<usize>,
    pub(super) max_layer: usize,
    /// Max neighbors on layers above 0
    pub(super) m: usize,
    /// Max neighbors on layer 0
    pub(super) m0: usize,
    /// Level multiplier, 1 / ln(m)
    ml: f64,
    pub(super) ef_construction: usize,
    pub(super) ef_search: usize,
    pub(super) seed: u64,
    rng: StdRng,
}

impl fmt::Debug for Hnsw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hnsw")
            .field("dim", &self.dim)
            .field("len", &self.nodes.len())
            .field("entry_point", &self.entry_point)
            .field("max_layer", &self.max_layer)
            .field("m", &self.m)
            .field("ef_construction", &self.ef_construction)
            .field("ef_search", &self.ef_search)
            .finish()
    }
}

impl Hnsw {
    /// Create an empty graph
    pub fn new(dim: usize, params: &IndexParams) -> Self {
        Self::from_parts(
            dim,
            Vec::new(),
            Vec::new(),
            None,
            0,
            params.max_neighbors,
            params.max_neighbors * 2,
            params.ef_construction,
            params.ef_search,
            params.seed,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub(super) fn from_parts(
        dim: usize,
        vectors: Vec<f32>,
        nodes: Vec<Node>,
        entry_point: Option<usize>,
        max_layer: usize,
        m: usize,
        m0: usize,
        ef_construction: usize,
        ef_search: usize,
        seed: u64,
    ) -> Self {
        Self {
            dim,
            vectors,
            nodes,
            entry_point,
            max_layer,
            m,
            m0,
            ml: 1.0 / (m.max(2) as f64).ln(),
            ef_construction,
            ef_search,
            seed,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    #[inline]
    fn vector_of(&self, id: usize) -> &[f32] {
        &self.vectors[id * self.dim..(id + 1) * self.dim]
    }

    #[inline]
    fn distance(&self, query: &[f32], id: usize) -> f32 {
        1.0 - cosine_similarity(query, self.vector_of(id))
    }

    fn max_degree(&self, layer: usize) -> usize {
        if layer == 0 {
            self.m0
        } else {
            self.m
        }
    }

    /// Exponentially distributed layer, capped at `MAX_LEVEL`
    fn random_layer(&mut self) -> usize {
        // 1 - [0, 1) keeps the log argument in (0, 1]
        let r: f64 = 1.0 - self.rng.gen::<f64>();
        ((-r.ln() * self.ml).floor() as usize).min(MAX_LEVEL)
    }

    /// Insert the next vector; returns its internal id
    pub fn insert(&mut self, vector: &[f32]) -> Result<usize> {
        if vector.len() != self.dim {
            return Err(RagVecError::dimension_mismatch(self.dim, vector.len()));
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(RagVecError::input_validation(format!(
                "Vector #{} contains non-finite values",
                self.nodes.len()
            )));
        }

        let id = self.nodes.len();
        let node_layer = self.random_layer();
        self.vectors.extend_from_slice(vector);
        self.nodes.push(Node::new(node_layer));

        let Some(entry_point) = self.entry_point else {
            self.entry_point = Some(id);
            self.max_layer = node_layer;
            return Ok(id);
        };

        // Greedy descent through layers the new node does not reach
        let mut current = entry_point;
        for layer in (node_layer + 1..=self.max_layer).rev() {
            if let Some(&(nearest, _)) = self.search_layer(vector, &[current], 1, layer).first() {
                current = nearest;
            }
        }

        // Wire edges from min(node_layer, max_layer) down to 0
        let mut entries = vec![current];
        for layer in (0..=node_layer.min(self.max_layer)).rev() {
            let m_layer = self.max_degree(layer);
            let candidates = self.search_layer(vector, &entries, self.ef_construction, layer);
            let selected = self.select_neighbors(&candidates, m_layer);

            self.nodes[id].set_neighbors(layer, selected.iter().map(|&(n, _)| n).collect());
            for &(neighbor, _) in &selected {
                self.nodes[neighbor].add_neighbor(layer, id);
                if self.nodes[neighbor].neighbors(layer).len() > m_layer {
                    self.shrink(neighbor, layer, m_layer);
                }
            }

            entries = candidates.into_iter().map(|(n, _)| n).collect();
        }

        if node_layer > self.max_layer {
            self.max_layer = node_layer;
            self.entry_point = Some(id);
        }

        Ok(id)
    }

    /// Re-select the edges of an over-full node
    fn shrink(&mut self, node: usize, layer: usize, m_layer: usize) {
        let base = self.vector_of(node);
        let candidates: Vec<(usize, f32)> = self.nodes[node]
            .neighbors(layer)
            .iter()
            .map(|&n| (n, 1.0 - cosine_similarity(base, self.vector_of(n))))
            .collect();

        let kept = self.select_neighbors(&candidates, m_layer);
        self.nodes[node].set_neighbors(layer, kept.into_iter().map(|(n, _)| n).collect());
    }

    /// Beam search of width `ef` on one layer; nearest first
    fn search_layer(
        &self,
        query: &[f32],
        entry_points: &[usize],
        ef: usize,
        layer: usize,
    ) -> Vec<(usize, f32)> {
        let ef = ef.max(1);
        let mut visited = vec![false; self.nodes.len()];
        let mut candidates: BinaryHeap<Candidate> = BinaryHeap::with_capacity(ef);
        let mut results: BinaryHeap<Furthest> = BinaryHeap::with_capacity(ef + 1);

        for &ep in entry_points {
            if visited[ep] {
                continue;
            }
            visited[ep] = true;
            let distance = self.distance(query, ep);
            candidates.push(Candidate { id: ep, distance });
            results.push(Furthest { id: ep, distance });
            if results.len() > ef {
                results.pop();
            }
        }

        while let Some(current) = candidates.pop() {
            if let Some(worst) = results.peek() {
                if results.len() >= ef && current.distance > worst.distance {
                    break;
                }
            }

            for &neighbor in self.nodes[current.id].neighbors(layer) {
                if visited[neighbor] {
                    continue;
                }
                visited[neighbor] = true;

                let distance = self.distance(query, neighbor);
                let admit = results.len() < ef
                    || results.peek().map_or(true, |worst| distance < worst.distance);
                if admit {
                    candidates.push(Candidate { id: neighbor, distance });
                    results.push(Furthest { id: neighbor, distance });
                    if results.len() > ef {
                        results.pop();
                    }
                }
            }
        }

        let mut out: Vec<(usize, f32)> = results.into_iter().map(|r| (r.id, r.distance)).collect();
        out.sort_by(by_distance);
        out
    }

    /// Diversity-preserving neighbor selection
    ///
    /// A candidate is kept when it is closer to the base node than to every
    /// neighbor already kept; remaining slots are filled nearest first.
    fn select_neighbors(&self, candidates: &[(usize, f32)], m: usize) -> Vec<(usize, f32)> {
        let mut sorted = candidates.to_vec();
        sorted.sort_by(by_distance);

        let mut result: Vec<(usize, f32)> = Vec::with_capacity(m);
        for &(candidate, candidate_dist) in &sorted {
            if result.len() >= m {
                break;
            }
            let candidate_vec = self.vector_of(candidate);
            let diverse = result.iter().all(|&(kept, _)| {
                1.0 - cosine_similarity(candidate_vec, self.vector_of(kept)) >= candidate_dist
            });
            if diverse {
                result.push((candidate, candidate_dist));
            }
        }

        if result.len() < m {
            for &(candidate, candidate_dist) in &sorted {
                if result.len() >= m {
                    break;
                }
                if !result.iter().any(|&(kept, _)| kept == candidate) {
                    result.push((candidate, candidate_dist));
                }
            }
        }

        result
    }

    /// Search with an explicit beam width
    pub fn search_with_ef(&self, query: &[f32], k: usize, ef: usize) -> Vec<Neighbor> {
        let Some(entry_point) = self.entry_point else {
            return Vec::new();
        };
        if k == 0 || query.len() != self.dim {
            return Vec::new();
        }
        // Neither bound can usefully exceed the graph size
        let k = k.min(self.nodes.len());
        let ef = ef.max(k).min(self.nodes.len());

        let mut current = entry_point;
        for layer in (1..=self.max_layer).rev() {
            if let Some(&(nearest, _)) = self.search_layer(query, &[current], 1, layer).first() {
                current = nearest;
            }
        }

        self.search_layer(query, &[current], ef, 0)
            .into_iter()
            .take(k)
            .map(|(id, distance)| Neighbor {
                id,
                score: (1.0 - distance).clamp(-1.0, 1.0),
            })
            .collect()
    }

    /// Longest adjacency list on a layer
    pub fn max_degree_on(&self, layer: usize) -> usize {
        self.nodes
            .iter()
            .map(|n| n.neighbors(layer).len())
            .max()
            .unwrap_or(0)
    }
}

impl AnnIndex for Hnsw {
    fn kind(&self) -> IndexKind {
        IndexKind::Hnsw
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    fn vector(&self, id: usize) -> Option<&[f32]> {
        (id < self.nodes.len()).then(|| self.vector_of(id))
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<Neighbor> {
        self.search_with_ef(query, k, self.ef_search)
    }

    fn write_to(&self, writer: &mut dyn std::io::Write) -> std::io::Result<()> {
        self.serialize(writer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragvec_embed::embed;

    fn params(m: usize) -> IndexParams {
        IndexParams {
            max_neighbors: m,
            ef_construction: 40,
            ef_search: 40,
            ..IndexParams::default()
        }
    }

    fn build(n: usize, dim: usize, m: usize) -> (Hnsw, Vec<Vec<f32>>) {
        let data: Vec<Vec<f32>> = (0..n).map(|i| embed(&format!("text {}", i), dim)).collect();
        let mut index = Hnsw::new(dim, &params(m));
        for v in &data {
            index.insert(v).unwrap();
        }
        (index, data)
    }

    #[test]
    fn test_insert_assigns_dense_ids() {
        let mut index = Hnsw::new(4, &params(4));
        for i in 0..5 {
            let id = index.insert(&embed(&i.to_string(), 4)).unwrap();
            assert_eq!(id, i);
        }
        assert_eq!(index.len(), 5);
    }

    #[test]
    fn test_empty_search() {
        let index = Hnsw::new(4, &params(4));
        assert!(index.search(&[1.0, 0.0, 0.0, 0.0], 3).is_empty());
    }

    #[test]
    fn test_self_retrieval() {
        let (index, data) = build(200, 32, 8);
        let mut found = 0;
        for (i, v) in data.iter().enumerate() {
            let hits = index.search_with_ef(v, 1, 64);
            if hits.first().map(|h| h.id) == Some(i) {
                found += 1;
            }
        }
        // Approximate, but self-recall on a small graph is effectively exact
        assert!(found >= 190, "self recall too low: {}/200", found);
    }

    #[test]
    fn test_results_sorted_and_bounded() {
        let (index, data) = build(50, 16, 6);
        let hits = index.search(&data[10], 7);
        assert_eq!(hits.len(), 7);
        for pair in hits.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert!(hits.iter().all(|h| (-1.0..=1.0).contains(&h.score)));
    }

    #[test]
    fn test_huge_k_is_capped_by_graph_size() {
        let (index, data) = build(10, 16, 4);
        for k in [usize::MAX, 1 << 40] {
            let hits = index.search(&data[0], k);
            assert_eq!(hits.len(), 10);
            assert_eq!(hits[0].id, 0);
        }
        assert_eq!(index.search_with_ef(&data[0], 3, usize::MAX).len(), 3);
    }

    #[test]
    fn test_degree_bounded() {
        let (index, _) = build(120, 16, 4);
        assert!(index.max_degree_on(0) <= 8);
        for layer in 1..=index.max_layer {
            assert!(index.max_degree_on(layer) <= 4);
        }
    }

    #[test]
    fn test_same_seed_same_graph() {
        let (a, _) = build(60, 8, 4);
        let (b, _) = build(60, 8, 4);
        assert_eq!(a.nodes, b.nodes);
        assert_eq!(a.entry_point, b.entry_point);
    }

    #[test]
    fn test_rejects_bad_vectors() {
        let mut index = Hnsw::new(2, &params(4));
        assert!(index.insert(&[1.0]).is_err());
        assert!(index.insert(&[f32::NAN, 0.0]).is_err());
        assert!(index.is_empty());
    }
}
