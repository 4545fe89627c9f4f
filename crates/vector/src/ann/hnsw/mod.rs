//! Hierarchical Navigable Small World graph
//!
//! Layer 0 holds every node; each higher layer holds an exponentially
//! thinning subset used for long-range hops. Search descends greedily from
//! the top-layer entry point, then runs a beam search of width `ef` on
//! layer 0.

mod index;
mod node;
mod serialize;

pub use index::Hnsw;
pub(super) use serialize::MAGIC;
