use std::io::{self, Read, Write};

use super::index::MAX_LEVEL;
use super::node::Node;
use super::Hnsw;
use crate::ann::codec::{
    invalid, read_f32s, read_u32, read_u64, read_u8, write_f32s, write_len, write_u32, write_u64,
    write_u8,
};

pub(crate) const MAGIC: &[u8; 8] = b"RVGHNSW1";

const NO_ENTRY: u32 = u32::MAX;

impl Hnsw {
    /// Serialize the graph and its vectors
    ///
    /// Format (little-endian):
    /// - Magic: "RVGHNSW1" (8 bytes)
    /// - Header: dim u32, count u32, entry u32 (u32::MAX if none),
    ///   max_layer u8, m u32, m0 u32, ef_construction u32, ef_search u32,
    ///   seed u64
    /// - Vectors: count * dim f32, in internal id order
    /// - Nodes, in internal id order:
    ///   - top layer u8
    ///   - per layer 0..=top: neighbor count u32, neighbors [u32]
    pub fn serialize(&self, writer: &mut dyn Write) -> io::Result<()> {
        writer.write_all(MAGIC)?;
        write_len(writer, self.dim)?;
        write_len(writer, self.nodes.len())?;
        match self.entry_point {
            Some(ep) => write_len(writer, ep)?,
            None => write_u32(writer, NO_ENTRY)?,
        }
        write_u8(writer, self.max_layer as u8)?;
        write_len(writer, self.m)?;
        write_len(writer, self.m0)?;
        write_len(writer, self.ef_construction)?;
        write_len(writer, self.ef_search)?;
        write_u64(writer, self.seed)?;

        write_f32s(writer, &self.vectors)?;

        for node in &self.nodes {
            write_u8(writer, node.max_layer() as u8)?;
            for neighbors in &node.layers {
                write_len(writer, neighbors.len())?;
                for &neighbor in neighbors {
                    write_len(writer, neighbor)?;
                }
            }
        }

        Ok(())
    }

    /// Read everything after the magic, validating graph references
    pub(crate) fn read_body<R: Read>(reader: &mut R) -> io::Result<Self> {
        let dim = read_u32(reader)? as usize;
        let count = read_u32(reader)? as usize;
        let entry_raw = read_u32(reader)?;
        let max_layer = read_u8(reader)? as usize;
        let m = read_u32(reader)? as usize;
        let m0 = read_u32(reader)? as usize;
        let ef_construction = read_u32(reader)? as usize;
        let ef_search = read_u32(reader)? as usize;
        let seed = read_u64(reader)?;

        if max_layer > MAX_LEVEL {
            return Err(invalid(format!("Graph max layer {} out of range", max_layer)));
        }
        if m < 2 || m0 < m {
            return Err(invalid("Invalid neighbor limits"));
        }
        if count > 0 && dim == 0 {
            return Err(invalid("Zero dimension with non-empty graph"));
        }

        let entry_point = match (entry_raw, count) {
            (NO_ENTRY, 0) => None,
            (NO_ENTRY, _) => return Err(invalid("Missing entry point")),
            (_, 0) => return Err(invalid("Entry point in empty graph")),
            (ep, _) if (ep as usize) < count => Some(ep as usize),
            (ep, _) => return Err(invalid(format!("Entry point {} out of range", ep))),
        };

        let total = dim
            .checked_mul(count)
            .ok_or_else(|| invalid("Vector block too large"))?;
        let vectors = read_f32s(reader, total)?;

        let mut nodes = Vec::with_capacity(count.min(1 << 20));
        for id in 0..count {
            let top = read_u8(reader)? as usize;
            if top > max_layer {
                return Err(invalid(format!("Node {} above graph max layer", id)));
            }

            let mut layers = Vec::with_capacity(top + 1);
            for _ in 0..=top {
                let degree = read_u32(reader)? as usize;
                let mut neighbors = Vec::with_capacity(degree.min(m0));
                for _ in 0..degree {
                    let neighbor = read_u32(reader)? as usize;
                    if neighbor >= count {
                        return Err(invalid(format!(
                            "Node {} links to unknown node {}",
                            id, neighbor
                        )));
                    }
                    neighbors.push(neighbor);
                }
                layers.push(neighbors);
            }
            nodes.push(Node { layers });
        }

        if let Some(ep) = entry_point {
            if nodes[ep].max_layer() != max_layer {
                return Err(invalid("Entry point is not on the top layer"));
            }
        }

        Ok(Hnsw::from_parts(
            dim,
            vectors,
            nodes,
            entry_point,
            max_layer,
            m,
            m0,
            ef_construction,
            ef_search,
            seed,
        ))
    }
}
