use ragvec_common::{RagVecError, Result};
use std::collections::HashSet;
use std::io::BufRead;
use std::path::Path;
use tracing::info;

use crate::types::Chunk;

/// Read a JSON-lines corpus file, one `{chunk_id, doc_id, text}` per line
pub fn read_corpus(path: &Path) -> Result<Vec<Chunk>> {
    let file = std::fs::File::open(path).map_err(|e| {
        RagVecError::input_validation(format!(
            "Failed to open corpus {}: {}",
            path.display(),
            e
        ))
    })?;
    let chunks = parse_corpus(std::io::BufReader::new(file))?;

    info!("Corpus loaded: {} chunks from {}", chunks.len(), path.display());
    Ok(chunks)
}

/// Parse JSON-lines records; blank lines are skipped
pub fn parse_corpus<R: BufRead>(reader: R) -> Result<Vec<Chunk>> {
    let mut chunks = Vec::new();

    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let chunk: Chunk = serde_json::from_str(&line).map_err(|e| {
            RagVecError::input_validation(format!("Corpus line {}: {}", idx + 1, e))
        })?;
        chunks.push(chunk);
    }

    Ok(chunks)
}

/// Reject corpora the builder cannot index consistently
///
/// Requires at least one chunk, non-empty identifiers and unique chunk ids.
pub fn validate_chunks(chunks: &[Chunk]) -> Result<()> {
    if chunks.is_empty() {
        return Err(RagVecError::input_validation("Corpus is empty"));
    }

    let mut seen = HashSet::with_capacity(chunks.len());
    for (position, chunk) in chunks.iter().enumerate() {
        if chunk.chunk_id.trim().is_empty() {
            return Err(RagVecError::input_validation(format!(
                "Chunk #{} has an empty chunk_id",
                position + 1
            )));
        }
        if chunk.doc_id.trim().is_empty() {
            return Err(RagVecError::input_validation(format!(
                "Chunk {} has an empty doc_id",
                chunk.chunk_id
            )));
        }
        if !seen.insert(chunk.chunk_id.as_str()) {
            return Err(RagVecError::input_validation(format!(
                "Duplicate chunk_id: {}",
                chunk.chunk_id
            )));
        }
    }

    Ok(())
}
