use ragvec_common::{RagVecError, Result};
use ragvec_embed::EmbedderMetadata;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{BufReader, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ann::{index_to_bytes, read_index, AnnIndex};
use crate::ledger::IntegrityRecord;
use crate::types::IdMapEntry;

pub const INDEX_FILE: &str = "index.bin";
pub const ID_MAP_FILE: &str = "id_map.json";
pub const METADATA_FILE: &str = "embedder_metadata.json";
pub const LEDGER_FILE: &str = "integrity_ledger.json";

/// Every file a published version must contain
pub const REQUIRED_FILES: [&str; 4] = [INDEX_FILE, ID_MAP_FILE, METADATA_FILE, LEDGER_FILE];

/// Pointer file naming the active version
pub const CURRENT_FILE: &str = "CURRENT";

const STAGING_PREFIX: &str = ".staging-";

/// One version read back from disk, checked for internal consistency
#[derive(Debug)]
pub struct LoadedArtifact {
    pub index: Box<dyn AnnIndex>,
    pub id_map: Vec<IdMapEntry>,
    pub metadata: EmbedderMetadata,
    pub ledger: Vec<IntegrityRecord>,
}

/// Directory of immutable artifact versions
///
/// ```text
/// <root>/
///   CURRENT                  active version name
///   v1/                      one published version
///     index.bin
///     id_map.json
///     embedder_metadata.json
///     integrity_ledger.json
///   .staging-v2-<uuid>/      in-progress publish, never listed or loaded
/// ```
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    root: PathBuf,
}

impl ArtifactStore {
    /// Create store rooted at `root` (created lazily on publish)
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of a specific version
    pub fn version_dir(&self, version: &str) -> PathBuf {
        self.root.join(version)
    }

    /// Version names become directory names; keep them to a safe alphabet
    pub fn validate_version(version: &str) -> Result<()> {
        let valid = !version.is_empty()
            && version.len() <= 128
            && !version.starts_with('.')
            && version
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));

        if valid {
            Ok(())
        } else {
            Err(RagVecError::input_validation(format!(
                "Invalid version id: {:?}",
                version
            )))
        }
    }

    /// Whether a version directory has been published
    pub fn exists(&self, version: &str) -> bool {
        Self::validate_version(version).is_ok() && self.version_dir(version).is_dir()
    }

    /// Publish all four artifacts of a version atomically
    ///
    /// Files are written and synced into a staging directory, then the
    /// directory is renamed into place. Readers see the whole version or
    /// nothing; a failed publish leaves no trace.
    pub fn publish(
        &self,
        version: &str,
        index: &dyn AnnIndex,
        id_map: &[IdMapEntry],
        metadata: &EmbedderMetadata,
        ledger: &[IntegrityRecord],
    ) -> Result<()> {
        Self::validate_version(version)?;
        check_bundle(index, id_map, metadata, ledger).map_err(|reason| {
            RagVecError::input_validation(format!("Inconsistent bundle: {}", reason))
        })?;

        let target = self.version_dir(version);
        if target.exists() {
            return Err(RagVecError::input_validation(format!(
                "Version {} is already published",
                version
            )));
        }

        fs::create_dir_all(&self.root)?;
        let staging = self
            .root
            .join(format!("{}{}-{}", STAGING_PREFIX, version, Uuid::new_v4()));
        fs::create_dir(&staging)?;
        debug!("Staging version {} in {}", version, staging.display());

        let staged = write_staged(&staging, index, id_map, metadata, ledger)
            .and_then(|_| fs::rename(&staging, &target).map_err(RagVecError::from));

        if let Err(e) = staged {
            warn!("Publish of version {} failed, discarding staging: {}", version, e);
            if let Err(cleanup) = fs::remove_dir_all(&staging) {
                warn!("Failed to remove {}: {}", staging.display(), cleanup);
            }
            return Err(e);
        }
        sync_dir(&self.root)?;

        info!(
            "Published version {} - {} vectors, dim {}",
            version,
            id_map.len(),
            metadata.dim
        );
        Ok(())
    }

    /// Load index, id map, metadata and ledger of a version
    ///
    /// Missing files give `ArtifactNotFound`; unparsable or mutually
    /// inconsistent files give `CorruptArtifact`.
    pub fn load(&self, version: &str) -> Result<LoadedArtifact> {
        Self::validate_version(version)?;
        self.require_files(version)?;
        let dir = self.version_dir(version);

        let index = {
            let file = fs::File::open(dir.join(INDEX_FILE))?;
            let mut reader = BufReader::new(file);
            let index = read_index(&mut reader).map_err(|e| {
                RagVecError::corrupt_artifact(version, INDEX_FILE, e.to_string())
            })?;
            let mut trailing = [0u8; 1];
            if reader.read(&mut trailing)? != 0 {
                return Err(RagVecError::corrupt_artifact(
                    version,
                    INDEX_FILE,
                    "trailing bytes after index",
                ));
            }
            index
        };

        let id_map: Vec<IdMapEntry> = read_json(&dir, version, ID_MAP_FILE)?;
        let metadata: EmbedderMetadata = read_json(&dir, version, METADATA_FILE)?;
        let ledger: Vec<IntegrityRecord> = read_json(&dir, version, LEDGER_FILE)?;

        if let Err((artifact, reason)) = check_loaded(index.as_ref(), &id_map, &metadata, &ledger) {
            return Err(RagVecError::corrupt_artifact(version, artifact, reason));
        }

        debug!(
            "Loaded version {} - {} vectors, dim {}",
            version,
            id_map.len(),
            metadata.dim
        );

        Ok(LoadedArtifact {
            index,
            id_map,
            metadata,
            ledger,
        })
    }

    /// Read only the integrity ledger of a version
    pub fn load_ledger(&self, version: &str) -> Result<Vec<IntegrityRecord>> {
        Self::validate_version(version)?;
        let path = self.version_dir(version).join(LEDGER_FILE);
        if !path.is_file() {
            return Err(RagVecError::artifact_not_found(version, LEDGER_FILE));
        }
        read_json(&self.version_dir(version), version, LEDGER_FILE)
    }

    /// Published versions, sorted by name
    pub fn list_versions(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let mut versions = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if Self::validate_version(name).is_ok() {
                    versions.push(name.to_string());
                }
            }
        }

        versions.sort();
        Ok(versions)
    }

    /// Point CURRENT at a published version (also used for rollback)
    pub fn activate(&self, version: &str) -> Result<()> {
        Self::validate_version(version)?;
        self.require_files(version)?;

        let tmp = self.root.join(format!(".{}-{}", CURRENT_FILE, Uuid::new_v4()));
        let written = write_synced(&tmp, format!("{}\n", version).as_bytes()).and_then(|_| {
            fs::rename(&tmp, self.root.join(CURRENT_FILE)).map_err(RagVecError::from)
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp);
            return Err(e);
        }
        sync_dir(&self.root)?;

        info!("Activated version {}", version);
        Ok(())
    }

    /// Version named by CURRENT, if any
    pub fn current(&self) -> Result<Option<String>> {
        let path = self.root.join(CURRENT_FILE);
        if !path.exists() {
            return Ok(None);
        }

        let version = fs::read_to_string(&path)?.trim().to_string();
        if version.is_empty() {
            return Ok(None);
        }
        Self::validate_version(&version)?;
        Ok(Some(version))
    }

    fn require_files(&self, version: &str) -> Result<()> {
        let dir = self.version_dir(version);
        if !dir.is_dir() {
            return Err(RagVecError::artifact_not_found(version, "(version directory)"));
        }
        for file in REQUIRED_FILES {
            if !dir.join(file).is_file() {
                return Err(RagVecError::artifact_not_found(version, file));
            }
        }
        Ok(())
    }
}

fn write_staged(
    staging: &Path,
    index: &dyn AnnIndex,
    id_map: &[IdMapEntry],
    metadata: &EmbedderMetadata,
    ledger: &[IntegrityRecord],
) -> Result<()> {
    write_synced(&staging.join(INDEX_FILE), &index_to_bytes(index)?)?;
    write_synced(&staging.join(ID_MAP_FILE), &serde_json::to_vec_pretty(id_map)?)?;
    write_synced(&staging.join(METADATA_FILE), &serde_json::to_vec_pretty(metadata)?)?;
    write_synced(&staging.join(LEDGER_FILE), &serde_json::to_vec_pretty(ledger)?)?;
    sync_dir(staging)
}

fn write_synced(path: &Path, data: &[u8]) -> Result<()> {
    let mut file = fs::File::create(path)?;
    file.write_all(data)?;
    file.sync_all()?;
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}

fn read_json<T: DeserializeOwned>(dir: &Path, version: &str, file: &str) -> Result<T> {
    let data = fs::read(dir.join(file))?;
    serde_json::from_slice(&data)
        .map_err(|e| RagVecError::corrupt_artifact(version, file, e.to_string()))
}

/// Shared consistency rules for a version's four artifacts
fn check_bundle(
    index: &dyn AnnIndex,
    id_map: &[IdMapEntry],
    metadata: &EmbedderMetadata,
    ledger: &[IntegrityRecord],
) -> std::result::Result<(), String> {
    check_loaded(index, id_map, metadata, ledger).map_err(|(artifact, reason)| {
        format!("{}: {}", artifact, reason)
    })
}

fn check_loaded(
    index: &dyn AnnIndex,
    id_map: &[IdMapEntry],
    metadata: &EmbedderMetadata,
    ledger: &[IntegrityRecord],
) -> std::result::Result<(), (&'static str, String)> {
    if id_map.len() != index.len() {
        return Err((
            ID_MAP_FILE,
            format!("{} entries but index holds {} vectors", id_map.len(), index.len()),
        ));
    }
    if let Some((pos, entry)) = id_map
        .iter()
        .enumerate()
        .find(|(pos, entry)| entry.internal_id != *pos)
    {
        return Err((
            ID_MAP_FILE,
            format!("entry {} has internal_id {}", pos, entry.internal_id),
        ));
    }
    if metadata.dim != index.dim() {
        return Err((
            METADATA_FILE,
            format!("dim {} but index dim is {}", metadata.dim, index.dim()),
        ));
    }
    if ledger.len() != id_map.len() {
        return Err((
            LEDGER_FILE,
            format!("{} records for {} id map entries", ledger.len(), id_map.len()),
        ));
    }
    for (pos, (record, entry)) in ledger.iter().zip(id_map).enumerate() {
        if record.embedder_version != metadata.version {
            return Err((
                LEDGER_FILE,
                format!(
                    "record {} has embedder version {}, metadata has {}",
                    pos, record.embedder_version, metadata.version
                ),
            ));
        }
        if record.chunk_id != entry.chunk_id || record.doc_id != entry.doc_id {
            return Err((
                LEDGER_FILE,
                format!("record {} does not match id map entry {}", pos, entry.chunk_id),
            ));
        }
    }
    Ok(())
}
