//! Named, versioned snapshots of completed runs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::engine::SimulationOutcome;

pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;
const SNAPSHOT_EXTENSION: &str = "json";

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("simulation not found: {0}")]
    NotFound(String),
    #[error("snapshot '{name}' is corrupt: {source}")]
    Corrupt {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("snapshot '{name}' has unsupported format version {version}")]
    UnsupportedVersion { name: String, version: u32 },
    #[error("snapshot name '{0}' contains no usable characters")]
    InvalidName(String),
    #[error("snapshot io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub format_version: u32,
    pub name: String,
    pub saved_at: DateTime<Utc>,
    pub outcome: SimulationOutcome,
}

#[derive(Deserialize)]
struct VersionProbe {
    format_version: u32,
}

/// A directory of `<name>.json` snapshot files.
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes `outcome` under the sanitized `name`. Names that sanitize to the
    /// same key ("mouse run", "mouse-run") share a file; the newer save
    /// replaces the older one and a warning is logged.
    pub fn save(
        &self,
        name: &str,
        outcome: &SimulationOutcome,
    ) -> Result<PathBuf, PersistenceError> {
        let key = sanitize_name(name)?;
        let snapshot = Snapshot {
            format_version: SNAPSHOT_FORMAT_VERSION,
            name: key.clone(),
            saved_at: Utc::now(),
            outcome: outcome.clone(),
        };
        let path = self.path_for(&key);
        if path.exists() {
            warn!(name = %key, requested = name, "replacing existing simulation snapshot");
        }
        let json = serde_json::to_string_pretty(&snapshot).map_err(io::Error::from)?;
        fs::write(&path, json)?;
        info!(name = %key, path = %path.display(), "saved simulation snapshot");
        Ok(path)
    }

    pub fn load(&self, name: &str) -> Result<Snapshot, PersistenceError> {
        let key = sanitize_name(name)?;
        let path = self.path_for(&key);
        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(PersistenceError::NotFound(name.to_string()))
            }
            Err(err) => return Err(err.into()),
        };
        let corrupt = |source| PersistenceError::Corrupt {
            name: key.clone(),
            source,
        };
        let probe: VersionProbe = serde_json::from_str(&data).map_err(corrupt)?;
        if probe.format_version != SNAPSHOT_FORMAT_VERSION {
            return Err(PersistenceError::UnsupportedVersion {
                name: key.clone(),
                version: probe.format_version,
            });
        }
        serde_json::from_str(&data).map_err(corrupt)
    }

    /// Names of every stored snapshot, sorted.
    pub fn list(&self) -> Result<Vec<String>, PersistenceError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(SNAPSHOT_EXTENSION)
            {
                continue;
            }
            match path.file_stem().and_then(|stem| stem.to_str()) {
                Some(stem) => names.push(stem.to_string()),
                None => warn!(path = %path.display(), "skipping snapshot with non-utf8 name"),
            }
        }
        names.sort();
        Ok(names)
    }

    /// Removes a snapshot. Returns `false` when nothing was stored under `name`.
    pub fn delete(&self, name: &str) -> Result<bool, PersistenceError> {
        let key = sanitize_name(name)?;
        match fs::remove_file(self.path_for(&key)) {
            Ok(()) => {
                info!(name = %key, "deleted simulation snapshot");
                Ok(true)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{SNAPSHOT_EXTENSION}"))
    }
}

/// Maps a display name onto a file-safe key: anything outside `[A-Za-z0-9_]`
/// becomes `_`.
pub fn sanitize_name(name: &str) -> Result<String, PersistenceError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(PersistenceError::InvalidName(name.to_string()));
    }
    Ok(trimmed
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect())
}
