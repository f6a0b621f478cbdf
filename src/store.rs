//! Progress persistence.
//!
//! The whole [`Library`] is written as one JSON document wrapped in a
//! versioned envelope:
//!
//! ```text
//! { "version": 1, "saved_at": "<rfc3339>", "library": { "series": [...] } }
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::model::Library;
use crate::paths::{store_file_path, store_temp_file_path};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read progress file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("progress file {path} is not valid: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("progress file {path} has schema version {found}, expected {supported}")]
    UnsupportedVersion {
        path: PathBuf,
        found: u32,
        supported: u32,
    },

    #[error("progress file {path} holds an invalid position for '{series}'")]
    Invalid { path: PathBuf, series: String },

    #[error("failed to encode progress: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write progress file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
}

/// A library restored from disk together with its save time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub library: Library,
    pub saved_at: DateTime<Utc>,
}

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    library: &'a Library,
}

#[derive(Deserialize)]
struct Envelope {
    saved_at: DateTime<Utc>,
    library: Library,
}

#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

#[derive(Debug, Clone)]
pub struct ProgressStore {
    data_dir: PathBuf,
}

impl ProgressStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        store_file_path(&self.data_dir)
    }

    /// `Ok(None)` means nothing has been saved yet.
    pub fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let path = self.path();
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no progress file yet");
                return Ok(None);
            }
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        decode(&path, &raw).map(Some)
    }

    /// Overwrites the progress file with `library` and returns the save time.
    pub fn save(&self, library: &Library) -> Result<DateTime<Utc>, StoreError> {
        let saved_at = Utc::now();
        let body = serde_json::to_string_pretty(&EnvelopeRef {
            version: SCHEMA_VERSION,
            saved_at,
            library,
        })?;

        fs::create_dir_all(&self.data_dir).map_err(|source| StoreError::Write {
            path: self.data_dir.clone(),
            source,
        })?;
        let path = self.path();
        let temp = store_temp_file_path(&self.data_dir);
        write_replace(&temp, &path, body.as_bytes())?;
        info!(path = %path.display(), series = library.len(), "progress saved");
        Ok(saved_at)
    }
}

fn write_replace(temp: &Path, path: &Path, body: &[u8]) -> Result<(), StoreError> {
    if let Err(source) = fs::write(temp, body) {
        let _ = fs::remove_file(temp);
        return Err(StoreError::Write {
            path: temp.to_path_buf(),
            source,
        });
    }
    if let Err(source) = fs::rename(temp, path) {
        let _ = fs::remove_file(temp);
        return Err(StoreError::Write {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

fn decode(path: &Path, raw: &str) -> Result<Snapshot, StoreError> {
    let probe: VersionProbe = serde_json::from_str(raw).map_err(|source| StoreError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    if probe.version != SCHEMA_VERSION {
        return Err(StoreError::UnsupportedVersion {
            path: path.to_path_buf(),
            found: probe.version,
            supported: SCHEMA_VERSION,
        });
    }

    let envelope: Envelope = serde_json::from_str(raw).map_err(|source| StoreError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    if let Some(series) = envelope.library.find_inconsistent() {
        return Err(StoreError::Invalid {
            path: path.to_path_buf(),
            series: series.name.clone(),
        });
    }
    Ok(Snapshot {
        library: envelope.library,
        saved_at: envelope.saved_at,
    })
}
