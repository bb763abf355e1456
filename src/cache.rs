use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{NormalizedPath, Workaround};

/// Default name of the scan cache file
pub const CACHE_FILE_NAME: &str = ".workaround-tracker-cache.json";

/// Workarounds found in one file at a point in time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileScanCache {
    pub workarounds: Vec<Workaround>,

    /// Seconds since the Unix epoch when the file was scanned
    pub timestamp: f64,
}

impl FileScanCache {
    /// An entry is fresh when it was recorded no earlier than the file's last modification
    pub fn is_fresh(&self, last_modified: f64) -> bool {
        self.timestamp >= last_modified
    }
}

/// Scan results keyed by file, persisted between runs
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanCache {
    #[serde(default)]
    pub files: BTreeMap<NormalizedPath, FileScanCache>,
}

impl ScanCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(contents: &str, origin: &Path) -> Result<Self> {
        serde_json::from_str(contents).map_err(|source| Error::CacheParse {
            path: origin.to_path_buf(),
            source,
        })
    }

    pub fn to_json_string(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json_str(&contents, path)
    }

    /// Read the cache file if it exists, otherwise start empty
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            debug!(path = %path.display(), "reading scan cache");
            Self::from_json_file(path)
        } else {
            debug!(path = %path.display(), "no scan cache yet");
            Ok(Self::new())
        }
    }

    pub fn write_to_json_file(&self, path: &Path) -> Result<()> {
        let contents = self
            .to_json_string()
            .map_err(|e| Error::io(path, std::io::Error::other(e)))?;
        fs::write(path, contents).map_err(|e| Error::io(path, e))
    }

    pub fn get(&self, path: &NormalizedPath) -> Option<&FileScanCache> {
        self.files.get(path)
    }

    pub fn insert(&mut self, path: NormalizedPath, entry: FileScanCache) {
        self.files.insert(path, entry);
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Convert a point in time to cache timestamp seconds (microsecond resolution)
pub fn to_timestamp(time: DateTime<Utc>) -> f64 {
    time.timestamp_micros() as f64 / 1_000_000.0
}

pub fn now_timestamp() -> f64 {
    to_timestamp(Utc::now())
}

/// Last-modified time of a file as cache timestamp seconds
pub fn modified_timestamp(path: &Path) -> Result<f64> {
    let modified: SystemTime = fs::metadata(path)
        .and_then(|metadata| metadata.modified())
        .map_err(|e| Error::io(path, e))?;
    Ok(to_timestamp(DateTime::<Utc>::from(modified)))
}
