//! Run-scoped persistent cache.
//!
//! Expensive intermediate results (the initial partition, street networks)
//! are stored as JSON files under `<base_dir>/<run_name>/<key>.json` so that
//! re-running with the same run name skips recomputation.
//!
//! There is no locking: two processes writing the same run at once may
//! overwrite each other's entries.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::info;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::meeting_points::StreetNetwork;
use crate::{Labeling, Result};

/// Default location of the cache directory.
pub const DEFAULT_CACHE_DIR: &str = "./.data_cache";

/// Key of the cached initial partition.
pub const INITIAL_CLUSTERS_KEY: &str = "initial_clusters";

/// File-backed cache for one named run.
#[derive(Debug, Clone)]
pub struct RunCache {
    base_dir: PathBuf,
    run_name: String,
}

impl RunCache {
    /// Handle on the cache of `run_name` without touching the filesystem.
    pub fn new(base_dir: impl AsRef<Path>, run_name: &str) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            run_name: run_name.to_string(),
        }
    }

    /// Open (creating if needed) the cache directory for `run_name`.
    pub fn open(base_dir: impl AsRef<Path>, run_name: &str) -> Result<Self> {
        let cache = Self::new(base_dir, run_name);

        let run_dir = cache.run_dir();
        if !run_dir.exists() {
            info!("[Cache] Creating run folder at {}", run_dir.display());
            fs::create_dir_all(&run_dir)?;
        }
        Ok(cache)
    }

    pub fn run_name(&self) -> &str {
        &self.run_name
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn run_dir(&self) -> PathBuf {
        self.base_dir.join(&self.run_name)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.run_dir().join(format!("{}.json", key))
    }

    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let path = self.entry_path(key);
        if !path.is_file() {
            return Ok(None);
        }
        let file = File::open(&path)?;
        let value = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(value))
    }

    fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        fs::create_dir_all(self.run_dir())?;
        let file = File::create(self.entry_path(key))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, value)?;
        writer.flush()?;
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entry_path(key).is_file()
    }

    pub fn get_labeling(&self, key: &str) -> Result<Option<Labeling>> {
        self.get(key)
    }

    pub fn put_labeling(&self, key: &str, labeling: &Labeling) -> Result<()> {
        self.put(key, labeling)
    }

    pub fn get_network(&self, key: &str) -> Result<Option<StreetNetwork>> {
        self.get(key)
    }

    pub fn put_network(&self, key: &str, network: &StreetNetwork) -> Result<()> {
        self.put(key, network)
    }

    /// Remove every entry of this run. Clearing an empty run is a no-op.
    pub fn clear(&self) -> Result<()> {
        let run_dir = self.run_dir();
        if run_dir.exists() {
            info!("[Cache] Clearing run folder {}", run_dir.display());
            fs::remove_dir_all(run_dir)?;
        }
        Ok(())
    }

    /// Remove the cache of every run under `base_dir`.
    pub fn clear_all(base_dir: impl AsRef<Path>) -> Result<()> {
        let base_dir = base_dir.as_ref();
        if base_dir.exists() {
            info!("[Cache] Clearing cache folder {}", base_dir.display());
            fs::remove_dir_all(base_dir)?;
        }
        Ok(())
    }
}
