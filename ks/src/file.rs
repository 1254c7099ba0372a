//! File-backed store backend shareable between processes

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::{debug, info, warn};

use crate::error::{Result, StoreError};
use crate::store::{Fields, KeyValueStore};
use crate::value::Value;

/// Store backed by a JSON document on disk
///
/// Every call takes an advisory lock on a sibling `.lock` file: shared for
/// reads, exclusive for updates. Writes go to a temp file that is renamed over
/// the document, so a reader never sees a half-written file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileStore {
    /// Open or create a store at the given path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }

        let lock_path = sibling(&path, "lock");
        debug!(?path, "Opened file store");
        Ok(Self { path, lock_path })
    }

    /// Default location under the user's local data directory
    pub fn default_path() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("crossdispatch")
            .join("store.json")
    }

    /// Path of the JSON document
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove every field
    pub fn clear(&self) -> Result<()> {
        self.with_lock(true, || self.write_fields(&Fields::new()))?;
        info!(path = %self.path.display(), "Cleared file store");
        Ok(())
    }

    fn with_lock<T>(&self, exclusive: bool, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;

        let locked = if exclusive {
            FileExt::lock_exclusive(&lock_file)
        } else {
            FileExt::lock_shared(&lock_file)
        };
        locked.map_err(|source| StoreError::Lock {
            path: self.lock_path.clone(),
            source,
        })?;

        let result = f();

        if let Err(e) = FileExt::unlock(&lock_file) {
            warn!(path = %self.lock_path.display(), error = %e, "FileStore: unlock failed, lock released on close");
        }
        result
    }

    fn read_fields(&self) -> Result<Fields> {
        if !self.path.exists() {
            return Ok(Fields::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Fields::new());
        }

        serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })
    }

    fn write_fields(&self, fields: &Fields) -> Result<()> {
        let tmp_path = sibling(&self.path, "tmp");
        let mut tmp = File::create(&tmp_path)?;
        serde_json::to_writer_pretty(&mut tmp, fields)?;
        tmp.write_all(b"\n")?;
        tmp.sync_all()?;
        drop(tmp);

        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.with_lock(false, || Ok(self.read_fields()?.remove(key)))
    }

    fn update(&self, apply: &mut dyn FnMut(&mut Fields)) -> Result<()> {
        self.with_lock(true, || {
            let mut fields = self.read_fields()?;
            let before = fields.clone();
            apply(&mut fields);
            if fields != before {
                self.write_fields(&fields)?;
                debug!(path = %self.path.display(), field_count = fields.len(), "FileStore::update: committed");
            }
            Ok(())
        })
    }

    fn snapshot(&self) -> Result<Fields> {
        self.with_lock(false, || self.read_fields())
    }

    fn get_many(&self, keys: &[&str]) -> Result<Vec<Option<Value>>> {
        self.with_lock(false, || {
            let fields = self.read_fields()?;
            Ok(keys.iter().map(|key| fields.get(*key).cloned()).collect())
        })
    }
}

/// `store.json` -> `store.json.<ext>`
fn sibling(path: &Path, ext: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}
