//! Main JsonKv store implementation.

mod arithmetic;
mod collections;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::document;
use crate::error::{JsonKvError, Result};
use crate::value::{Object, Value};

pub use arithmetic::Operation;

/// File used by [`JsonKv::open_default`], relative to the working directory.
pub const DEFAULT_PATH: &str = "database.json";

/// A persistent key-value store backed by a single JSON document.
///
/// Every mutation rewrites the whole document before returning, so an `Ok`
/// from a mutating call means the change is on disk. Reads only look at the
/// in-memory map.
pub struct JsonKv {
    path: PathBuf,
    data: Object,
    backup_path: Option<PathBuf>,
}

impl JsonKv {
    /// Open the store at the given file path.
    ///
    /// A missing file gives an empty store; the file is created by the first
    /// mutation. A file that exists but cannot be parsed is an error.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = resolve(path.as_ref())?;
        let data = match fs::read_to_string(&path) {
            Ok(contents) => document::parse(&path, &contents)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no document yet, starting empty");
                Object::new()
            }
            Err(e) => return Err(JsonKvError::file(path, e)),
        };

        Ok(Self {
            path,
            data,
            backup_path: None,
        })
    }

    /// Open the store at [`DEFAULT_PATH`].
    pub fn open_default() -> Result<Self> {
        Self::open(DEFAULT_PATH)
    }

    /// Records a backup location used by [`JsonKv::restore_backup`].
    ///
    /// The path is made absolute against the current working directory.
    pub fn with_backup<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        self.backup_path = Some(resolve(path.as_ref())?);
        Ok(self)
    }

    /// Absolute path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Absolute path of the recorded backup location, if any.
    pub fn backup_path(&self) -> Option<&Path> {
        self.backup_path.as_deref()
    }

    /// Replaces the in-memory map with the contents of the backing document.
    ///
    /// Unlike [`JsonKv::open`], a missing file is an error here.
    pub fn load(&mut self) -> Result<()> {
        self.data = document::read(&self.path)?;
        Ok(())
    }

    /// Writes the full in-memory map to the backing document.
    pub fn save(&self) -> Result<()> {
        document::write(&self.path, &self.data)
    }

    /// Applies `apply` to the map and persists the result.
    ///
    /// If `apply` fails or the document cannot be written, the map is put back
    /// the way it was so memory never runs ahead of disk.
    fn mutate<R>(&mut self, apply: impl FnOnce(&mut Object) -> Result<R>) -> Result<R> {
        let previous = self.data.clone();
        let outcome = match apply(&mut self.data) {
            Ok(outcome) => outcome,
            Err(e) => {
                self.data = previous;
                return Err(e);
            }
        };

        if let Err(e) = self.save() {
            warn!(path = %self.path.display(), error = %e, "save failed, rolled back in-memory change");
            self.data = previous;
            return Err(e);
        }
        Ok(outcome)
    }

    /// Inserts or overwrites a key.
    ///
    /// Values containing a null (including `None`) or a non-finite number are
    /// rejected with [`JsonKvError::InvalidValue`].
    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> Result<()> {
        let value = Value::from_serialize(value)?;
        self.mutate(|data| {
            data.insert(key.to_string(), value);
            Ok(())
        })
    }

    /// Returns the value stored under `key`, if any.
    pub fn fetch(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns the value stored under `key` decoded as `T`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.fetch(key).map(|value| value.decode::<T>()).transpose()
    }

    /// Returns true if `key` is present.
    pub fn has(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Removes a key from the store. Returns whether the key was present.
    pub fn remove(&mut self, key: &str) -> Result<bool> {
        self.mutate(|data| Ok(data.shift_remove(key).is_some()))
    }

    /// Removes every key starting with `prefix` and saves once.
    pub fn delete_each(&mut self, prefix: &str) -> Result<usize> {
        self.mutate(|data| {
            let before = data.len();
            data.retain(|key, _| !key.starts_with(prefix));
            Ok(before - data.len())
        })
    }

    /// Removes all entries.
    pub fn clear(&mut self) -> Result<()> {
        self.mutate(|data| {
            data.clear();
            Ok(())
        })
    }

    /// Deletes the backing document and empties the store.
    ///
    /// The store stays usable; the next mutation writes a fresh document.
    pub fn destroy(&mut self) -> Result<()> {
        fs::remove_file(&self.path).map_err(|e| JsonKvError::file(&self.path, e))?;
        self.data.clear();
        info!(path = %self.path.display(), "destroyed document");
        Ok(())
    }

    /// All keys in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    /// All values in key insertion order.
    pub fn values(&self) -> Vec<&Value> {
        self.data.values().collect()
    }

    /// Key/value pairs in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.data.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys starting with `prefix`, in insertion order.
    pub fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.data
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Writes the current map to `path`, remembers it as the backup location.
    pub fn set_backup<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = resolve(path.as_ref())?;
        self.create_backup(&path)?;
        self.backup_path = Some(path);
        Ok(())
    }

    /// Writes the current map to `path` without touching the primary document.
    pub fn create_backup<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        document::write(path, &self.data)?;
        debug!(backup = %path.display(), keys = self.data.len(), "created backup");
        Ok(())
    }

    /// Replaces the store's contents with the document at `path` and saves.
    pub fn load_backup<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let restored = document::read(path)?;
        self.mutate(|data| {
            *data = restored;
            Ok(())
        })?;
        info!(backup = %path.display(), keys = self.data.len(), "restored backup");
        Ok(())
    }

    /// [`JsonKv::load_backup`] from the recorded backup location.
    pub fn restore_backup(&mut self) -> Result<()> {
        let path = self
            .backup_path
            .clone()
            .ok_or_else(|| JsonKvError::InvalidValue("no backup path configured".to_string()))?;
        self.load_backup(path)
    }
}

fn resolve(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(JsonKvError::InvalidValue("store path must not be empty".to_string()));
    }
    std::path::absolute(path).map_err(|e| JsonKvError::file(path, e))
}
