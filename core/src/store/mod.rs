//! Cache Store: small JSON and text files in the state directory.
//!
//! RULE: Only the store touches the state directory.
//! Subsystems call store methods, they never open files directly.
//!
//! Reads are forgiving: a missing or corrupt cache yields the empty default
//! with a warning. Writes go through a temp file + rename so a crash never
//! leaves a half-written cache behind.

mod ledger;
mod roster;
mod rotation;

use crate::{config::StateFilesConfig, error::{DeskError, DeskResult}};
use serde::{de::DeserializeOwned, Serialize};
use std::path::{Path, PathBuf};

pub struct DeskStore {
    dir:   PathBuf,
    files: StateFilesConfig,
}

impl DeskStore {
    /// Open (or create) the state directory at `dir`.
    pub fn open(dir: impl Into<PathBuf>, files: StateFilesConfig) -> DeskResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| DeskError::io(&dir, e))?;
        Ok(Self { dir, files })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.join(name)
    }

    fn read_json<T: DeserializeOwned + Default>(&self, name: &str) -> T {
        let path = self.path(name);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("Cache {} not found; using empty default", path.display());
                return T::default();
            }
            Err(e) => {
                log::warn!("Cannot read cache {}: {e}; using empty default", path.display());
                return T::default();
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => value,
            Err(e) => {
                log::warn!("Corrupt cache {}: {e}; using empty default", path.display());
                T::default()
            }
        }
    }

    fn write_json<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> DeskResult<()> {
        let json = serde_json::to_string_pretty(value)?;
        self.write_text(name, &json)
    }

    fn read_text(&self, name: &str) -> Option<String> {
        let path = self.path(name);
        match std::fs::read_to_string(&path) {
            Ok(content) => Some(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                log::warn!("Cannot read {}: {e}", path.display());
                None
            }
        }
    }

    fn write_text(&self, name: &str, content: &str) -> DeskResult<()> {
        let path = self.path(name);
        let tmp = self.path(&format!("{name}.tmp"));
        std::fs::write(&tmp, content).map_err(|e| DeskError::io(&tmp, e))?;
        std::fs::rename(&tmp, &path).map_err(|e| DeskError::io(&path, e))?;
        Ok(())
    }
}
