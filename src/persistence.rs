//! File-backed promotion slot.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::domain::aggregates::PromotionState;
use crate::store::LocalStore;
use crate::{PromotionError, Result};

/// Stores the promotion as one JSON document, `<dir>/<key>.json`.
///
/// Saves go through a sibling temp file and a rename, so a crash mid-write
/// leaves the previous record in place.
#[derive(Clone, Debug)]
pub struct FileLocalStore {
    path: PathBuf,
}

impl FileLocalStore {
    pub fn new(dir: impl AsRef<Path>, key: &str) -> Self {
        Self { path: dir.as_ref().join(format!("{key}.json")) }
    }

    pub fn path(&self) -> &Path { &self.path }

    fn temp_path(&self) -> PathBuf { self.path.with_extension("json.tmp") }
}

impl LocalStore for FileLocalStore {
    fn load(&self) -> Result<Option<PromotionState>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| PromotionError::Corrupt(format!("{}: {e}", self.path.display())))
    }

    fn save(&self, state: &PromotionState) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = self.temp_path();
        fs::write(&tmp, serde_json::to_vec_pretty(state)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(e) if e.kind() != ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}
