//! File-backed query slot.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::trace;

use super::{atomic, QuerySlot};
use crate::{Config, Result};

/// Stores the current query text in a single file. A missing file is the empty query.
#[derive(Debug, Clone)]
pub struct FileSlot {
    path: PathBuf,
}

impl FileSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The slot named in `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.slot_path(&config.slot))
    }

    /// A named slot under `config`'s root.
    pub fn named(config: &Config, name: &str) -> Self {
        Self::new(config.slot_path(name))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the slot file, returning it to the empty query.
    pub fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

impl QuerySlot for FileSlot {
    fn load_current(&self) -> Result<String> {
        trace!("Loading query slot {}", self.path.display());
        match fs::read_to_string(&self.path) {
            Ok(text) => Ok(text.trim().to_string()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(String::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save_current(&mut self, text: &str) -> Result<()> {
        trace!("Saving query slot {}", self.path.display());
        atomic::replace_file(&self.path, text.as_bytes())?;
        Ok(())
    }
}
