//! Configuration for PQL callers.
//!
//! PQL_ROOT resolution order:
//! 1. Explicit path passed to Config::with_root()
//! 2. PQL_ROOT environment variable
//! 3. Platform data directory (via `directories`)
//! 4. Default: ~/.local/share/pql

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::query::{DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};
use crate::{Error, Result};

/// PQL configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Root directory for slot files and config.toml.
    #[serde(skip)]
    pub root: PathBuf,

    /// Name of the slot holding the current query.
    #[serde(default = "default_slot")]
    pub slot: String,

    /// Maximum nesting depth accepted by the parser.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

fn default_slot() -> String {
    "filters".to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Config {
    /// Create a new config with the given root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            slot: default_slot(),
            max_depth: default_max_depth(),
        }
    }

    /// Load config from PQL_ROOT/config.toml, or create default.
    pub fn load() -> Result<Self> {
        let root = resolve_root()?;
        Self::load_from(&root)
    }

    /// Load config from a specific root.
    pub fn load_from(root: &Path) -> Result<Self> {
        let config_path = root.join("config.toml");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let mut config: Config = toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
            config.root = root.to_path_buf();
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::with_root(root))
        }
    }

    /// Save config to PQL_ROOT/config.toml.
    pub fn save(&self) -> Result<()> {
        self.validate()?;
        std::fs::create_dir_all(&self.root)?;
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(self.config_path(), contents)?;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH_LIMIT {
            return Err(Error::Config(format!(
                "max_depth must be between 1 and {}",
                MAX_DEPTH_LIMIT
            )));
        }
        if !is_valid_slot_name(&self.slot) {
            return Err(Error::Config(format!("Invalid slot name: {:?}", self.slot)));
        }
        Ok(())
    }

    /// Path to config.toml.
    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Path to the slots directory.
    pub fn slots_dir(&self) -> PathBuf {
        self.root.join("slots")
    }

    /// Path to a named slot file.
    pub fn slot_path(&self, name: &str) -> PathBuf {
        self.slots_dir().join(format!("{}.pql", name))
    }
}

/// Slot names become file names, so keep them to a safe alphabet.
pub fn is_valid_slot_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Resolve PQL_ROOT using the standard resolution order.
fn resolve_root() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("PQL_ROOT") {
        return Ok(PathBuf::from(path));
    }

    if let Some(proj_dirs) = ProjectDirs::from("", "", "pql") {
        return Ok(proj_dirs.data_dir().to_path_buf());
    }

    let home = std::env::var("HOME")
        .map_err(|_| Error::Config("Could not determine home directory".to_string()))?;
    Ok(PathBuf::from(home).join(".local/share/pql"))
}
