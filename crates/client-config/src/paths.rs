//! Filesystem locations for client state.

use crate::ConfigResult;
use std::path::{Path, PathBuf};

const APP_DIR: &str = ".gatewell";

/// Base directory resolution for config files.
#[derive(Debug, Clone)]
pub struct Paths {
    base_dir: PathBuf,
}

impl Paths {
    /// `$GATEWELL_CONFIG_DIR` if set, otherwise `~/.gatewell`, otherwise
    /// the current directory.
    pub fn new() -> Self {
        let base_dir = std::env::var_os("GATEWELL_CONFIG_DIR")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(APP_DIR)))
            .unwrap_or_else(|| PathBuf::from("."));
        Self { base_dir }
    }

    pub fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn config_file(&self) -> PathBuf {
        self.base_dir.join("config.json")
    }

    pub fn ensure_dirs(&self) -> ConfigResult<()> {
        std::fs::create_dir_all(&self.base_dir)?;
        Ok(())
    }
}

impl Default for Paths {
    fn default() -> Self {
        Self::new()
    }
}
