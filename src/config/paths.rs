//! Per-user directories Kamek reads and writes.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::loader::CONFIG_DIR_NAME;

/// Resolved application directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub cache_dir: PathBuf,
    pub data_dir: PathBuf,
}

impl AppPaths {
    /// Platform directories from `dirs`, falling back to `~/.kamek`.
    pub fn discover() -> Self {
        let fallback = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(format!(".{}", CONFIG_DIR_NAME));
        let under = |base: Option<PathBuf>, leaf: &str| {
            base.map(|b| b.join(CONFIG_DIR_NAME))
                .unwrap_or_else(|| fallback.join(leaf))
        };

        Self {
            config_dir: under(dirs::config_dir(), "config"),
            cache_dir: under(dirs::cache_dir(), "cache"),
            data_dir: under(dirs::data_local_dir(), "data"),
        }
    }

    /// All directories under one root (tests, portable installs).
    pub fn rooted(root: &Path) -> Self {
        Self {
            config_dir: root.join("config"),
            cache_dir: root.join("cache"),
            data_dir: root.join("data"),
        }
    }

    pub fn downloads_dir(&self) -> PathBuf {
        self.cache_dir.join("downloads")
    }

    pub fn tools_dir(&self) -> PathBuf {
        self.data_dir.join("tools")
    }

    pub fn game_sources_dir(&self) -> PathBuf {
        self.data_dir.join("game_sources")
    }

    pub fn modules_dir(&self) -> PathBuf {
        self.data_dir.join("modules")
    }

    pub fn build_output_dir(&self) -> PathBuf {
        self.data_dir.join("build_output")
    }

    /// Create every directory that does not exist yet.
    pub fn ensure_dirs(&self) -> io::Result<()> {
        for dir in [
            self.config_dir.clone(),
            self.downloads_dir(),
            self.tools_dir(),
            self.game_sources_dir(),
            self.modules_dir(),
            self.build_output_dir(),
        ] {
            fs::create_dir_all(&dir)?;
        }
        Ok(())
    }
}
