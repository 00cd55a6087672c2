//! Application paths management.

use directories::ProjectDirs;
use std::path::{Path, PathBuf};

/// Manages all application paths following platform conventions.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub config_file: PathBuf,
    pub database_file: PathBuf,
}

impl AppPaths {
    /// Create paths using platform-specific directories.
    pub fn new() -> Option<Self> {
        let proj_dirs = ProjectDirs::from("com", "lore", "lore")?;

        let config_dir = proj_dirs.config_dir().to_path_buf();
        let data_dir = proj_dirs.data_dir().to_path_buf();

        Some(Self {
            config_file: config_dir.join("config.toml"),
            database_file: data_dir.join("lore.db"),
            config_dir,
            data_dir,
        })
    }

    /// Point the data directory (and database) somewhere else.
    ///
    /// `~` and environment variables in the path are expanded.
    pub fn with_data_dir(mut self, data_dir: &str) -> Self {
        let expanded = shellexpand::full(data_dir)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| data_dir.to_string());
        self.data_dir = PathBuf::from(expanded);
        self.database_file = self.data_dir.join("lore.db");
        self
    }

    /// Paths rooted in a single directory (used for tests and portable setups).
    pub fn in_dir(root: &Path) -> Self {
        Self {
            config_dir: root.to_path_buf(),
            data_dir: root.to_path_buf(),
            config_file: root.join("config.toml"),
            database_file: root.join("lore.db"),
        }
    }

    /// Create all necessary directories.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }

    /// Check if lore has been initialized.
    pub fn is_initialized(&self) -> bool {
        self.config_file.exists() && self.database_file.exists()
    }
}
