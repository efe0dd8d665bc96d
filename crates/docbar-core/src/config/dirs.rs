use directories::ProjectDirs;
use std::path::PathBuf;

use crate::{Error, Result};

/// Application directories following XDG spec
#[derive(Debug, Clone)]
pub struct Directories {
    /// Config directory (~/.config/docbar)
    pub config: PathBuf,

    /// Config file path
    pub config_file: PathBuf,
}

impl Directories {
    /// Create a new `Directories` instance with standard XDG paths.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the user's home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let project = ProjectDirs::from("", "", "docbar").ok_or_else(|| {
            Error::Config("Failed to determine project directories".to_string())
        })?;

        Ok(Self::with_base(project.config_dir().to_path_buf()))
    }

    #[must_use]
    pub fn with_base(base: PathBuf) -> Self {
        Self {
            config_file: base.join("config.json"),
            config: base,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_base_sets_all_paths() {
        let base = PathBuf::from("/tmp/test-docbar");
        let dirs = Directories::with_base(base.clone());

        assert_eq!(dirs.config, base);
        assert_eq!(dirs.config_file, base.join("config.json"));
    }

    #[test]
    fn test_new_returns_valid_xdg_paths() {
        let Ok(dirs) = Directories::new() else {
            return;
        };

        assert!(dirs.config.to_string_lossy().contains("docbar"));
        assert!(dirs.config_file.to_string_lossy().ends_with("config.json"));
    }
}
