//! Configuration file discovery and loading.
//!
//! Files are layered user config first, then project config; keys in later
//! files replace the same keys in earlier ones, recursively through mappings.

use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::Value;

use crate::config::schema::KamekConfig;
use crate::error::{KamekError, Result};

/// Directory name used for both the user and project config locations.
pub const CONFIG_DIR_NAME: &str = "kamek";
pub const CONFIG_FILE_NAME: &str = "config.yml";

/// Paths to configuration files in priority order (later overrides earlier).
#[derive(Debug, Clone, Default)]
pub struct ConfigPaths {
    /// `<user config dir>/kamek/config.yml`
    pub user: Option<PathBuf>,

    /// `<project>/.kamek/config.yml`
    pub project: Option<PathBuf>,
}

impl ConfigPaths {
    /// Discover existing config files for `project_root`.
    pub fn discover(project_root: &Path) -> Self {
        Self {
            user: dirs::config_dir()
                .map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
                .filter(|p| p.is_file()),
            project: Some(project_config_path(project_root)).filter(|p| p.is_file()),
        }
    }

    /// Existing paths in merge order.
    pub fn all_existing(&self) -> Vec<&PathBuf> {
        self.user.iter().chain(self.project.iter()).collect()
    }
}

/// `<project>/.kamek/config.yml`, whether or not it exists.
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root
        .join(format!(".{}", CONFIG_DIR_NAME))
        .join(CONFIG_FILE_NAME)
}

/// Read one file as a raw YAML value.
pub fn load_config_value(path: &Path) -> Result<Value> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            KamekError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            KamekError::Io(e)
        }
    })?;

    let value: Value =
        serde_yaml::from_str(&content).map_err(|e| KamekError::ConfigParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    // An empty file parses as null.
    Ok(if value.is_null() {
        Value::Mapping(Default::default())
    } else {
        value
    })
}

/// Overlay `top` onto `base`. Mappings merge key by key; anything else is replaced.
pub fn overlay(base: Value, top: Value) -> Value {
    match (base, top) {
        (Value::Mapping(mut merged), Value::Mapping(top)) => {
            for (key, value) in top {
                let combined = match merged.remove(&key) {
                    Some(existing) => overlay(existing, value),
                    None => value,
                };
                merged.insert(key, combined);
            }
            Value::Mapping(merged)
        }
        (_, top) => top,
    }
}

fn parse_value(value: Value, origin: &Path) -> Result<KamekConfig> {
    serde_yaml::from_value(value).map_err(|e| KamekError::ConfigParseError {
        path: origin.to_path_buf(),
        message: e.to_string(),
    })
}

/// Load configuration.
///
/// With `config_override`, only that file is read and it must exist.
/// Otherwise every discovered file is merged; none at all yields defaults.
pub fn load_config(project_root: &Path, config_override: Option<&Path>) -> Result<KamekConfig> {
    if let Some(path) = config_override {
        tracing::debug!("Loading config from {}", path.display());
        return parse_value(load_config_value(path)?, path);
    }

    let paths = ConfigPaths::discover(project_root);
    let existing = paths.all_existing();
    let Some(last) = existing.last() else {
        tracing::debug!("No config files found; using defaults");
        return Ok(KamekConfig::default());
    };

    let mut merged = Value::Mapping(Default::default());
    for path in &existing {
        tracing::debug!("Merging config {}", path.display());
        merged = overlay(merged, load_config_value(path)?);
    }
    parse_value(merged, last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn overlay_merges_nested_mappings() {
        let base = yaml("python:\n  min_version: '3.8'\n  required_packages: [PyYAML]\n");
        let top = yaml("python:\n  min_version: '3.11'\n");
        let merged = overlay(base, top);
        assert_eq!(merged["python"]["min_version"], "3.11");
        assert_eq!(merged["python"]["required_packages"][0], "PyYAML");
    }

    #[test]
    fn overlay_replaces_sequences() {
        let base = yaml("python:\n  required_packages: [PyYAML, pyelftools]\n");
        let top = yaml("python:\n  required_packages: [requests]\n");
        let merged = overlay(base, top);
        let packages = merged["python"]["required_packages"].as_sequence().unwrap();
        assert_eq!(packages.len(), 1);
    }

    #[test]
    fn explicit_path_must_exist() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope.yml");
        let err = load_config(temp.path(), Some(&missing)).unwrap_err();
        assert!(matches!(err, KamekError::ConfigNotFound { .. }));
    }

    #[test]
    fn explicit_path_is_parsed() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("kamek.yml");
        fs::write(&path, "upgrade:\n  max_path_attempts: 2\n").unwrap();
        let config = load_config(temp.path(), Some(&path)).unwrap();
        assert_eq!(config.upgrade.max_path_attempts, 2);
        assert_eq!(config.upgrade.version_token, "latest");
    }

    #[test]
    fn project_config_is_discovered() {
        let temp = TempDir::new().unwrap();
        let path = project_config_path(temp.path());
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "download_dir: /tmp/kamek-downloads\n").unwrap();

        let config = load_config(temp.path(), None).unwrap();
        assert_eq!(config.download_dir, Some(PathBuf::from("/tmp/kamek-downloads")));
    }

    #[test]
    fn empty_file_is_valid() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("empty.yml");
        fs::write(&path, "").unwrap();
        assert_eq!(
            load_config(temp.path(), Some(&path)).unwrap(),
            KamekConfig::default()
        );
    }

    #[test]
    fn invalid_yaml_reports_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.yml");
        fs::write(&path, "python: [unclosed").unwrap();
        let err = load_config(temp.path(), Some(&path)).unwrap_err();
        assert!(matches!(err, KamekError::ConfigParseError { .. }));
        assert!(err.to_string().contains("bad.yml"));
    }
}
