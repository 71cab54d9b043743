//! Configuration file support for Wharf.
//!
//! Wharf reads two optional configuration files:
//! - Global: `~/.wharf/config.toml` - User-wide defaults
//! - Project: `.wharf/config.toml` - Project-specific overrides
//!
//! Project config takes precedence over global config. Environment
//! variables take precedence over both (see [`GlobalContext`]).
//!
//! [`GlobalContext`]: crate::util::GlobalContext

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::util::fs::read_to_string;

/// Wharf configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Package cache settings
    pub packages: PackagesConfig,

    /// Platform library settings
    pub framework: FrameworkConfig,

    /// Compilation settings
    pub compile: CompileConfig,
}

/// Package cache configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackagesConfig {
    /// Root of the extracted package cache (e.g. ~/.nuget/packages)
    pub root: Option<PathBuf>,
}

/// Platform library configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameworkConfig {
    /// Directory holding the platform's base libraries
    /// (e.g. /usr/share/dotnet/shared/Microsoft.NETCore.App/8.0.1)
    pub dir: Option<PathBuf>,
}

/// Compilation configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileConfig {
    /// Preprocessor symbols defined for every compilation
    pub define: Vec<String>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = read_to_string(path)?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.packages.root.is_some() {
            self.packages.root = other.packages.root;
        }
        if other.framework.dir.is_some() {
            self.framework.dir = other.framework.dir;
        }
        for symbol in other.compile.define {
            if !self.compile.define.contains(&symbol) {
                self.compile.define.push(symbol);
            }
        }
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.wharf/config.toml)
/// 2. Global config (~/.wharf/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        config.merge(Config::load_or_default(global_path));
    }

    config.merge(Config::load_or_default(project_path));

    config
}

/// Get the global wharf config directory (~/.wharf).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".wharf"))
}

/// Get the global config path (~/.wharf/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.wharf/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(".wharf").join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(
            r#"
[packages]
root = "/opt/nuget"

[compile]
define = ["UNITY_EDITOR", "DEBUG"]
"#,
        )
        .unwrap();

        assert_eq!(config.packages.root, Some(PathBuf::from("/opt/nuget")));
        assert_eq!(config.framework.dir, None);
        assert_eq!(config.compile.define, ["UNITY_EDITOR", "DEBUG"]);
    }

    #[test]
    fn test_project_overrides_global() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = project_config_path(tmp.path());

        std::fs::write(
            &global,
            "[packages]\nroot = \"/global\"\n[framework]\ndir = \"/fx\"\n[compile]\ndefine = [\"A\"]\n",
        )
        .unwrap();
        std::fs::create_dir_all(project.parent().unwrap()).unwrap();
        std::fs::write(&project, "[packages]\nroot = \"/project\"\n[compile]\ndefine = [\"A\", \"B\"]\n")
            .unwrap();

        let config = load_config(Some(&global), &project);
        assert_eq!(config.packages.root, Some(PathBuf::from("/project")));
        assert_eq!(config.framework.dir, Some(PathBuf::from("/fx")));
        assert_eq!(config.compile.define, ["A", "B"]);
    }

    #[test]
    fn test_invalid_config_falls_back_to_default() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "this is = = not toml").unwrap();

        assert_eq!(Config::load_or_default(&path), Config::default());
        assert!(Config::load(&path).is_err());
    }
}
