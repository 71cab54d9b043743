//! Global context for Wharf operations.
//!
//! Provides centralized access to configuration, paths, and environment.
//! Environment variables are read once here; the rest of the crate receives
//! plain paths.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use semver::Version;

use crate::util::config::{global_config_path, load_config, project_config_path, Config};

/// Environment variable overriding the package cache root.
pub const PACKAGES_ENV: &str = "NUGET_PACKAGES";

/// Environment variable overriding the platform library directory.
pub const FRAMEWORK_DIR_ENV: &str = "WHARF_FRAMEWORK_DIR";

/// Environment variable naming the .NET installation root.
pub const DOTNET_ROOT_ENV: &str = "DOTNET_ROOT";

/// Shared runtime holding the platform base libraries.
const RUNTIME_PACK: &str = "Microsoft.NETCore.App";

/// Install roots probed when `DOTNET_ROOT` is unset.
#[cfg(windows)]
const DOTNET_INSTALL_ROOTS: &[&str] = &[r"C:\Program Files\dotnet"];

#[cfg(not(windows))]
const DOTNET_INSTALL_ROOTS: &[&str] = &[
    "/usr/share/dotnet",
    "/usr/lib/dotnet",
    "/usr/local/share/dotnet",
    "/opt/dotnet",
];

/// Global context containing configuration and paths.
#[derive(Debug, Clone)]
pub struct GlobalContext {
    /// Current working directory
    cwd: PathBuf,

    /// Merged configuration files
    config: Config,

    /// Root of the package cache
    package_root: PathBuf,

    /// Platform base library directory, if one could be found
    framework_dir: Option<PathBuf>,

    /// Whether to use verbose output
    verbose: bool,
}

impl GlobalContext {
    /// Create a new GlobalContext from the environment and config files.
    pub fn new() -> Result<Self> {
        let cwd = std::env::current_dir().context("failed to get current directory")?;
        Ok(Self::from_cwd(cwd))
    }

    /// Create a GlobalContext with a specific working directory.
    pub fn with_cwd(cwd: PathBuf) -> Result<Self> {
        Ok(Self::from_cwd(cwd))
    }

    fn from_cwd(cwd: PathBuf) -> Self {
        let config = load_config(global_config_path().as_deref(), &project_config_path(&cwd));

        let package_root = package_root_from(env_path(PACKAGES_ENV), &config);

        let mut dotnet_roots: Vec<PathBuf> = env_path(DOTNET_ROOT_ENV).into_iter().collect();
        dotnet_roots.extend(DOTNET_INSTALL_ROOTS.iter().map(PathBuf::from));
        let framework_dir = framework_dir_from(env_path(FRAMEWORK_DIR_ENV), &config, &dotnet_roots);

        match &framework_dir {
            Some(dir) => tracing::debug!("Platform libraries: {}", dir.display()),
            None => tracing::debug!("No platform library directory found"),
        }

        GlobalContext {
            cwd,
            config,
            package_root,
            framework_dir,
            verbose: false,
        }
    }

    /// Override the package cache root.
    pub fn with_package_root(mut self, root: PathBuf) -> Self {
        self.package_root = root;
        self
    }

    /// Override the platform library directory.
    pub fn with_framework_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.framework_dir = dir;
        self
    }

    /// Set verbose mode.
    pub fn set_verbose(&mut self, verbose: bool) {
        self.verbose = verbose;
    }

    /// Get the current working directory.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Get the package cache root.
    pub fn package_root(&self) -> &Path {
        &self.package_root
    }

    /// Get the platform library directory.
    pub fn framework_dir(&self) -> Option<&Path> {
        self.framework_dir.as_deref()
    }

    /// Preprocessor symbols defined by configuration.
    pub fn default_symbols(&self) -> &[String] {
        &self.config.compile.define
    }

    /// Check if verbose mode is enabled.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

fn env_path(name: &str) -> Option<PathBuf> {
    std::env::var_os(name)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Pick the package cache root: environment, then config, then `~/.nuget/packages`.
pub fn package_root_from(env: Option<PathBuf>, config: &Config) -> PathBuf {
    env.or_else(|| config.packages.root.clone())
        .unwrap_or_else(default_package_root)
}

/// The platform-conventional package cache under the user's home directory.
pub fn default_package_root() -> PathBuf {
    directories::BaseDirs::new()
        .map(|b| b.home_dir().join(".nuget").join("packages"))
        .unwrap_or_else(|| PathBuf::from(".nuget").join("packages"))
}

/// Pick the platform library directory: environment, then config, then the
/// newest runtime found under one of `dotnet_roots`.
pub fn framework_dir_from(
    env: Option<PathBuf>,
    config: &Config,
    dotnet_roots: &[PathBuf],
) -> Option<PathBuf> {
    env.or_else(|| config.framework.dir.clone())
        .or_else(|| dotnet_roots.iter().find_map(|root| probe_runtime_dir(root)))
}

/// Find `<root>/shared/Microsoft.NETCore.App/<highest version>`.
pub fn probe_runtime_dir(dotnet_root: &Path) -> Option<PathBuf> {
    let runtimes = dotnet_root.join("shared").join(RUNTIME_PACK);
    let entries = std::fs::read_dir(&runtimes).ok()?;

    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| {
            let name = entry.file_name();
            let version = Version::parse(name.to_str()?).ok()?;
            Some((version, entry.path()))
        })
        .max_by(|a, b| a.0.cmp(&b.0))
        .map(|(_, path)| path)
}
