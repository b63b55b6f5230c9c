//! Configuration loading for stash.
//!
//! Everything a hosting application needs before it can open storage:
//! where the working root lives, whether the remote tier is on, and how
//! loud to log.
//!
//! # Usage
//!
//! ```rust,no_run
//! use stashconf::StashConfig;
//!
//! let config = StashConfig::load().expect("Failed to load config");
//! let resolver = config.resolver();
//! println!("storage lives under {}", resolver.join("storage").display());
//! ```
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/stash/config.toml` (system)
//! 2. `~/.config/stash/config.toml` (user)
//! 3. `./stash.toml` (local override, replaced by an explicit path)
//! 4. Environment variables (`STASH_*`, `RUST_LOG`)
//!
//! # Example Config
//!
//! ```toml
//! [paths]
//! work_dir = "~/reader"
//!
//! [remote]
//! enabled = true
//! database = "/mnt/shared/stash/remote.db"
//! collection = "storage"
//!
//! [telemetry]
//! log_level = "info"
//! ```

pub mod infra;
pub mod loader;
pub mod workdir;

pub use infra::{PathsConfig, RemoteConfig, TelemetryConfig};
pub use loader::{discover_config_files_with_override, ConfigSources};
pub use workdir::{HostEnv, Platform, WorkDirResolver, MACOS_HOME_SUBDIR};

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete stash configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StashConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl StashConfig {
    /// Load configuration from all sources.
    ///
    /// Load order (later wins):
    /// 1. Compiled defaults
    /// 2. `/etc/stash/config.toml`
    /// 3. `~/.config/stash/config.toml`
    /// 4. `./stash.toml`
    /// 5. Environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration with `config_path` replacing `./stash.toml`.
    pub fn load_from(config_path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration from optional path and return information about sources.
    pub fn load_with_sources_from(
        config_path: Option<&std::path::Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = StashConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            let file_config = loader::load_from_file(&path)?;
            config = loader::merge_configs(config, file_config);
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources);

        Ok((config, sources))
    }

    /// A working root resolver for this process.
    pub fn resolver(&self) -> WorkDirResolver {
        WorkDirResolver::from_host(self.paths.work_dir.clone())
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        let mut output = String::new();

        output.push_str("# stash configuration\n\n");

        output.push_str("[paths]\n");
        match &self.paths.work_dir {
            Some(dir) => output.push_str(&format!("work_dir = \"{}\"\n", dir.display())),
            None => output.push_str("# work_dir = \".\"\n"),
        }

        output.push_str("\n[remote]\n");
        match self.remote.enabled {
            Some(enabled) => output.push_str(&format!("enabled = {}\n", enabled)),
            None => output.push_str("# enabled = false\n"),
        }
        output.push_str(&format!(
            "database = \"{}\"\n",
            self.remote.database.display()
        ));
        output.push_str(&format!("collection = \"{}\"\n", self.remote.collection));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!(
            "log_level = \"{}\"\n",
            self.telemetry.log_level
        ));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_config() {
        let config = StashConfig::default();
        assert_eq!(config.paths.work_dir, None);
        assert!(!config.remote.is_enabled());
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_to_toml_parses_back() {
        let mut config = StashConfig::default();
        config.paths.work_dir = Some(PathBuf::from("/data/stash"));
        config.remote.enabled = Some(true);

        let toml = config.to_toml();
        assert!(toml.contains("[paths]"));
        assert!(toml.contains("[remote]"));
        assert!(toml.contains("[telemetry]"));

        let parsed = loader::parse_toml(&toml, Path::new("rendered.toml")).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_from_explicit_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("stash.toml");
        std::fs::write(&path, "[remote]\ncollection = \"explicit\"\n").unwrap();

        let (config, sources) = StashConfig::load_with_sources_from(Some(&path)).unwrap();
        assert!(sources.files.contains(&path));
        // Env may still override; collection is only touched by STASH_REMOTE_COLLECTION.
        if !sources.env_overrides.iter().any(|v| v == "STASH_REMOTE_COLLECTION") {
            assert_eq!(config.remote.collection, "explicit");
        }
    }
}
