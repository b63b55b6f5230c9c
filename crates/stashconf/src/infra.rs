//! Configuration sections: paths, remote tier, telemetry.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Filesystem paths for the local tier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Explicit working directory. `None`, empty, or `.` selects the
    /// platform default (see [`crate::WorkDirResolver`]).
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
}

/// Remote document tier.
///
/// The remote tier is a SQLite document table that may live on shared
/// storage. It is off unless `enabled` is set to true.
///
/// `enabled` stays `None` when a file does not mention it, so a later
/// config file can switch the tier off as well as on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Whether the hosting application should open the remote tier.
    /// Default: unset (off)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,

    /// Database file backing the remote tier.
    /// Default: ~/.local/share/stash/remote.db
    #[serde(default = "RemoteConfig::default_database")]
    pub database: PathBuf,

    /// Collection (table) holding stored records.
    /// Default: storage
    #[serde(default = "RemoteConfig::default_collection")]
    pub collection: String,
}

impl RemoteConfig {
    pub fn is_enabled(&self) -> bool {
        self.enabled.unwrap_or(false)
    }

    pub(crate) fn default_database() -> PathBuf {
        directories::BaseDirs::new()
            .map(|dirs| dirs.home_dir().join(".local/share/stash/remote.db"))
            .unwrap_or_else(|| PathBuf::from(".local/share/stash/remote.db"))
    }

    pub(crate) fn default_collection() -> String {
        "storage".to_string()
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: None,
            database: Self::default_database(),
            collection: Self::default_collection(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Log filter directive (trace, debug, info, warn, error, or an
    /// `EnvFilter` expression).
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    pub(crate) fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
