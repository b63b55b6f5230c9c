//! Config file discovery, loading, and environment variable overlay.

use crate::infra::{RemoteConfig, TelemetryConfig};
use crate::{ConfigError, StashConfig};
use std::env;
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

/// Discover config files in standard locations.
///
/// Returns paths in load order (system, user, local).
/// Only returns files that exist.
pub fn discover_config_files() -> Vec<PathBuf> {
    discover_config_files_with_override(None)
}

/// Discover config files, optionally with a CLI override path.
///
/// If `cli_path` is provided and exists, it replaces the local `./stash.toml`.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/stash/config.toml");
    if system.exists() {
        files.push(system);
    }

    // XDG_CONFIG_HOME or ~/.config
    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("stash/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        if path.exists() {
            files.push(path.to_path_buf());
            return files;
        }
    }

    let local = PathBuf::from("stash.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load config from a TOML file.
pub fn load_from_file(path: &Path) -> Result<StashConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path)
}

/// Parse config from a TOML string. Missing sections take defaults.
pub(crate) fn parse_toml(contents: &str, path: &Path) -> Result<StashConfig, ConfigError> {
    let mut config: StashConfig =
        toml::from_str(contents).map_err(|e: toml::de::Error| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

    config.paths.work_dir = config
        .paths
        .work_dir
        .map(|dir| expand_path(&dir.to_string_lossy()));
    config.remote.database = expand_path(&config.remote.database.to_string_lossy());

    Ok(config)
}

/// Merge two configs, with `overlay` taking precedence wherever it
/// differs from the compiled defaults.
pub fn merge_configs(base: StashConfig, overlay: StashConfig) -> StashConfig {
    let default_remote = RemoteConfig::default();

    StashConfig {
        paths: crate::infra::PathsConfig {
            work_dir: overlay.paths.work_dir.or(base.paths.work_dir),
        },
        remote: RemoteConfig {
            enabled: overlay.remote.enabled.or(base.remote.enabled),
            database: if overlay.remote.database != default_remote.database {
                overlay.remote.database
            } else {
                base.remote.database
            },
            collection: if overlay.remote.collection != default_remote.collection {
                overlay.remote.collection
            } else {
                base.remote.collection
            },
        },
        telemetry: TelemetryConfig {
            log_level: if overlay.telemetry.log_level != TelemetryConfig::default_log_level() {
                overlay.telemetry.log_level
            } else {
                base.telemetry.log_level
            },
        },
    }
}

/// Apply environment variable overrides to config.
pub fn apply_env_overrides(config: &mut StashConfig, sources: &mut ConfigSources) {
    apply_overrides_with(config, sources, |key| env::var(key).ok());
}

/// Apply overrides from an arbitrary variable lookup.
pub(crate) fn apply_overrides_with<F>(
    config: &mut StashConfig,
    sources: &mut ConfigSources,
    lookup: F,
) where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("STASH_WORK_DIR") {
        config.paths.work_dir = Some(expand_path(&v));
        sources.env_overrides.push("STASH_WORK_DIR".to_string());
    }

    if let Some(v) = lookup("STASH_REMOTE_ENABLED") {
        config.remote.enabled = Some(v.eq_ignore_ascii_case("true") || v == "1");
        sources.env_overrides.push("STASH_REMOTE_ENABLED".to_string());
    }
    if let Some(v) = lookup("STASH_REMOTE_DB") {
        config.remote.database = expand_path(&v);
        sources.env_overrides.push("STASH_REMOTE_DB".to_string());
    }
    if let Some(v) = lookup("STASH_REMOTE_COLLECTION") {
        config.remote.collection = v;
        sources.env_overrides.push("STASH_REMOTE_COLLECTION".to_string());
    }

    if let Some(v) = lookup("STASH_LOG_LEVEL") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("STASH_LOG_LEVEL".to_string());
    }
    // RUST_LOG wins over everything
    if let Some(v) = lookup("RUST_LOG") {
        config.telemetry.log_level = v;
        sources.env_overrides.push("RUST_LOG".to_string());
    }
}

/// Expand `~/` and a leading `$VAR` in a path.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        return directories::BaseDirs::new()
            .map(|d| d.home_dir().join(rest))
            .unwrap_or_else(|| PathBuf::from(path));
    }

    if let Some(var_and_rest) = path.strip_prefix('$') {
        let (var_name, rest) = match var_and_rest.split_once('/') {
            Some((name, rest)) => (name, Some(rest)),
            None => (var_and_rest, None),
        };
        return match (env::var(var_name), rest) {
            (Ok(value), Some(rest)) => PathBuf::from(value).join(rest),
            (Ok(value), None) => PathBuf::from(value),
            (Err(_), _) => PathBuf::from(path),
        };
    }

    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_expand_path_tilde() {
        let expanded = expand_path("~/test/path");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_absolute() {
        assert_eq!(expand_path("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_path_unknown_var_is_literal() {
        let expanded = expand_path("$STASH_SURELY_UNSET_VAR/data");
        assert_eq!(expanded, PathBuf::from("$STASH_SURELY_UNSET_VAR/data"));
    }

    #[test]
    fn test_discover_config_files() {
        // Just verify it doesn't panic
        let _files = discover_config_files();
    }

    #[test]
    fn test_parse_empty_toml() {
        let config = parse_toml("", Path::new("empty.toml")).unwrap();
        assert_eq!(config.paths.work_dir, None);
        assert!(!config.remote.is_enabled());
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
[paths]
work_dir = "/srv/reader"

[remote]
enabled = true
database = "/mnt/shared/stash.db"
collection = "files"

[telemetry]
log_level = "debug"
"#;
        let config = parse_toml(toml, Path::new("test.toml")).unwrap();

        assert_eq!(config.paths.work_dir, Some(PathBuf::from("/srv/reader")));
        assert!(config.remote.is_enabled());
        assert_eq!(config.remote.database, PathBuf::from("/mnt/shared/stash.db"));
        assert_eq!(config.remote.collection, "files");
        assert_eq!(config.telemetry.log_level, "debug");
    }

    #[test]
    fn test_parse_invalid_toml() {
        let err = parse_toml("[paths\nwork_dir = 3", Path::new("bad.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("bad.toml"));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_from_file(Path::new("/definitely/not/here/stash.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    #[test]
    fn test_merge_overlay_wins() {
        let base = parse_toml(
            "[paths]\nwork_dir = \"/base\"\n[telemetry]\nlog_level = \"warn\"\n",
            Path::new("base.toml"),
        )
        .unwrap();
        let overlay = parse_toml(
            "[remote]\nenabled = true\ncollection = \"docs\"\n",
            Path::new("overlay.toml"),
        )
        .unwrap();

        let merged = merge_configs(base, overlay);
        assert_eq!(merged.paths.work_dir, Some(PathBuf::from("/base")));
        assert_eq!(merged.telemetry.log_level, "warn");
        assert!(merged.remote.is_enabled());
        assert_eq!(merged.remote.collection, "docs");
    }

    #[test]
    fn test_later_file_can_disable_remote() {
        let user = parse_toml("[remote]\nenabled = true\n", Path::new("user.toml")).unwrap();
        let local = parse_toml("[remote]\nenabled = false\n", Path::new("stash.toml")).unwrap();
        assert!(!merge_configs(user.clone(), local).remote.is_enabled());

        // a file that never mentions it keeps the earlier setting
        let silent = parse_toml("[telemetry]\nlog_level = \"debug\"\n", Path::new("s.toml")).unwrap();
        assert_eq!(silent.remote.enabled, None);
        assert!(merge_configs(user, silent).remote.is_enabled());
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("STASH_WORK_DIR", "/env/work"),
            ("STASH_REMOTE_ENABLED", "1"),
            ("STASH_REMOTE_DB", "/env/remote.db"),
            ("STASH_LOG_LEVEL", "trace"),
        ]
        .into_iter()
        .collect();

        let mut config = StashConfig::default();
        let mut sources = ConfigSources::default();
        apply_overrides_with(&mut config, &mut sources, |k| {
            vars.get(k).map(|v| v.to_string())
        });

        assert_eq!(config.paths.work_dir, Some(PathBuf::from("/env/work")));
        assert!(config.remote.is_enabled());
        assert_eq!(config.remote.database, PathBuf::from("/env/remote.db"));
        assert_eq!(config.telemetry.log_level, "trace");
        assert_eq!(sources.env_overrides.len(), 4);
    }

    #[test]
    fn test_rust_log_beats_stash_log_level() {
        let mut config = StashConfig::default();
        let mut sources = ConfigSources::default();
        apply_overrides_with(&mut config, &mut sources, |k| match k {
            "STASH_LOG_LEVEL" => Some("warn".to_string()),
            "RUST_LOG" => Some("stash=debug".to_string()),
            _ => None,
        });

        assert_eq!(config.telemetry.log_level, "stash=debug");
        assert_eq!(sources.env_overrides, vec!["STASH_LOG_LEVEL", "RUST_LOG"]);
    }
}
