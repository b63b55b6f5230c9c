//! stashctl - command-line access to stash storage
//!
//! Subcommands:
//! - `stashctl save <segments...>` - Store a JSON value (from `--value` or stdin)
//! - `stashctl get <segments...>` - Print stored content
//! - `stashctl path <segments...>` - Print the local cache path for a key
//! - `stashctl workdir` - Print the resolved working root
//! - `stashctl config` - Print the effective configuration

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stash::TieredStorage;
use stashconf::StashConfig;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "stashctl")]
#[command(about = "Tiered named-blob storage CLI")]
#[command(version)]
struct Cli {
    /// Config file (replaces ./stash.toml)
    #[arg(short, long, global = true, env = "STASH_CONFIG")]
    config: Option<PathBuf>,

    /// Working directory override
    #[arg(long, global = true)]
    work_dir: Option<PathBuf>,

    /// Remote tier database; enables the remote tier
    #[arg(long, global = true, conflicts_with = "no_remote")]
    remote_db: Option<PathBuf>,

    /// Disable the remote tier even if configured
    #[arg(long, global = true)]
    no_remote: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a value under a key
    Save {
        /// Key segments, namespace first, item name last
        #[arg(required = true)]
        segments: Vec<String>,

        /// JSON value to store (read from stdin when omitted)
        #[arg(short, long)]
        value: Option<String>,

        /// Store human-readable JSON
        #[arg(short, long, conflicts_with = "raw")]
        pretty: bool,

        /// Store the input verbatim without parsing it
        #[arg(long)]
        raw: bool,
    },

    /// Print the content stored under a key
    Get {
        #[arg(required = true)]
        segments: Vec<String>,
    },

    /// Print the local cache path for a key
    Path {
        #[arg(required = true)]
        segments: Vec<String>,
    },

    /// Print the resolved working root
    Workdir,

    /// Print the effective configuration as TOML
    Config,
}

impl Cli {
    fn load_config(&self) -> Result<StashConfig> {
        let mut config = StashConfig::load_from(self.config.as_deref())
            .context("Failed to load configuration")?;

        if let Some(dir) = &self.work_dir {
            config.paths.work_dir = Some(dir.clone());
        }
        if let Some(db) = &self.remote_db {
            config.remote.enabled = Some(true);
            config.remote.database = db.clone();
        }
        if self.no_remote {
            config.remote.enabled = Some(false);
        }

        Ok(config)
    }
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;
    init_tracing(&config.telemetry.log_level);
    debug!(
        "Remote tier {}",
        if config.remote.is_enabled() { "enabled" } else { "disabled" }
    );

    run(cli.command, &config)
}

fn run(command: Commands, config: &StashConfig) -> Result<()> {
    let open = || TieredStorage::from_config(config);

    match command {
        Commands::Save {
            segments,
            value,
            pretty,
            raw,
        } => {
            let input = match value {
                Some(v) => v,
                None => commands::read_stdin()?,
            };
            let path = commands::save(&open()?, &segments, &input, pretty, raw)?;
            println!("{}", path.display());
        }
        Commands::Get { segments } => match commands::get(&open()?, &segments)? {
            Some(content) => println!("{}", content),
            None => anyhow::bail!("nothing stored under {}", segments.join("/")),
        },
        Commands::Path { segments } => {
            println!("{}", open()?.path_for(&segments)?.display());
        }
        Commands::Workdir => {
            println!("{}", open()?.resolver().resolve().display());
        }
        Commands::Config => {
            print!("{}", config.to_toml());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_save() {
        let cli = Cli::try_parse_from([
            "stashctl", "save", "books", "123", "--value", r#"{"title":"Foo"}"#, "--pretty",
        ])
        .unwrap();

        match cli.command {
            Commands::Save {
                segments,
                value,
                pretty,
                raw,
            } => {
                assert_eq!(segments, vec!["books", "123"]);
                assert_eq!(value.as_deref(), Some(r#"{"title":"Foo"}"#));
                assert!(pretty);
                assert!(!raw);
            }
            _ => panic!("expected save"),
        }
    }

    #[test]
    fn test_pretty_and_raw_conflict() {
        let result = Cli::try_parse_from(["stashctl", "save", "k", "--pretty", "--raw"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_get_requires_segments() {
        assert!(Cli::try_parse_from(["stashctl", "get"]).is_err());
    }

    #[test]
    fn test_remote_flags_conflict() {
        let result = Cli::try_parse_from([
            "stashctl", "--remote-db", "/tmp/r.db", "--no-remote", "workdir",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let temp = tempfile::TempDir::new().unwrap();
        let config_path = temp.path().join("stash.toml");
        std::fs::write(&config_path, "[remote]\nenabled = true\n").unwrap();

        let cli = Cli::try_parse_from([
            "stashctl",
            "--config",
            config_path.to_str().unwrap(),
            "--work-dir",
            "/srv/stash",
            "--no-remote",
            "workdir",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(config.paths.work_dir, Some(PathBuf::from("/srv/stash")));
        assert!(!config.remote.is_enabled());
    }

    #[test]
    fn test_remote_db_enables_remote() {
        let cli = Cli::try_parse_from(["stashctl", "--remote-db", "/data/r.db", "config"]).unwrap();
        let config = cli.load_config().unwrap();

        assert!(config.remote.is_enabled());
        assert_eq!(config.remote.database, PathBuf::from("/data/r.db"));
    }
}
