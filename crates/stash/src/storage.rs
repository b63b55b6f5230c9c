//! TieredStorage: local-first reads with remote fallback and backfill.
//!
//! Write path: local file first, then a best-effort remote upsert. The
//! local write decides success; remote failures are logged.
//!
//! Read path:
//! - local file present and non-empty: returned as-is, remote untouched
//! - local file missing: remote content (if non-empty) is written to the
//!   local file, then returned
//! - local file empty: same remote fallback; if the remote has nothing the
//!   empty string is returned
//!
//! A failed backfill write is logged and the fetched content is still
//! returned.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::Serialize;
use stashconf::{StashConfig, WorkDirResolver};
use tracing::{info, warn};

use crate::codec::{Codec, JsonCodec};
use crate::error::Result;
use crate::key::{IntoStorageKey, StorageKey};
use crate::local::LocalCacheTier;
use crate::remote::RemoteTier;
use crate::sqlite::SqliteRemote;

/// Directory under the working root holding cached files.
pub const STORAGE_DIR: &str = "storage";

/// Coordinator over the local and remote tiers.
///
/// Holds no mutable state besides the resolver's cached root, so one
/// instance can be shared across threads behind an `Arc`.
#[derive(Debug)]
pub struct TieredStorage<C = JsonCodec> {
    resolver: Arc<WorkDirResolver>,
    local: LocalCacheTier,
    remote: RemoteTier,
    codec: C,
}

impl TieredStorage<JsonCodec> {
    pub fn new(resolver: Arc<WorkDirResolver>, remote: RemoteTier) -> Self {
        Self::with_codec(resolver, remote, JsonCodec)
    }

    /// Pure local cache rooted at `root`, no remote tier.
    pub fn at_path(root: impl Into<PathBuf>) -> Self {
        Self::new(
            Arc::new(WorkDirResolver::fixed(root)),
            RemoteTier::disabled(),
        )
    }

    /// Build storage from loaded configuration.
    ///
    /// Opens the SQLite remote when `remote.enabled` is set.
    pub fn from_config(config: &StashConfig) -> anyhow::Result<Self> {
        let remote = if config.remote.is_enabled() {
            let store = SqliteRemote::open(&config.remote.database, &config.remote.collection)
                .with_context(|| {
                    format!(
                        "failed to open remote tier at {}",
                        config.remote.database.display()
                    )
                })?;
            info!(
                "Remote tier: {} (collection {})",
                config.remote.database.display(),
                config.remote.collection
            );
            RemoteTier::new(Arc::new(store))
        } else {
            RemoteTier::disabled()
        };

        Ok(Self::new(Arc::new(config.resolver()), remote))
    }
}

impl<C: Codec> TieredStorage<C> {
    pub fn with_codec(resolver: Arc<WorkDirResolver>, remote: RemoteTier, codec: C) -> Self {
        Self {
            resolver,
            local: LocalCacheTier,
            remote,
            codec,
        }
    }

    /// `{WorkingRoot}/storage`.
    pub fn storage_root(&self) -> PathBuf {
        self.resolver.join(STORAGE_DIR)
    }

    pub fn resolver(&self) -> &WorkDirResolver {
        &self.resolver
    }

    pub fn remote(&self) -> &RemoteTier {
        &self.remote
    }

    /// Absolute path of the cached file for `key`.
    pub fn path_for<K: IntoStorageKey>(&self, key: K) -> Result<PathBuf> {
        let (_, _, path) = self.locate(key)?;
        Ok(path)
    }

    /// Encode `value` and store it under `key`. Returns the local path.
    ///
    /// `pretty` applies to every value, `serde_json::Value` included. To
    /// keep an already-structured value in its own text form, store
    /// `value.to_string()` with [`save_text`](Self::save_text).
    pub fn save<K, T>(&self, key: K, value: &T, pretty: bool) -> Result<PathBuf>
    where
        K: IntoStorageKey,
        T: Serialize + ?Sized,
    {
        let content = self.codec.encode(value, pretty)?;
        self.save_text(key, &content)
    }

    /// Store already-serialized content verbatim. Returns the local path.
    pub fn save_text<K: IntoStorageKey>(&self, key: K, content: &str) -> Result<PathBuf> {
        let (key, relative, path) = self.locate(key)?;
        self.local.ensure_dir(&self.storage_root())?;

        info!(
            "Save file to storage name: {} path: {}",
            key,
            path.display()
        );
        self.local.write(&path, content)?;

        if self.remote.is_active() && !self.remote.upsert(&relative, content) {
            warn!("Remote copy of {} not updated", relative);
        }

        Ok(path)
    }

    /// Stored content for `key`, or `None` if neither tier has it.
    pub fn get<K: IntoStorageKey>(&self, key: K) -> Result<Option<String>> {
        let (key, relative, path) = self.locate(key)?;
        self.local.ensure_dir(&self.storage_root())?;

        info!(
            "Read file from storage name: {} path: {}",
            key,
            path.display()
        );

        match self.local.read(&path)? {
            None => Ok(self.fetch_and_backfill(&relative, &path)),
            Some(content) if content.is_empty() => Ok(Some(
                self.fetch_and_backfill(&relative, &path)
                    .unwrap_or(content),
            )),
            Some(content) => Ok(Some(content)),
        }
    }

    /// [`get`](Self::get) and decode. Empty content counts as absent.
    pub fn get_as<K, T>(&self, key: K) -> Result<Option<T>>
    where
        K: IntoStorageKey,
        T: DeserializeOwned,
    {
        match self.get(key)? {
            Some(content) if !content.is_empty() => Ok(Some(self.codec.decode(&content)?)),
            _ => Ok(None),
        }
    }

    fn locate<K: IntoStorageKey>(&self, key: K) -> Result<(StorageKey, String, PathBuf)> {
        let key = key.into_storage_key()?;
        let relative = key.relative_path();
        let path = self.storage_root().join(&relative);
        Ok((key, relative, path))
    }

    fn fetch_and_backfill(&self, relative: &str, path: &std::path::Path) -> Option<String> {
        let content = self.remote.fetch(relative).filter(|c| !c.is_empty())?;

        match self.local.write(path, &content) {
            Ok(()) => info!("Backfilled {} from remote", path.display()),
            Err(e) => warn!("Backfill of {} failed: {}", path.display(), e),
        }

        Some(content)
    }
}
