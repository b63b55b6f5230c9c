//! RemoteTier: optional document store behind the local cache.
//!
//! [`RemoteStore`] is the backend seam, shaped like a document
//! collection keyed by `path`: find one, replace one (optionally
//! upserting), insert one. [`RemoteTier`] wraps an optional store and
//! turns every backend failure into a log line, so callers of
//! [`TieredStorage`](crate::TieredStorage) never see remote errors.
//!
//! # Consistency
//!
//! [`RemoteTier::upsert`] is find-then-write, not compare-and-swap. Two
//! upserts racing on one path can interleave between the find and the
//! write, and the slower one silently replaces the faster one (lost
//! update). Last writer wins.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Result};
use tracing::{debug, warn};

use crate::record::RemoteRecord;

/// Result of [`RemoteStore::replace`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplaceOutcome {
    /// Records matching the path.
    pub matched: u64,
    /// Records whose content was rewritten.
    pub modified: u64,
    /// Whether a new record was inserted because none matched.
    pub upserted: bool,
}

/// Trait for remote document backends.
///
/// Implementations must be `Send + Sync`; one handle is shared by every
/// request-handling thread.
pub trait RemoteStore: Send + Sync {
    /// Look up the record for `path`.
    fn find(&self, path: &str) -> Result<Option<RemoteRecord>>;

    /// Replace the record with `record.path`. With `upsert`, insert it if
    /// no record matches.
    fn replace(&self, record: &RemoteRecord, upsert: bool) -> Result<ReplaceOutcome>;

    /// Insert a new record. Fails if one already exists for the path.
    fn insert(&self, record: &RemoteRecord) -> Result<()>;
}

/// In-process [`RemoteStore`], for tests and single-process embedding.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    records: Mutex<HashMap<String, RemoteRecord>>,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, RemoteRecord>>> {
        self.records
            .lock()
            .map_err(|_| anyhow!("memory remote lock poisoned"))
    }
}

impl RemoteStore for MemoryRemote {
    fn find(&self, path: &str) -> Result<Option<RemoteRecord>> {
        Ok(self.lock()?.get(path).cloned())
    }

    fn replace(&self, record: &RemoteRecord, upsert: bool) -> Result<ReplaceOutcome> {
        let mut records = self.lock()?;
        match records.get_mut(&record.path) {
            Some(existing) => {
                let modified = u64::from(existing != record);
                *existing = record.clone();
                Ok(ReplaceOutcome {
                    matched: 1,
                    modified,
                    upserted: false,
                })
            }
            None if upsert => {
                records.insert(record.path.clone(), record.clone());
                Ok(ReplaceOutcome {
                    matched: 0,
                    modified: 0,
                    upserted: true,
                })
            }
            None => Ok(ReplaceOutcome::default()),
        }
    }

    fn insert(&self, record: &RemoteRecord) -> Result<()> {
        let mut records = self.lock()?;
        if records.contains_key(&record.path) {
            bail!("duplicate key: record for {} already exists", record.path);
        }
        records.insert(record.path.clone(), record.clone());
        Ok(())
    }
}

/// The remote tier as the coordinator sees it.
///
/// Inactive when built without a store; every operation is then a no-op
/// returning `None`/`false`.
#[derive(Clone, Default)]
pub struct RemoteTier {
    store: Option<Arc<dyn RemoteStore>>,
}

impl RemoteTier {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store: Some(store) }
    }

    /// A tier with no connection.
    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn is_active(&self) -> bool {
        self.store.is_some()
    }

    /// Content stored remotely for `path`, if any.
    ///
    /// Backend errors are logged and reported as absent.
    pub fn fetch(&self, path: &str) -> Option<String> {
        let store = self.store.as_ref()?;
        debug!("Get remote record {}", path);

        match store.find(path) {
            Ok(record) => record.map(|r| r.content),
            Err(e) => {
                warn!("Get remote record {} failed: {:#}", path, e);
                None
            }
        }
    }

    /// Write `content` for `path`, creating the record if needed.
    ///
    /// Returns true if a record was modified or inserted. Failures are
    /// logged and return false.
    pub fn upsert(&self, path: &str, content: &str) -> bool {
        let Some(store) = self.store.as_ref() else {
            return false;
        };
        debug!("Save remote record {}", path);

        match store.find(path) {
            Ok(Some(mut record)) => {
                record.update(content);
                // upsert covers a delete landing between find and replace
                match store.replace(&record, true) {
                    Ok(outcome) => outcome.modified > 0 || outcome.upserted,
                    Err(e) => {
                        warn!("Replace remote record {} failed: {:#}", path, e);
                        false
                    }
                }
            }
            Ok(None) => match store.insert(&RemoteRecord::new(path, content)) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Save remote record {} failed: {:#}", path, e);
                    false
                }
            },
            Err(e) => {
                warn!("Save remote record {} failed: {:#}", path, e);
                false
            }
        }
    }
}

impl fmt::Debug for RemoteTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteTier")
            .field("active", &self.is_active())
            .finish()
    }
}
