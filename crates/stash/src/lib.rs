//! Tiered named-blob storage.
//!
//! Content (usually JSON) is stored under hierarchical keys in two tiers:
//! - **local**: files under `{WorkingRoot}/storage/`, always written,
//!   always read first
//! - **remote**: an optional document store consulted when the local file
//!   is missing or empty; hits are written back to the local tier
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use stash::TieredStorage;
//! use serde_json::json;
//!
//! // Local only, rooted at a fixed directory
//! let storage = TieredStorage::at_path("/var/lib/reader");
//!
//! // Writes /var/lib/reader/storage/books/123.json
//! storage.save(["books", "123"], &json!({"title": "Foo"}), false).unwrap();
//!
//! let text = storage.get(["books", "123"]).unwrap();
//! assert_eq!(text.as_deref(), Some(r#"{"title":"Foo"}"#));
//! ```
//!
//! With a remote tier:
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stash::{RemoteTier, SqliteRemote, TieredStorage};
//! use stashconf::WorkDirResolver;
//!
//! let remote = SqliteRemote::open("/mnt/shared/stash.db", "storage").unwrap();
//! let storage = TieredStorage::new(
//!     Arc::new(WorkDirResolver::from_host(None)),
//!     RemoteTier::new(Arc::new(remote)),
//! );
//! let _ = storage.get(["users", "alice", "bookshelf"]);
//! ```
//!
//! # Consistency
//!
//! No transactions span the tiers. Writes are last-writer-wins in both;
//! see [`remote`] for the upsert race.

pub mod codec;
pub mod error;
pub mod key;
pub mod local;
pub mod record;
pub mod remote;
pub mod sqlite;
pub mod storage;

// Re-exports for convenience
pub use codec::{Codec, CodecError, JsonCodec};
pub use error::{Result, StorageError};
pub use key::{to_relative_path, IntoStorageKey, KeyError, StorageKey, CONTENT_SUFFIX};
pub use local::LocalCacheTier;
pub use record::RemoteRecord;
pub use remote::{MemoryRemote, RemoteStore, RemoteTier, ReplaceOutcome};
pub use sqlite::SqliteRemote;
pub use storage::{TieredStorage, STORAGE_DIR};
