//! SqliteRemote: a [`RemoteStore`] backed by a SQLite document table.
//!
//! The database file can live on shared storage so several hosts see the
//! same records. Each call opens its own connection in WAL mode with a
//! busy timeout, which keeps the handle `Send + Sync` without a pool.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, TransactionBehavior};

use crate::record::RemoteRecord;
use crate::remote::{RemoteStore, ReplaceOutcome};

/// Remote document store in a SQLite file.
#[derive(Debug, Clone)]
pub struct SqliteRemote {
    path: PathBuf,
    collection: String,
}

impl SqliteRemote {
    /// Open (creating if necessary) the database at `path`, storing
    /// records in table `collection`.
    pub fn open(path: impl AsRef<Path>, collection: &str) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if collection.is_empty()
            || !collection
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            bail!("invalid collection name: {:?}", collection);
        }

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create remote database directory")?;
            }
        }

        let remote = Self {
            path,
            collection: collection.to_string(),
        };
        remote.initialize()?;
        Ok(remote)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Get a connection with WAL mode and busy timeout
    fn conn(&self) -> Result<Connection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("Failed to open remote database: {:?}", self.path))?;

        conn.execute_batch(
            "
            PRAGMA busy_timeout = 5000;
            PRAGMA journal_mode = WAL;
        ",
        )?;

        Ok(conn)
    }

    fn initialize(&self) -> Result<()> {
        let conn = self.conn()?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {c} (
                path TEXT PRIMARY KEY,
                content TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );",
            c = self.collection
        ))
        .context("Failed to initialize remote schema")?;
        Ok(())
    }

    fn find_in(conn: &Connection, collection: &str, path: &str) -> Result<Option<RemoteRecord>> {
        let record = conn
            .query_row(
                &format!("SELECT path, content, updated_at FROM {collection} WHERE path = ?1"),
                [path],
                |row| {
                    Ok(RemoteRecord {
                        path: row.get(0)?,
                        content: row.get(1)?,
                        updated_at: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }
}

impl RemoteStore for SqliteRemote {
    fn find(&self, path: &str) -> Result<Option<RemoteRecord>> {
        let conn = self.conn()?;
        Self::find_in(&conn, &self.collection, path)
    }

    fn replace(&self, record: &RemoteRecord, upsert: bool) -> Result<ReplaceOutcome> {
        let mut conn = self.conn()?;
        // IMMEDIATE takes the write lock up front; a deferred read-then-write
        // upgrade fails with SQLITE_BUSY in WAL mode without waiting.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = Self::find_in(&tx, &self.collection, &record.path)?;
        let outcome = match existing {
            Some(existing) => {
                let modified = if existing != *record {
                    tx.execute(
                        &format!(
                            "UPDATE {} SET content = ?2, updated_at = ?3 WHERE path = ?1",
                            self.collection
                        ),
                        params![record.path, record.content, record.updated_at],
                    )? as u64
                } else {
                    0
                };
                ReplaceOutcome {
                    matched: 1,
                    modified,
                    upserted: false,
                }
            }
            None if upsert => {
                tx.execute(
                    &format!(
                        "INSERT INTO {} (path, content, updated_at) VALUES (?1, ?2, ?3)",
                        self.collection
                    ),
                    params![record.path, record.content, record.updated_at],
                )?;
                ReplaceOutcome {
                    matched: 0,
                    modified: 0,
                    upserted: true,
                }
            }
            None => ReplaceOutcome::default(),
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn insert(&self, record: &RemoteRecord) -> Result<()> {
        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO {} (path, content, updated_at) VALUES (?1, ?2, ?3)",
                self.collection
            ),
            params![record.path, record.content, record.updated_at],
        )
        .with_context(|| format!("Failed to insert remote record {}", record.path))?;
        Ok(())
    }
}
