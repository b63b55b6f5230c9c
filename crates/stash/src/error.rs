//! Errors surfaced by [`TieredStorage`](crate::TieredStorage).
//!
//! Only the local tier decides whether a call failed. Remote tier
//! problems are logged inside [`RemoteTier`](crate::RemoteTier) and never
//! show up here.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::codec::CodecError;
use crate::key::KeyError;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl StorageError {
    /// `map_err` adapter for filesystem calls.
    pub(crate) fn io<'a>(
        action: &'static str,
        path: &'a Path,
    ) -> impl FnOnce(io::Error) -> Self + 'a {
        move |source| StorageError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

pub type Result<T, E = StorageError> = std::result::Result<T, E>;
