//! StorageKey: hierarchical key segments and their relative path.
//!
//! A key like `["books", "123"]` maps to `books/123.json`. That relative
//! path is used twice: under `{root}/storage/` on local disk, and verbatim
//! as the remote record's lookup key. Both tiers must agree on it or
//! backfill would write to the wrong place, so it is derived in exactly
//! one place.

use std::borrow::Cow;
use std::fmt;
use std::path::{PathBuf, MAIN_SEPARATOR};

use thiserror::Error;

/// Extension appended to the item name.
pub const CONTENT_SUFFIX: &str = ".json";

/// Errors that can occur when building a storage key.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum KeyError {
    #[error("storage key has no segments")]
    Empty,

    #[error("storage key has an empty item name")]
    EmptyName,

    #[error("reserved path segment in storage key: {0:?}")]
    Reserved(String),
}

/// An ordered key: namespace segments followed by an item name.
///
/// Empty namespace segments are dropped on construction, so `["a", "", "c"]`
/// and `["a", "c"]` are the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey {
    namespace: Vec<String>,
    name: String,
}

impl StorageKey {
    /// Build a key from segments. The last segment is the item name.
    pub fn new<I, S>(segments: I) -> Result<Self, KeyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut segments: Vec<String> = segments
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();

        let name = segments.pop().ok_or(KeyError::Empty)?;
        if name.is_empty() {
            return Err(KeyError::EmptyName);
        }

        if let Some(bad) = segments
            .iter()
            .chain(std::iter::once(&name))
            .find(|s| *s == "." || *s == "..")
        {
            return Err(KeyError::Reserved(bad.clone()));
        }

        segments.retain(|s| !s.is_empty());

        Ok(Self {
            namespace: segments,
            name,
        })
    }

    /// The item name (last segment).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Namespace segments, empty ones already removed.
    pub fn namespace(&self) -> &[String] {
        &self.namespace
    }

    /// Relative path of the content file, e.g. `books/123.json`.
    ///
    /// Never starts with a separator. Separators inside a segment are
    /// percent-escaped so a segment always stays one path component.
    pub fn relative_path(&self) -> String {
        let mut path = String::new();
        for segment in &self.namespace {
            path.push(MAIN_SEPARATOR);
            path.push_str(&escape_segment(segment));
        }
        path.push(MAIN_SEPARATOR);
        path.push_str(&escape_segment(&self.name));
        path.push_str(CONTENT_SUFFIX);

        match path.strip_prefix(MAIN_SEPARATOR) {
            Some(stripped) => stripped.to_string(),
            None => path,
        }
    }

    /// [`relative_path`](Self::relative_path) as a `PathBuf`.
    pub fn to_path(&self) -> PathBuf {
        PathBuf::from(self.relative_path())
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.namespace {
            write!(f, "{}/", segment)?;
        }
        write!(f, "{}", self.name)
    }
}

/// Relative path for raw segments. See [`StorageKey::relative_path`].
pub fn to_relative_path<I, S>(segments: I) -> Result<String, KeyError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    StorageKey::new(segments).map(|key| key.relative_path())
}

fn escape_segment(segment: &str) -> Cow<'_, str> {
    if !segment.contains(['%', '/', '\\']) {
        return Cow::Borrowed(segment);
    }

    let mut escaped = String::with_capacity(segment.len() + 4);
    for c in segment.chars() {
        match c {
            '%' => escaped.push_str("%25"),
            '/' => escaped.push_str("%2F"),
            '\\' => escaped.push_str("%5C"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Anything that can name a stored item.
pub trait IntoStorageKey {
    fn into_storage_key(self) -> Result<StorageKey, KeyError>;
}

impl IntoStorageKey for StorageKey {
    fn into_storage_key(self) -> Result<StorageKey, KeyError> {
        Ok(self)
    }
}

impl IntoStorageKey for &StorageKey {
    fn into_storage_key(self) -> Result<StorageKey, KeyError> {
        Ok(self.clone())
    }
}

impl<S: AsRef<str>> IntoStorageKey for &[S] {
    fn into_storage_key(self) -> Result<StorageKey, KeyError> {
        StorageKey::new(self)
    }
}

impl<S: AsRef<str>, const N: usize> IntoStorageKey for [S; N] {
    fn into_storage_key(self) -> Result<StorageKey, KeyError> {
        StorageKey::new(self)
    }
}

impl<S: AsRef<str>> IntoStorageKey for Vec<S> {
    fn into_storage_key(self) -> Result<StorageKey, KeyError> {
        StorageKey::new(self)
    }
}

impl<S: AsRef<str>> IntoStorageKey for &Vec<S> {
    fn into_storage_key(self) -> Result<StorageKey, KeyError> {
        StorageKey::new(self)
    }
}
