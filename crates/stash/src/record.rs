//! Remote tier record shape.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One remote document per distinct relative path.
///
/// `path` is the relative path produced by
/// [`StorageKey::relative_path`](crate::StorageKey::relative_path), the
/// same string the local tier uses under its storage root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRecord {
    pub path: String,
    pub content: String,
    /// Milliseconds since the Unix epoch of the last write.
    pub updated_at: i64,
}

impl RemoteRecord {
    /// A fresh record stamped with the current time.
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            updated_at: now_millis(),
        }
    }

    /// Replace the content and bump `updated_at`.
    pub fn update(&mut self, content: impl Into<String>) {
        self.content = content.into();
        self.updated_at = now_millis();
    }
}

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_is_stamped() {
        let before = now_millis();
        let record = RemoteRecord::new("books/1.json", "{}");
        assert_eq!(record.path, "books/1.json");
        assert_eq!(record.content, "{}");
        assert!(record.updated_at >= before);
    }

    #[test]
    fn test_update_bumps_timestamp() {
        let mut record = RemoteRecord {
            path: "a.json".to_string(),
            content: "old".to_string(),
            updated_at: 0,
        };
        record.update("new");
        assert_eq!(record.content, "new");
        assert!(record.updated_at > 0);
    }

    #[test]
    fn test_serde_field_names() {
        let record = RemoteRecord {
            path: "a.json".to_string(),
            content: "x".to_string(),
            updated_at: 42,
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["path"], "a.json");
        assert_eq!(value["content"], "x");
        assert_eq!(value["updated_at"], 42);
    }
}
