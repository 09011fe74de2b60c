//! Input documents

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A unit of input text handed to the extractor
///
/// Every [`GraphResult`](crate::GraphResult) carries a copy of the document it
/// was extracted from, so callers can trace a graph back to its source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier (UUIDv7 unless supplied by the caller)
    pub id: String,

    /// Text content to extract a graph from
    pub text: String,

    /// Free-form metadata (file path, source URL, ...)
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl Document {
    /// Create a document with a freshly generated UUIDv7 identifier
    ///
    /// # Examples
    ///
    /// ```
    /// use graphweaver_domain::Document;
    ///
    /// let doc = Document::new("Adam works for Microsoft.");
    /// assert_eq!(doc.id.len(), 36);
    /// ```
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::now_v7().to_string(), text)
    }

    /// Create a document with a caller-supplied identifier
    pub fn with_id(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: BTreeMap::new(),
        }
    }

    /// Attach a metadata entry
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_gets_unique_ids() {
        let a = Document::new("a");
        let b = Document::new("b");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_with_id_and_metadata() {
        let doc = Document::with_id("doc-1", "text").with_metadata("path", "notes.txt");
        assert_eq!(doc.id, "doc-1");
        assert_eq!(doc.metadata.get("path").map(String::as_str), Some("notes.txt"));
    }
}
