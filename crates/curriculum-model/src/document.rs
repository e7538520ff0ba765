//! The unit of input: one typed CMS record.

use crate::schema::DocumentType;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Prefix the CMS puts on unpublished draft records.
pub const DRAFT_PREFIX: &str = "drafts.";

/// A CMS document, read-only for the duration of a conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub doc_type: DocumentType,
    /// CMS record id (`_id`) without the draft prefix. References target this.
    pub key: String,
    /// Slug (`id.current`, falling back to `key`). Identifiers are minted from it.
    pub slug: String,
    /// Where the record was read from, e.g. `subjects[2]`.
    pub locator: String,
    /// `true` if this record was read from a draft overlay.
    #[serde(default)]
    pub draft: bool,
    pub fields: Map<String, Value>,
}

impl Document {
    /// Field value, treating JSON `null` as absent.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name).filter(|v| !v.is_null())
    }

    /// Short reference used in fault reports.
    pub fn doc_ref(&self) -> DocRef {
        DocRef {
            doc_type: self.doc_type,
            key: self.key.clone(),
            locator: self.locator.clone(),
        }
    }
}

/// Identifies a source record in fault reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocRef {
    pub doc_type: DocumentType,
    pub key: String,
    pub locator: String,
}

impl fmt::Display for DocRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}` ({})", self.doc_type, self.key, self.locator)
    }
}

/// Strip the draft prefix from a record id.
pub fn published_key(id: &str) -> &str {
    id.strip_prefix(DRAFT_PREFIX).unwrap_or(id)
}

/// Extract the referenced record key from a CMS reference object
/// (`{"_type": "reference", "_ref": "..."}`).
pub fn reference_key(value: &Value) -> Option<&str> {
    value
        .as_object()?
        .get("_ref")?
        .as_str()
        .map(published_key)
        .filter(|k| !k.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn reference_key_reads_ref_objects_only() {
        assert_eq!(
            reference_key(&json!({"_type": "reference", "_ref": "phase-primary"})),
            Some("phase-primary")
        );
        assert_eq!(
            reference_key(&json!({"_ref": "drafts.phase-primary"})),
            Some("phase-primary")
        );
        assert_eq!(reference_key(&json!("phase-primary")), None);
        assert_eq!(reference_key(&json!({"_ref": ""})), None);
        assert_eq!(reference_key(&json!({"_key": "x"})), None);
    }

    #[test]
    fn null_fields_read_as_absent() {
        let mut fields = Map::new();
        fields.insert("definition".to_string(), Value::Null);
        let doc = Document {
            doc_type: DocumentType::Strand,
            key: "strand-a".to_string(),
            slug: "strand-a".to_string(),
            locator: "strands[0]".to_string(),
            draft: false,
            fields,
        };
        assert!(doc.field("definition").is_none());
        assert_eq!(
            doc.doc_ref().to_string(),
            "Strand `strand-a` (strands[0])"
        );
    }
}
