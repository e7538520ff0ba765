//! Document graph loader.
//!
//! Normalizes a CMS snapshot into a flat list of typed [`Document`]s.
//! Two input shapes are accepted:
//!
//! - the grouped snapshot (`{"phases": [...], "subjects": [...], ...}`),
//!   where the collection key names the type, and
//! - the flat array a CMS query returns (`[{"_type": "phase", ...}, ...]`,
//!   optionally wrapped as `{"result": [...]}`).
//!
//! Bad records do not stop loading: each becomes a [`Fault::Malformed`] and
//! the resolver reports them together with everything else it finds.

use crate::fault::Fault;
use anyhow::{Context, Result};
use curriculum_model::document::{published_key, DRAFT_PREFIX};
use curriculum_model::{Document, DocumentType};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;

/// CMS-internal document types that never carry curriculum content.
const SYSTEM_TYPE_PREFIXES: &[&str] = &["system.", "sanity."];

/// Loader output: a partial graph plus the records that could not be read.
#[derive(Debug, Clone, Default)]
pub struct LoadedDocuments {
    pub documents: Vec<Document>,
    pub faults: Vec<Fault>,
}

impl LoadedDocuments {
    pub fn count_of(&self, doc_type: DocumentType) -> usize {
        self.documents
            .iter()
            .filter(|d| d.doc_type == doc_type)
            .count()
    }
}

pub fn load_snapshot_file(path: &Path) -> Result<LoadedDocuments> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot {}", path.display()))?;
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("snapshot {} is not valid JSON", path.display()))?;
    Ok(load_snapshot(&value))
}

pub fn load_snapshot(value: &Value) -> LoadedDocuments {
    let mut out = LoadedDocuments::default();

    match value {
        Value::Array(records) => load_flat(records, &mut out),
        Value::Object(map) => match map.get("result") {
            Some(Value::Array(records)) if !has_known_collection(map) => {
                load_flat(records, &mut out)
            }
            _ => load_grouped(map, &mut out),
        },
        _ => out.faults.push(Fault::Malformed {
            locator: "<snapshot>".to_string(),
            reason: "snapshot must be a JSON object of collections or an array of documents"
                .to_string(),
        }),
    }

    drop_shadowed_drafts(&mut out.documents);

    tracing::info!(
        documents = out.documents.len(),
        malformed = out.faults.len(),
        "loaded document snapshot"
    );
    out
}

fn has_known_collection(map: &Map<String, Value>) -> bool {
    map.keys().any(|k| DocumentType::from_collection(k).is_some())
}

fn load_flat(records: &[Value], out: &mut LoadedDocuments) {
    for (i, record) in records.iter().enumerate() {
        push_record(record, format!("[{i}]"), None, out);
    }
}

fn load_grouped(map: &Map<String, Value>, out: &mut LoadedDocuments) {
    for key in map.keys() {
        if DocumentType::from_collection(key).is_none() {
            tracing::debug!(collection = %key, "ignoring unknown snapshot collection");
        }
    }

    for doc_type in DocumentType::ALL {
        let collection = doc_type.collection();
        let Some(value) = map.get(collection) else {
            continue;
        };
        let Some(records) = value.as_array() else {
            out.faults.push(Fault::Malformed {
                locator: collection.to_string(),
                reason: "collection must be an array of documents".to_string(),
            });
            continue;
        };
        for (i, record) in records.iter().enumerate() {
            push_record(record, format!("{collection}[{i}]"), Some(doc_type), out);
        }
    }
}

fn push_record(
    record: &Value,
    locator: String,
    listed_as: Option<DocumentType>,
    out: &mut LoadedDocuments,
) {
    match read_record(record, &locator, listed_as) {
        Ok(Some(doc)) => out.documents.push(doc),
        Ok(None) => tracing::debug!(%locator, "skipping CMS system record"),
        Err(reason) => out.faults.push(Fault::Malformed { locator, reason }),
    }
}

/// `Ok(None)` means the record is a CMS system record and is skipped.
fn read_record(
    record: &Value,
    locator: &str,
    listed_as: Option<DocumentType>,
) -> std::result::Result<Option<Document>, String> {
    let Some(obj) = record.as_object() else {
        return Err("record is not a JSON object".to_string());
    };

    let type_tag = match obj.get("_type") {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.as_str()),
        Some(_) => return Err("`_type` must be a string".to_string()),
    };

    let doc_type = match (type_tag, listed_as) {
        (None, None) => return Err("missing `_type`".to_string()),
        (None, Some(listed)) => listed,
        (Some(tag), listed) => match DocumentType::from_type_tag(tag) {
            Some(declared) => {
                if let Some(listed) = listed {
                    if listed != declared {
                        return Err(format!(
                            "declares `_type` `{tag}` but is listed under `{}`",
                            listed.collection()
                        ));
                    }
                }
                declared
            }
            None if SYSTEM_TYPE_PREFIXES.iter().any(|p| tag.starts_with(p)) => {
                return Ok(None);
            }
            None => return Err(format!("unknown document type `{tag}`")),
        },
    };

    let raw_id = match obj.get("_id") {
        Some(Value::String(s)) if !published_key(s).is_empty() => s.as_str(),
        Some(Value::String(_)) | None | Some(Value::Null) => {
            return Err("missing `_id`".to_string())
        }
        Some(_) => return Err("`_id` must be a string".to_string()),
    };
    let key = published_key(raw_id).to_string();

    let slug = match obj.get("id") {
        Some(Value::Object(slug)) => match slug.get("current") {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            _ => key.clone(),
        },
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        _ => key.clone(),
    };

    let fields: Map<String, Value> = obj
        .iter()
        .filter(|(k, _)| !k.starts_with('_') && k.as_str() != "id")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(Some(Document {
        doc_type,
        key,
        slug,
        locator: locator.to_string(),
        draft: raw_id.starts_with(DRAFT_PREFIX),
        fields,
    }))
}

/// A draft overlay is dropped when its published record is present; a draft
/// without a published record stands in for it.
fn drop_shadowed_drafts(documents: &mut Vec<Document>) {
    let published: HashSet<String> = documents
        .iter()
        .filter(|d| !d.draft)
        .map(|d| d.key.clone())
        .collect();

    documents.retain(|d| {
        if !d.draft {
            return true;
        }
        if published.contains(&d.key) {
            tracing::debug!(
                key = %d.key,
                locator = %d.locator,
                "dropping draft shadowed by published record"
            );
            false
        } else {
            tracing::warn!(key = %d.key, locator = %d.locator, "using unpublished draft record");
            true
        }
    });
}
