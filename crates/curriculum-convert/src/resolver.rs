//! Reference resolution and validation gate.
//!
//! The resolver is the only stage that can fail. It indexes every document
//! by record key and by minted identifier *before* looking at any field, so
//! resolution never depends on input order, then checks every field of every
//! document against its type's field table. All faults are accumulated; the
//! caller gets either a fully resolved graph or the complete fault list.
//!
//! The resolved structure is an explicit node/edge index keyed by minted
//! identifier: a Scheme's content-descriptor list and a Progression's
//! substrand link that reach the same downstream node share that node.

use crate::fault::{Fault, FaultReport};
use crate::loader::LoadedDocuments;
use crate::minter::Minter;
use crate::partition::{subject_key, SUBJECTS_DIR};
use curriculum_model::document::reference_key;
use curriculum_model::{DocRef, Document, DocumentType, FieldKind, FieldSpec};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Position of a node in [`ResolvedGraph::nodes`]; nodes are sorted by
/// minted identifier, so `NodeId` order is identifier order.
pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Integer(u64),
    Url(String),
    Reference(NodeId),
    /// Distinct targets in identifier order.
    References(Vec<NodeId>),
    Aims(Vec<String>),
}

impl FieldValue {
    fn map_references(self, f: impl Fn(usize) -> NodeId) -> FieldValue {
        match self {
            FieldValue::Reference(t) => FieldValue::Reference(f(t)),
            FieldValue::References(ts) => {
                let mut ts: Vec<NodeId> = ts.into_iter().map(f).collect();
                ts.sort_unstable();
                ts.dedup();
                FieldValue::References(ts)
            }
            other => other,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedNode {
    pub iri: String,
    pub document: Document,
    /// Present fields, in field-table order.
    pub values: Vec<(&'static FieldSpec, FieldValue)>,
}

impl ResolvedNode {
    pub fn doc_type(&self) -> DocumentType {
        self.document.doc_type
    }

    pub fn value(&self, field: &str) -> Option<&FieldValue> {
        self.values
            .iter()
            .find(|(spec, _)| spec.name == field)
            .map(|(_, v)| v)
    }

    pub fn reference(&self, field: &str) -> Option<NodeId> {
        match self.value(field)? {
            FieldValue::Reference(t) => Some(*t),
            _ => None,
        }
    }
}

/// A typed edge created by a reference field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Edge {
    pub source: NodeId,
    pub field: &'static str,
    pub target: NodeId,
}

#[derive(Debug, Clone, Default)]
pub struct ResolvedGraph {
    nodes: Vec<ResolvedNode>,
    index: BTreeMap<String, NodeId>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

impl ResolvedGraph {
    pub fn nodes(&self) -> &[ResolvedNode] {
        &self.nodes
    }

    pub fn node(&self, id: NodeId) -> &ResolvedNode {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn id_of(&self, iri: &str) -> Option<NodeId> {
        self.index.get(iri).copied()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn outgoing(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.outgoing[id].iter().map(move |&e| &self.edges[e])
    }

    pub fn incoming(&self, id: NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.incoming[id].iter().map(move |&e| &self.edges[e])
    }

    pub fn of_type(&self, doc_type: DocumentType) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(move |(_, n)| n.doc_type() == doc_type)
            .map(|(id, _)| id)
    }
}

/// Resolve and validate a loaded document set.
///
/// Loader faults are carried into the report, so a single run surfaces
/// unreadable records and bad references together.
pub fn resolve(loaded: LoadedDocuments, minter: &Minter) -> Result<ResolvedGraph, FaultReport> {
    let LoadedDocuments {
        documents,
        mut faults,
    } = loaded;

    let mut by_key: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (i, doc) in documents.iter().enumerate() {
        by_key.entry(doc.key.as_str()).or_default().push(i);
    }
    for (key, idxs) in &by_key {
        if idxs.len() > 1 {
            faults.push(Fault::DuplicateIdentifier {
                identifier: (*key).to_string(),
                sources: idxs.iter().map(|&i| documents[i].doc_ref()).collect(),
            });
        }
    }

    let mut by_iri: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, doc) in documents.iter().enumerate() {
        if Minter::is_valid_slug(&doc.slug) {
            by_iri
                .entry(minter.mint(doc.doc_type, &doc.slug))
                .or_default()
                .push(i);
        } else {
            faults.push(Fault::validation(
                &doc.doc_ref(),
                "id",
                format!("slug `{}` cannot be used as an identifier", doc.slug),
            ));
        }
    }
    for (iri, idxs) in &by_iri {
        let distinct_keys: BTreeSet<&str> =
            idxs.iter().map(|&i| documents[i].key.as_str()).collect();
        // Records sharing one key were already reported above.
        if distinct_keys.len() > 1 {
            faults.push(Fault::DuplicateIdentifier {
                identifier: iri.clone(),
                sources: idxs.iter().map(|&i| documents[i].doc_ref()).collect(),
            });
        }
    }

    faults.extend(subject_key_collisions(&documents));

    let lookup = KeyIndex {
        documents: &documents,
        by_key: &by_key,
    };
    let mut pending: Vec<Vec<(&'static FieldSpec, FieldValue)>> =
        Vec::with_capacity(documents.len());
    for doc in &documents {
        pending.push(check_fields(doc, &lookup, &mut faults));
    }

    if !faults.is_empty() {
        let report = FaultReport::new(faults);
        tracing::info!(faults = report.len(), "document graph rejected");
        return Err(report);
    }

    // No faults: every IRI maps to exactly one document.
    let mut node_of_doc = vec![0usize; documents.len()];
    let mut order: Vec<(String, usize)> = Vec::with_capacity(documents.len());
    for (iri, idxs) in by_iri {
        for i in idxs {
            order.push((iri.clone(), i));
        }
    }
    for (node_id, (_, doc_idx)) in order.iter().enumerate() {
        node_of_doc[*doc_idx] = node_id;
    }

    let mut documents: Vec<Option<Document>> = documents.into_iter().map(Some).collect();
    let mut pending: Vec<Option<Vec<(&'static FieldSpec, FieldValue)>>> =
        pending.into_iter().map(Some).collect();

    let mut graph = ResolvedGraph::default();
    for (node_id, (iri, doc_idx)) in order.into_iter().enumerate() {
        let (Some(document), Some(values)) = (documents[doc_idx].take(), pending[doc_idx].take())
        else {
            continue;
        };
        let values: Vec<(&'static FieldSpec, FieldValue)> = values
            .into_iter()
            .map(|(spec, v)| (spec, v.map_references(|i| node_of_doc[i])))
            .collect();

        for (spec, value) in &values {
            match value {
                FieldValue::Reference(target) => graph.edges.push(Edge {
                    source: node_id,
                    field: spec.name,
                    target: *target,
                }),
                FieldValue::References(targets) => {
                    graph.edges.extend(targets.iter().map(|&target| Edge {
                        source: node_id,
                        field: spec.name,
                        target,
                    }))
                }
                _ => {}
            }
        }

        graph.index.insert(iri.clone(), node_id);
        graph.nodes.push(ResolvedNode {
            iri,
            document,
            values,
        });
    }

    graph.edges.sort();
    graph.outgoing = vec![Vec::new(); graph.nodes.len()];
    graph.incoming = vec![Vec::new(); graph.nodes.len()];
    for (e, edge) in graph.edges.iter().enumerate() {
        graph.outgoing[edge.source].push(e);
        graph.incoming[edge.target].push(e);
    }

    tracing::info!(
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "document graph resolved"
    );
    Ok(graph)
}

struct KeyIndex<'a> {
    documents: &'a [Document],
    by_key: &'a BTreeMap<&'a str, Vec<usize>>,
}

impl KeyIndex<'_> {
    /// Resolve `target_key` for `field`, recording a fault when it does not
    /// name a document of the declared type.
    fn resolve(
        &self,
        source: &DocRef,
        field: &str,
        target_key: &str,
        expected: DocumentType,
        faults: &mut Vec<Fault>,
    ) -> Option<usize> {
        let Some(&idx) = self.by_key.get(target_key).and_then(|idxs| idxs.first()) else {
            faults.push(Fault::MissingReference {
                document: source.clone(),
                field: field.to_string(),
                target: target_key.to_string(),
            });
            return None;
        };
        let found = self.documents[idx].doc_type;
        if found != expected {
            faults.push(Fault::TypeMismatch {
                document: source.clone(),
                field: field.to_string(),
                target: target_key.to_string(),
                expected,
                found,
            });
            return None;
        }
        Some(idx)
    }
}

/// Subjects whose slugs differ but reduce to one subject key would share
/// one set of partition files. Identical slugs are already reported as a
/// duplicate identifier.
fn subject_key_collisions(documents: &[Document]) -> Vec<Fault> {
    let mut by_subject: BTreeMap<&str, Vec<&Document>> = BTreeMap::new();
    for doc in documents
        .iter()
        .filter(|d| d.doc_type == DocumentType::Subject && Minter::is_valid_slug(&d.slug))
    {
        by_subject.entry(subject_key(&doc.slug)).or_default().push(doc);
    }

    by_subject
        .into_iter()
        .filter(|(_, docs)| {
            let slugs: BTreeSet<&str> = docs.iter().map(|d| d.slug.as_str()).collect();
            slugs.len() > 1
        })
        .map(|(key, docs)| Fault::DuplicateIdentifier {
            identifier: format!("{SUBJECTS_DIR}/{key}"),
            sources: docs.iter().map(|d| d.doc_ref()).collect(),
        })
        .collect()
}

/// Check every declared field of `doc`. References hold *document indices*
/// in the returned values; `resolve` maps them to node ids afterwards.
fn check_fields(
    doc: &Document,
    lookup: &KeyIndex<'_>,
    faults: &mut Vec<Fault>,
) -> Vec<(&'static FieldSpec, FieldValue)> {
    let source = doc.doc_ref();
    let mut values = Vec::new();

    for spec in doc.doc_type.fields() {
        let Some(raw) = doc.field(spec.name) else {
            if spec.required {
                faults.push(Fault::validation(&source, spec.name, "required field is missing"));
            }
            continue;
        };

        match check_value(&source, spec, raw, lookup, faults) {
            Ok(Some(value)) => values.push((spec, value)),
            Ok(None) => {
                if spec.required {
                    faults.push(Fault::validation(&source, spec.name, "required field is empty"));
                }
            }
            Err(reason) => faults.push(Fault::validation(&source, spec.name, reason)),
        }
    }

    values
}

/// `Ok(None)` means the field is present but empty.
fn check_value(
    source: &DocRef,
    spec: &FieldSpec,
    raw: &Value,
    lookup: &KeyIndex<'_>,
    faults: &mut Vec<Fault>,
) -> Result<Option<FieldValue>, String> {
    match spec.kind {
        FieldKind::Text => {
            let text = raw.as_str().ok_or("expected text")?;
            Ok((!text.trim().is_empty()).then(|| FieldValue::Text(text.to_string())))
        }
        FieldKind::NonNegativeInteger => {
            let n = integer_value(raw)?;
            u64::try_from(n)
                .map(|n| Some(FieldValue::Integer(n)))
                .map_err(|_| format!("must be a non-negative integer (got {n})"))
        }
        FieldKind::PositiveInteger => {
            let n = integer_value(raw)?;
            if n <= 0 {
                return Err(format!("must be a strictly positive integer (got {n})"));
            }
            Ok(Some(FieldValue::Integer(n as u64)))
        }
        FieldKind::Url(_) => {
            let text = raw.as_str().ok_or("expected a URL string")?;
            if text.trim().is_empty() {
                return Ok(None);
            }
            let url =
                url::Url::parse(text.trim()).map_err(|e| format!("invalid URL `{text}`: {e}"))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(format!("URL `{text}` must use http or https"));
            }
            Ok(Some(FieldValue::Url(encode_iri_unsafe(url.as_str()))))
        }
        FieldKind::Reference { target } => {
            let key = reference_key(raw).ok_or("expected a reference")?;
            Ok(lookup
                .resolve(source, spec.name, key, target, faults)
                .map(FieldValue::Reference))
        }
        FieldKind::ReferenceList { target, min } => {
            let items = raw.as_array().ok_or("expected a list of references")?;
            let mut keys: BTreeSet<&str> = BTreeSet::new();
            for (i, item) in items.iter().enumerate() {
                match reference_key(item) {
                    Some(key) => {
                        keys.insert(key);
                    }
                    None => faults.push(Fault::validation(
                        source,
                        spec.name,
                        format!("item {i} is not a reference"),
                    )),
                }
            }
            if keys.len() < min {
                return Err(format!(
                    "requires at least {min} reference(s), found {}",
                    keys.len()
                ));
            }
            let targets: Vec<usize> = keys
                .into_iter()
                .filter_map(|key| lookup.resolve(source, spec.name, key, target, faults))
                .collect();
            if items.is_empty() {
                return Ok(None);
            }
            Ok(Some(FieldValue::References(targets)))
        }
        FieldKind::AimList => {
            let items = raw.as_array().ok_or("expected a list of aims")?;
            let mut aims = Vec::new();
            for (i, item) in items.iter().enumerate() {
                let text = match item {
                    Value::String(s) => Some(s.as_str()),
                    Value::Object(obj) => obj.get("aimText").and_then(Value::as_str),
                    _ => return Err(format!("aim {i} is neither text nor an aim object")),
                };
                match text {
                    Some(t) if !t.trim().is_empty() => aims.push(t.to_string()),
                    _ => {
                        tracing::debug!(document = %source, index = i, "skipping aim without text")
                    }
                }
            }
            Ok((!aims.is_empty()).then_some(FieldValue::Aims(aims)))
        }
    }
}

fn integer_value(raw: &Value) -> Result<i64, String> {
    if let Some(n) = raw.as_i64() {
        return Ok(n);
    }
    if raw.as_u64().is_some() {
        return Err("integer is out of range".to_string());
    }
    match raw.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 => Ok(f as i64),
        Some(f) => Err(format!("must be an integer (got {f})")),
        None => Err("expected an integer".to_string()),
    }
}

/// Percent-encode the ASCII characters `url` may leave raw but an IRI
/// reference forbids (`{`, `}`, `|`, `^`, backtick, backslash, controls).
fn encode_iri_unsafe(url: &str) -> String {
    let mut out = String::with_capacity(url.len());
    for c in url.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                out.push_str(&format!("%{:02X}", c as u32));
            }
            c if c <= ' ' || c == '\u{7f}' => out.push_str(&format!("%{:02X}", c as u32)),
            c => out.push(c),
        }
    }
    out
}
