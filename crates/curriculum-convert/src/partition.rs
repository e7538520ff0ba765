//! Partition routing and ontology headers.
//!
//! Every node is owned by exactly one partition. Programme structure and
//! themes are global; everything else follows its typed edges upward to the
//! subject it belongs to.

use crate::minter::Minter;
use crate::resolver::{NodeId, ResolvedGraph};
use crate::term::{Literal, Statement, Term};
use chrono::NaiveDate;
use curriculum_model::{vocab, DocumentType};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;

/// Directory (relative to the output root) holding per-subject partitions.
pub const SUBJECTS_DIR: &str = "subjects";

const SUBJECT_SLUG_PREFIX: &str = "subject-";
const TITLE_PREFIX: &str = "National Curriculum for England";
const CREATOR: &str = "Department for Education";
const RIGHTS: &str = "Crown Copyright";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SubjectPart {
    /// Subject and sub-subject definitions.
    Definition,
    /// Disciplines down to content sub-descriptors.
    KnowledgeTaxonomy,
    /// Schemes and progressions.
    Schemes,
}

impl SubjectPart {
    pub const ALL: [SubjectPart; 3] = [
        SubjectPart::Definition,
        SubjectPart::KnowledgeTaxonomy,
        SubjectPart::Schemes,
    ];

    fn suffix(self) -> &'static str {
        match self {
            SubjectPart::Definition => "subject",
            SubjectPart::KnowledgeTaxonomy => "knowledge-taxonomy",
            SubjectPart::Schemes => "schemes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PartitionKey {
    ProgrammeStructure,
    Themes,
    /// Taxonomy concepts reachable from no subject.
    SharedTaxonomy,
    Subject { subject: String, part: SubjectPart },
}

impl PartitionKey {
    /// Local name of the partition's ontology IRI.
    pub fn name(&self) -> String {
        match self {
            PartitionKey::ProgrammeStructure => "programme-structure".to_string(),
            PartitionKey::Themes => "themes".to_string(),
            // `eng:knowledge-taxonomy` is the concept scheme itself.
            PartitionKey::SharedTaxonomy => "shared-knowledge-taxonomy".to_string(),
            PartitionKey::Subject { subject, part } => format!("{subject}-{}", part.suffix()),
        }
    }

    /// Output path relative to the output root.
    pub fn relative_path(&self) -> PathBuf {
        match self {
            PartitionKey::ProgrammeStructure => PathBuf::from("programme-structure.ttl"),
            PartitionKey::Themes => PathBuf::from("themes.ttl"),
            PartitionKey::SharedTaxonomy => PathBuf::from("knowledge-taxonomy.ttl"),
            PartitionKey::Subject { subject, .. } => PathBuf::from(SUBJECTS_DIR)
                .join(subject)
                .join(format!("{}.ttl", self.name())),
        }
    }

    pub fn subject(&self) -> Option<&str> {
        match self {
            PartitionKey::Subject { subject, .. } => Some(subject),
            _ => None,
        }
    }

    pub fn title(&self) -> String {
        match self {
            PartitionKey::ProgrammeStructure => format!("{TITLE_PREFIX} - Programme Structure"),
            PartitionKey::Themes => format!("{TITLE_PREFIX} - Themes"),
            PartitionKey::SharedTaxonomy => format!("{TITLE_PREFIX} - Knowledge Taxonomy"),
            PartitionKey::Subject { subject, part } => {
                let part = match part {
                    SubjectPart::Definition => "Subject",
                    SubjectPart::KnowledgeTaxonomy => "Knowledge Taxonomy",
                    SubjectPart::Schemes => "Schemes",
                };
                format!("{TITLE_PREFIX} - {} {part}", subject_title(subject))
            }
        }
    }

    pub fn description(&self) -> String {
        match self {
            PartitionKey::ProgrammeStructure => {
                "Programme structure defining phases, key stages, and year groups.".to_string()
            }
            PartitionKey::Themes => "Cross-cutting themes spanning multiple subjects.".to_string(),
            PartitionKey::SharedTaxonomy => {
                "Knowledge taxonomy concepts not yet affiliated with a subject.".to_string()
            }
            PartitionKey::Subject { subject, part } => {
                let title = subject_title(subject);
                match part {
                    SubjectPart::Definition => {
                        format!("{title} subject definition, including aims and strands.")
                    }
                    SubjectPart::KnowledgeTaxonomy => format!(
                        "{title} knowledge taxonomy from disciplines to content descriptors."
                    ),
                    SubjectPart::Schemes => {
                        format!("{title} schemes mapping content to key stages.")
                    }
                }
            }
        }
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.relative_path().display())
    }
}

/// Subject key used in partition names: the slug without `subject-`.
pub fn subject_key(slug: &str) -> &str {
    match slug.strip_prefix(SUBJECT_SLUG_PREFIX) {
        Some(rest) if !rest.is_empty() => rest,
        _ => slug,
    }
}

/// `"design-and-technology"` -> `"Design And Technology"`.
fn subject_title(key: &str) -> String {
    key.split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// Ontology metadata stamped into every partition header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OntologyMetadata {
    pub version: String,
    /// `dcterms:created`; omitted when `None` so output does not vary by day.
    pub created: Option<NaiveDate>,
}

impl Default for OntologyMetadata {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            created: None,
        }
    }
}

pub fn header_statements(
    key: &PartitionKey,
    minter: &Minter,
    metadata: &OntologyMetadata,
) -> Vec<Statement> {
    let iri = minter.resource(&key.name());
    let title = key.title();
    let s = iri.as_str();

    let english = |text: String| Term::Literal(Literal::english(text));
    let mut out = vec![
        Statement::new(s, vocab::RDF_TYPE, Term::iri(vocab::OWL_ONTOLOGY)),
        Statement::new(s, vocab::RDFS_LABEL, english(title.clone())),
        Statement::new(s, vocab::DC_TITLE, english(title)),
        Statement::new(s, vocab::RDFS_COMMENT, english(key.description())),
        Statement::new(
            s,
            vocab::OWL_VERSION_INFO,
            Term::Literal(Literal::plain(metadata.version.as_str())),
        ),
        Statement::new(
            s,
            vocab::DCTERMS_CREATOR,
            Term::Literal(Literal::plain(CREATOR)),
        ),
        Statement::new(s, vocab::DCTERMS_LICENSE, Term::iri(vocab::OGL_V3_LICENSE)),
        Statement::new(s, vocab::DCTERMS_RIGHTS, english(RIGHTS.to_string())),
        Statement::new(s, vocab::OWL_IMPORTS, Term::iri(vocab::CURRIC)),
    ];
    if let Some(created) = metadata.created {
        out.push(Statement::new(
            s,
            vocab::DCTERMS_CREATED,
            Term::Literal(Literal::typed(created.format("%Y-%m-%d").to_string(), vocab::XSD_DATE)),
        ));
    }
    out
}

/// Declaration of the themes concept scheme (carried by the themes partition).
pub fn themes_scheme_statements(minter: &Minter) -> Vec<Statement> {
    let scheme = crate::mapper::themes_scheme(minter);
    vec![
        Statement::new(scheme.as_str(), vocab::RDF_TYPE, Term::iri(vocab::SKOS_CONCEPT_SCHEME)),
        Statement::new(
            scheme.as_str(),
            vocab::SKOS_PREF_LABEL,
            Term::Literal(Literal::english("Cross-Cutting Themes")),
        ),
    ]
}

/// Field followed upward to find a node's owner.
fn parent_field(doc_type: DocumentType) -> Option<&'static str> {
    match doc_type {
        DocumentType::SubSubject => Some("subject"),
        DocumentType::Scheme => Some("subsubject"),
        DocumentType::Progression => Some("scheme"),
        DocumentType::Strand => Some("discipline"),
        DocumentType::SubStrand => Some("strand"),
        DocumentType::ContentDescriptor => Some("substrand"),
        DocumentType::ContentSubDescriptor => Some("contentDescriptor"),
        _ => None,
    }
}

/// Ownership-resolves every node of a graph to one partition.
#[derive(Debug)]
pub struct Router<'g> {
    graph: &'g ResolvedGraph,
    /// Subject node -> subject key.
    subject_keys: BTreeMap<NodeId, String>,
    /// Discipline node -> owning subject node.
    discipline_owner: BTreeMap<NodeId, NodeId>,
}

impl<'g> Router<'g> {
    /// Subject keys are unique in a resolved graph; the resolver reports
    /// subjects that would share one set of partition files.
    pub fn new(graph: &'g ResolvedGraph) -> Self {
        let subject_keys: BTreeMap<NodeId, String> = graph
            .of_type(DocumentType::Subject)
            .map(|id| (id, subject_key(&graph.node(id).document.slug).to_string()))
            .collect();

        let mut discipline_owner: BTreeMap<NodeId, NodeId> = BTreeMap::new();
        for id in graph.of_type(DocumentType::Discipline) {
            let owner = graph
                .incoming(id)
                .filter(|e| graph.node(e.source).doc_type() == DocumentType::Subject)
                .map(|e| e.source)
                .min_by(|a, b| subject_keys[a].cmp(&subject_keys[b]));
            if let Some(owner) = owner {
                discipline_owner.insert(id, owner);
            }
        }

        Self {
            graph,
            subject_keys,
            discipline_owner,
        }
    }

    /// Every subject key in the graph, sorted.
    pub fn subjects(&self) -> BTreeSet<&str> {
        self.subject_keys.values().map(String::as_str).collect()
    }

    /// The subject node `id` belongs to, if any.
    pub fn subject_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        // Each step follows a required edge to a strictly higher type, so the
        // walk is bounded by the number of types.
        for _ in 0..DocumentType::ALL.len() {
            let node = self.graph.node(current);
            match node.doc_type() {
                DocumentType::Subject => return Some(current),
                DocumentType::Discipline => return self.discipline_owner.get(&current).copied(),
                ty => current = node.reference(parent_field(ty)?)?,
            }
        }
        None
    }

    pub fn route(&self, id: NodeId) -> PartitionKey {
        let doc_type = self.graph.node(id).doc_type();
        let part = match doc_type {
            DocumentType::Phase | DocumentType::KeyStage | DocumentType::YearGroup => {
                return PartitionKey::ProgrammeStructure
            }
            DocumentType::Theme => return PartitionKey::Themes,
            DocumentType::Subject | DocumentType::SubSubject => SubjectPart::Definition,
            DocumentType::Scheme | DocumentType::Progression => SubjectPart::Schemes,
            DocumentType::Discipline
            | DocumentType::Strand
            | DocumentType::SubStrand
            | DocumentType::ContentDescriptor
            | DocumentType::ContentSubDescriptor => SubjectPart::KnowledgeTaxonomy,
        };

        match self.subject_of(id).and_then(|s| self.subject_keys.get(&s)) {
            Some(subject) => PartitionKey::Subject {
                subject: subject.clone(),
                part,
            },
            None => PartitionKey::SharedTaxonomy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_snapshot;
    use crate::resolver::resolve;
    use serde_json::json;

    fn graph() -> ResolvedGraph {
        let snapshot = json!({
            "phases": [{"_id": "phase-secondary", "label": "Secondary", "description": "S",
                        "lowerAgeBoundary": 11, "upperAgeBoundary": 16}],
            "keyStages": [{"_id": "key-stage-3", "label": "KS3", "description": "K",
                           "lowerAgeBoundary": 11, "upperAgeBoundary": 14,
                           "phase": {"_ref": "phase-secondary"}}],
            "subjects": [
                {"_id": "subject-science", "label": "Science", "description": "S",
                 "disciplines": [{"_ref": "discipline-biology"}, {"_ref": "discipline-chemistry"}]},
                {"_id": "subject-chemistry-extra", "label": "Chem", "description": "C",
                 "disciplines": [{"_ref": "discipline-chemistry"}]}
            ],
            "subsubjects": [{"_id": "subsubject-ks3-science", "label": "KS3 Science",
                             "description": "D", "subject": {"_ref": "subject-science"}}],
            "schemes": [{"_id": "scheme-ks3-science", "label": "Scheme", "description": "D",
                         "subsubject": {"_ref": "subsubject-ks3-science"},
                         "keyStage": {"_ref": "key-stage-3"},
                         "contentDescriptors": [{"_ref": "cd-cells"}]}],
            "disciplines": [
                {"_id": "discipline-biology", "prefLabel": "Biology", "definition": "B"},
                {"_id": "discipline-chemistry", "prefLabel": "Chemistry", "definition": "C"},
                {"_id": "discipline-orphan", "prefLabel": "Orphan", "definition": "O"}
            ],
            "strands": [{"_id": "strand-cells", "prefLabel": "Cells",
                         "discipline": {"_ref": "discipline-biology"}}],
            "substrands": [{"_id": "substrand-cells", "prefLabel": "Cells",
                            "strand": {"_ref": "strand-cells"}}],
            "contentDescriptors": [{"_id": "cd-cells", "prefLabel": "Cells",
                                    "substrand": {"_ref": "substrand-cells"}}],
            "themes": [{"_id": "theme-x", "prefLabel": "X", "definition": "X"}]
        });
        resolve(load_snapshot(&snapshot), &Minter::default()).expect("resolves")
    }

    fn route_of(router: &Router<'_>, graph: &ResolvedGraph, slug: &str) -> PartitionKey {
        router.route(graph.id_of(&Minter::default().resource(slug)).expect("node"))
    }

    fn subject_part(subject: &str, part: SubjectPart) -> PartitionKey {
        PartitionKey::Subject {
            subject: subject.to_string(),
            part,
        }
    }

    #[test]
    fn routes_each_type_to_its_partition() {
        let graph = graph();
        let router = Router::new(&graph);
        assert_eq!(route_of(&router, &graph, "key-stage-3"), PartitionKey::ProgrammeStructure);
        assert_eq!(route_of(&router, &graph, "theme-x"), PartitionKey::Themes);
        assert_eq!(
            route_of(&router, &graph, "subsubject-ks3-science"),
            subject_part("science", SubjectPart::Definition)
        );
        assert_eq!(
            route_of(&router, &graph, "scheme-ks3-science"),
            subject_part("science", SubjectPart::Schemes)
        );
        assert_eq!(
            route_of(&router, &graph, "cd-cells"),
            subject_part("science", SubjectPart::KnowledgeTaxonomy)
        );
        assert_eq!(route_of(&router, &graph, "discipline-orphan"), PartitionKey::SharedTaxonomy);
    }

    #[test]
    fn shared_discipline_is_owned_by_smallest_subject_key() {
        let graph = graph();
        let router = Router::new(&graph);
        assert_eq!(
            route_of(&router, &graph, "discipline-chemistry"),
            subject_part("chemistry-extra", SubjectPart::KnowledgeTaxonomy)
        );
        assert_eq!(
            router.subjects().into_iter().collect::<Vec<_>>(),
            vec!["chemistry-extra", "science"]
        );
    }

    #[test]
    fn paths_and_titles() {
        let key = subject_part("design-and-technology", SubjectPart::KnowledgeTaxonomy);
        assert_eq!(
            key.relative_path(),
            PathBuf::from(
                "subjects/design-and-technology/design-and-technology-knowledge-taxonomy.ttl"
            )
        );
        assert_eq!(
            key.title(),
            "National Curriculum for England - Design And Technology Knowledge Taxonomy"
        );
        assert_eq!(subject_key("subject-science"), "science");
        assert_eq!(subject_key("subject-"), "subject-");
        assert_eq!(subject_key("history"), "history");
    }

    #[test]
    fn header_omits_created_unless_configured() {
        let minter = Minter::default();
        let mut metadata = OntologyMetadata::default();
        let header = header_statements(&PartitionKey::Themes, &minter, &metadata);
        assert!(!header.iter().any(|s| s.predicate == vocab::DCTERMS_CREATED));
        assert!(header
            .iter()
            .all(|s| s.subject == "https://w3id.org/uk/curriculum/england/themes"));

        metadata.created = NaiveDate::from_ymd_opt(2025, 1, 31);
        let header = header_statements(&PartitionKey::Themes, &minter, &metadata);
        let created = header
            .iter()
            .find(|s| s.predicate == vocab::DCTERMS_CREATED)
            .and_then(|s| s.object.as_literal())
            .map(|l| l.lexical.as_str());
        assert_eq!(created, Some("2025-01-31"));
    }
}
