//! Ontology vocabulary used by the converter.
//!
//! Every IRI the converter can emit is named here, so the serializer's
//! predicate ordering and prefix table have a single source of truth.

/// Curriculum core ontology (`curric:`).
pub const CURRIC: &str = "https://w3id.org/uk/curriculum/core/";
/// England curriculum data namespace (`eng:`); minted identifiers live here.
pub const ENG: &str = "https://w3id.org/uk/curriculum/england/";

pub const RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL: &str = "http://www.w3.org/2002/07/owl#";
pub const SKOS: &str = "http://www.w3.org/2004/02/skos/core#";
pub const DC: &str = "http://purl.org/dc/elements/1.1/";
pub const DCTERMS: &str = "http://purl.org/dc/terms/";
pub const XSD: &str = "http://www.w3.org/2001/XMLSchema#";

/// Prefix table, in the order prefixes are declared in serialized output.
pub const PREFIXES: &[(&str, &str)] = &[
    ("curric", CURRIC),
    ("dc", DC),
    ("dcterms", DCTERMS),
    ("eng", ENG),
    ("owl", OWL),
    ("rdf", RDF),
    ("rdfs", RDFS),
    ("skos", SKOS),
    ("xsd", XSD),
];

pub const RDF_TYPE: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";

pub const RDFS_LABEL: &str = "http://www.w3.org/2000/01/rdf-schema#label";
pub const RDFS_COMMENT: &str = "http://www.w3.org/2000/01/rdf-schema#comment";

pub const OWL_ONTOLOGY: &str = "http://www.w3.org/2002/07/owl#Ontology";
pub const OWL_VERSION_INFO: &str = "http://www.w3.org/2002/07/owl#versionInfo";
pub const OWL_IMPORTS: &str = "http://www.w3.org/2002/07/owl#imports";

pub const SKOS_CONCEPT: &str = "http://www.w3.org/2004/02/skos/core#Concept";
pub const SKOS_CONCEPT_SCHEME: &str = "http://www.w3.org/2004/02/skos/core#ConceptScheme";
pub const SKOS_PREF_LABEL: &str = "http://www.w3.org/2004/02/skos/core#prefLabel";
pub const SKOS_DEFINITION: &str = "http://www.w3.org/2004/02/skos/core#definition";
pub const SKOS_SCOPE_NOTE: &str = "http://www.w3.org/2004/02/skos/core#scopeNote";
pub const SKOS_BROADER: &str = "http://www.w3.org/2004/02/skos/core#broader";
pub const SKOS_IN_SCHEME: &str = "http://www.w3.org/2004/02/skos/core#inScheme";
pub const SKOS_TOP_CONCEPT_OF: &str = "http://www.w3.org/2004/02/skos/core#topConceptOf";

pub const DC_TITLE: &str = "http://purl.org/dc/elements/1.1/title";

pub const DCTERMS_DESCRIPTION: &str = "http://purl.org/dc/terms/description";
pub const DCTERMS_SOURCE: &str = "http://purl.org/dc/terms/source";
pub const DCTERMS_CREATOR: &str = "http://purl.org/dc/terms/creator";
pub const DCTERMS_CREATED: &str = "http://purl.org/dc/terms/created";
pub const DCTERMS_LICENSE: &str = "http://purl.org/dc/terms/license";
pub const DCTERMS_RIGHTS: &str = "http://purl.org/dc/terms/rights";

pub const CURRIC_LOWER_AGE_BOUNDARY: &str = "https://w3id.org/uk/curriculum/core/lowerAgeBoundary";
pub const CURRIC_UPPER_AGE_BOUNDARY: &str = "https://w3id.org/uk/curriculum/core/upperAgeBoundary";
pub const CURRIC_IS_PART_OF: &str = "https://w3id.org/uk/curriculum/core/isPartOf";
pub const CURRIC_HAS_DISCIPLINE: &str = "https://w3id.org/uk/curriculum/core/hasDiscipline";
pub const CURRIC_HAS_STRAND: &str = "https://w3id.org/uk/curriculum/core/hasStrand";
pub const CURRIC_HAS_AIM: &str = "https://w3id.org/uk/curriculum/core/hasAim";
pub const CURRIC_HAS_KEY_STAGE: &str = "https://w3id.org/uk/curriculum/core/hasKeyStage";
pub const CURRIC_HAS_CONTENT_DESCRIPTOR: &str =
    "https://w3id.org/uk/curriculum/core/hasContentDescriptor";
pub const CURRIC_HAS_SUB_STRAND: &str = "https://w3id.org/uk/curriculum/core/hasSubStrand";
pub const CURRIC_EXAMPLE: &str = "https://w3id.org/uk/curriculum/core/example";
pub const CURRIC_EXAMPLE_URL: &str = "https://w3id.org/uk/curriculum/core/exampleURL";

pub const XSD_NON_NEGATIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#nonNegativeInteger";
pub const XSD_POSITIVE_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#positiveInteger";
pub const XSD_ANY_URI: &str = "http://www.w3.org/2001/XMLSchema#anyURI";
pub const XSD_DATE: &str = "http://www.w3.org/2001/XMLSchema#date";

/// Concept scheme grouping the subject knowledge taxonomies.
pub const KNOWLEDGE_TAXONOMY_SCHEME: &str =
    "https://w3id.org/uk/curriculum/england/knowledge-taxonomy";
/// Concept scheme grouping cross-cutting themes.
pub const THEMES_SCHEME: &str = "https://w3id.org/uk/curriculum/england/themes-scheme";

pub const OGL_V3_LICENSE: &str =
    "http://www.nationalarchives.gov.uk/doc/open-government-licence/version/3/";

/// Predicate order inside one serialized subject block.
///
/// `rdf:type` is always first; predicates not listed here sort after these,
/// alphabetically.
pub const PREDICATE_ORDER: &[&str] = &[
    RDF_TYPE,
    RDFS_LABEL,
    DC_TITLE,
    SKOS_PREF_LABEL,
    RDFS_COMMENT,
    SKOS_DEFINITION,
    SKOS_SCOPE_NOTE,
    DCTERMS_DESCRIPTION,
    CURRIC_LOWER_AGE_BOUNDARY,
    CURRIC_UPPER_AGE_BOUNDARY,
    CURRIC_IS_PART_OF,
    SKOS_BROADER,
    CURRIC_HAS_DISCIPLINE,
    CURRIC_HAS_STRAND,
    CURRIC_HAS_KEY_STAGE,
    CURRIC_HAS_SUB_STRAND,
    CURRIC_HAS_CONTENT_DESCRIPTOR,
    CURRIC_HAS_AIM,
    CURRIC_EXAMPLE,
    CURRIC_EXAMPLE_URL,
    DCTERMS_SOURCE,
    SKOS_TOP_CONCEPT_OF,
    SKOS_IN_SCHEME,
    OWL_VERSION_INFO,
    DCTERMS_CREATOR,
    DCTERMS_CREATED,
    DCTERMS_LICENSE,
    DCTERMS_RIGHTS,
    OWL_IMPORTS,
];

/// Compact an IRI to `prefix:local` when the local part is a safe Turtle
/// local name.
pub fn compact(iri: &str) -> Option<String> {
    PREFIXES.iter().find_map(|(prefix, ns)| {
        let local = iri.strip_prefix(ns)?;
        is_safe_local_name(local).then(|| format!("{prefix}:{local}"))
    })
}

/// Conservative subset of Turtle's `PN_LOCAL`: ASCII alphanumerics, `_`,
/// `-` and `.`; no leading `-`/`.`, no trailing `.`.
pub fn is_safe_local_name(local: &str) -> bool {
    let Some(first) = local.chars().next() else {
        // An empty local name (`curric:`) is valid Turtle.
        return true;
    };
    if first == '-' || first == '.' || local.ends_with('.') {
        return false;
    }
    local
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}
