//! Integration tests for the complete conversion pipeline
//!
//! These tests drive snapshot loading, resolution, mapping, routing,
//! rendering and writing together through the public API.
//!
//! Run with: cargo test --test integration_tests

use curriculum_convert::mapper::map_all;
use curriculum_convert::term::{Literal, Term};
use curriculum_convert::{
    convert_documents, load_snapshot, load_snapshot_file, resolve, write_partitions, ConvertError,
    ConvertOptions, Fault, Minter, PartitionKey, SubjectPart,
};
use curriculum_model::{vocab, DocumentType};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::tempdir;

fn reference(key: &str) -> Value {
    json!({"_type": "reference", "_ref": key})
}

fn sample_path() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/sample-data.json"))
}

/// A small valid snapshot with one subject, one scheme and both phases.
fn science_snapshot() -> Value {
    json!({
        "phases": [
            {"_id": "phase-primary", "label": "Primary", "description": "Ages 5 to 11.",
             "lowerAgeBoundary": 5, "upperAgeBoundary": 11},
            {"_id": "phase-secondary", "label": "Secondary", "description": "Ages 11 to 16.",
             "lowerAgeBoundary": 11, "upperAgeBoundary": 16}
        ],
        "keyStages": [
            {"_id": "key-stage-3", "label": "Key Stage 3", "description": "Years 7 to 9.",
             "lowerAgeBoundary": 11, "upperAgeBoundary": 14, "phase": reference("phase-secondary")}
        ],
        "subjects": [
            {"_id": "subject-science", "label": "Science", "description": "Science.",
             "disciplines": [reference("discipline-biology")]}
        ],
        "subsubjects": [
            {"_id": "subsubject-science-ks3", "label": "Science KS3", "description": "KS3.",
             "subject": reference("subject-science")}
        ],
        "schemes": [
            {"_id": "scheme-science-ks3", "label": "Science KS3 scheme", "description": "Scheme.",
             "subsubject": reference("subsubject-science-ks3"),
             "keyStage": reference("key-stage-3"),
             "contentDescriptors": [
                 reference("cd-cells"), reference("cd-organs"), reference("cd-tissues")
             ]}
        ],
        "disciplines": [
            {"_id": "discipline-biology", "prefLabel": "Biology", "definition": "Living things."}
        ],
        "strands": [
            {"_id": "strand-cells", "prefLabel": "Cells",
             "discipline": reference("discipline-biology")}
        ],
        "substrands": [
            {"_id": "substrand-cell-structure", "prefLabel": "Cell structure",
             "strand": reference("strand-cells")}
        ],
        "contentDescriptors": [
            {"_id": "cd-cells", "prefLabel": "Cells",
             "substrand": reference("substrand-cell-structure")},
            {"_id": "cd-organs", "prefLabel": "Organs",
             "substrand": reference("substrand-cell-structure")},
            {"_id": "cd-tissues", "prefLabel": "Tissues",
             "substrand": reference("substrand-cell-structure")}
        ]
    })
}

// ============================================================================
// Programme structure
// ============================================================================

#[test]
fn test_phases_emit_typed_age_boundaries() {
    let minter = Minter::default();
    let graph = resolve(load_snapshot(&science_snapshot()), &minter).expect("valid graph");
    let mapped = map_all(&graph, &minter);

    let boundaries = |slug: &str| {
        let id = graph.id_of(&minter.mint(DocumentType::Phase, slug)).expect("phase node");
        let find = |predicate: &str| {
            mapped[id]
                .iter()
                .find(|s| s.predicate == predicate)
                .and_then(|s| s.object.as_literal().cloned())
                .expect("boundary statement")
        };
        (
            find(vocab::CURRIC_LOWER_AGE_BOUNDARY),
            find(vocab::CURRIC_UPPER_AGE_BOUNDARY),
        )
    };

    assert_eq!(
        boundaries("phase-primary"),
        (
            Literal::typed("5", vocab::XSD_NON_NEGATIVE_INTEGER),
            Literal::typed("11", vocab::XSD_POSITIVE_INTEGER)
        )
    );
    assert_eq!(
        boundaries("phase-secondary"),
        (
            Literal::typed("11", vocab::XSD_NON_NEGATIVE_INTEGER),
            Literal::typed("16", vocab::XSD_POSITIVE_INTEGER)
        )
    );

    let conversion =
        convert_documents(load_snapshot(&science_snapshot()), ConvertOptions::default())
            .expect("converts");
    let programme = conversion
        .partition(&PartitionKey::ProgrammeStructure)
        .expect("programme partition");
    assert!(programme.text.contains("\neng:phase-primary a curric:Phase ;"));
    assert!(programme.text.contains("\neng:phase-secondary a curric:Phase ;"));
    assert!(programme.text.contains("\"16\"^^xsd:positiveInteger"));
    assert!(conversion.partitions.iter().all(|p| p.key == PartitionKey::ProgrammeStructure
        || !p.text.contains("a curric:Phase")));
}

// ============================================================================
// Fault handling
// ============================================================================

#[test]
fn test_missing_content_descriptor_aborts_and_writes_nothing() {
    let mut snapshot = science_snapshot();
    snapshot["contentDescriptors"]
        .as_array_mut()
        .expect("array")
        .retain(|cd| cd["_id"] != "cd-organs");

    let out = tempdir().expect("tempdir");
    let result = convert_documents(load_snapshot(&snapshot), ConvertOptions::default())
        .map(|conversion| write_partitions(out.path(), &conversion));

    let report = match result {
        Err(ConvertError::Faults(report)) => report,
        other => panic!("expected faults, got {other:?}"),
    };
    assert_eq!(report.len(), 1);
    match &report.faults()[0] {
        Fault::MissingReference {
            document, target, ..
        } => {
            assert_eq!(document.doc_type, DocumentType::Scheme);
            assert_eq!(document.key, "scheme-science-ks3");
            assert_eq!(target, "cd-organs");
        }
        other => panic!("unexpected fault {other}"),
    }
    assert_eq!(std::fs::read_dir(out.path()).expect("read dir").count(), 0);
}

#[test]
fn test_subjects_sharing_a_slug_are_one_duplicate_fault() {
    let mut snapshot = science_snapshot();
    snapshot["subjects"] = json!([
        {"_id": "subject-a", "id": {"_type": "slug", "current": "science"},
         "label": "Science", "description": "A.", "disciplines": [reference("discipline-biology")]},
        {"_id": "subject-b", "id": {"_type": "slug", "current": "science"},
         "label": "Science", "description": "B.", "disciplines": [reference("discipline-biology")]}
    ]);
    snapshot["subsubjects"][0]["subject"] = reference("subject-a");

    let report = match convert_documents(load_snapshot(&snapshot), ConvertOptions::default()) {
        Err(ConvertError::Faults(report)) => report,
        other => panic!("expected faults, got {other:?}"),
    };
    let duplicates: Vec<&Fault> = report
        .faults()
        .iter()
        .filter(|f| matches!(f, Fault::DuplicateIdentifier { .. }))
        .collect();
    assert_eq!(duplicates.len(), 1, "{report}");
    match duplicates[0] {
        Fault::DuplicateIdentifier {
            identifier,
            sources,
        } => {
            assert!(identifier.ends_with("science"));
            let mut keys: Vec<&str> = sources.iter().map(|s| s.key.as_str()).collect();
            keys.sort_unstable();
            assert_eq!(keys, vec!["subject-a", "subject-b"]);
        }
        _ => unreachable!(),
    }
}

#[test]
fn test_fault_report_serializes_every_fault() {
    let mut snapshot = science_snapshot();
    snapshot["strands"][0]["discipline"] = reference("subject-science");
    snapshot["phases"][0]["upperAgeBoundary"] = json!(-1);

    let report = match convert_documents(load_snapshot(&snapshot), ConvertOptions::default()) {
        Err(ConvertError::Faults(report)) => report,
        other => panic!("expected faults, got {other:?}"),
    };
    let kinds: Vec<&str> = report.faults().iter().map(Fault::kind).collect();
    assert!(kinds.contains(&"type_mismatch"), "{kinds:?}");
    assert!(kinds.contains(&"validation"), "{kinds:?}");

    let json = serde_json::to_value(&report).expect("serializes");
    assert_eq!(
        json["faults"].as_array().map(Vec::len),
        Some(report.len())
    );
}

// ============================================================================
// Vocabulary patterns
// ============================================================================

#[test]
fn test_optional_definitions_are_omitted() {
    let minter = Minter::default();
    let graph = resolve(load_snapshot(&science_snapshot()), &minter).expect("valid graph");
    let mapped = map_all(&graph, &minter);

    for slug in ["strand-cells", "substrand-cell-structure"] {
        let id = graph.id_of(&minter.resource(slug)).expect("node");
        let statements = &mapped[id];
        assert_eq!(
            statements
                .iter()
                .filter(|s| s.predicate == vocab::SKOS_PREF_LABEL)
                .count(),
            1
        );
        assert!(statements
            .iter()
            .all(|s| s.predicate != vocab::SKOS_DEFINITION && s.predicate != vocab::RDFS_COMMENT));
        assert!(statements
            .iter()
            .any(|s| s.predicate == vocab::RDF_TYPE && s.object == Term::iri(vocab::SKOS_CONCEPT)));
    }
}

// ============================================================================
// Determinism and output
// ============================================================================

#[test]
fn test_rerun_is_byte_identical() {
    let first_dir = tempdir().expect("tempdir");
    let second_dir = tempdir().expect("tempdir");

    let first = convert_documents(
        load_snapshot_file(sample_path()).expect("fixture"),
        ConvertOptions::default(),
    )
    .expect("converts");
    let second = convert_documents(
        load_snapshot_file(sample_path()).expect("fixture"),
        ConvertOptions::default(),
    )
    .expect("converts");
    assert_eq!(first, second);

    write_partitions(first_dir.path(), &first).expect("write");
    write_partitions(second_dir.path(), &second).expect("write");
    for partition in &first.partitions {
        let a = std::fs::read(first_dir.path().join(&partition.path)).expect("first");
        let b = std::fs::read(second_dir.path().join(&partition.path)).expect("second");
        assert_eq!(a, b, "{} differs", partition.path.display());
    }
}

#[test]
fn test_sample_snapshot_partition_layout() {
    let conversion = convert_documents(
        load_snapshot_file(sample_path()).expect("fixture"),
        ConvertOptions::default(),
    )
    .expect("converts");
    conversion.verify().expect("every partition parses back");

    let paths: Vec<String> = conversion
        .partitions
        .iter()
        .map(|p| p.path.to_string_lossy().into_owned())
        .collect();
    assert_eq!(
        paths,
        vec![
            "programme-structure.ttl",
            "themes.ttl",
            "knowledge-taxonomy.ttl",
            "subjects/history/history-subject.ttl",
            "subjects/history/history-knowledge-taxonomy.ttl",
            "subjects/history/history-schemes.ttl",
            "subjects/science/science-subject.ttl",
            "subjects/science/science-knowledge-taxonomy.ttl",
            "subjects/science/science-schemes.ttl",
        ]
    );

    // The unpublished theme draft is shadowed by its published record.
    let themes = conversion.partition(&PartitionKey::Themes).expect("themes");
    assert!(themes.text.contains("\"Sustainability\"@en"));
    assert!(!themes.text.contains("draft"));
    assert!(themes.text.contains("eng:themes-scheme a skos:ConceptScheme"));

    // Geography is listed by no subject.
    let shared = conversion
        .partition(&PartitionKey::SharedTaxonomy)
        .expect("shared taxonomy");
    assert!(shared.text.contains("\neng:discipline-geography a "));

    let taxonomy = conversion
        .partition(&PartitionKey::Subject {
            subject: "science".to_string(),
            part: SubjectPart::KnowledgeTaxonomy,
        })
        .expect("science taxonomy");
    assert!(taxonomy.text.contains("\neng:csd-light-microscope a "));
    assert!(taxonomy.text.contains("\\\"cell wall\\\""));
    assert!(taxonomy
        .text
        .contains("\"https://www.bbc.co.uk/bitesize/topics/znyycdm\"^^xsd:anyURI"));
}
