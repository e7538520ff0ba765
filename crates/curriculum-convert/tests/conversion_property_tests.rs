use curriculum_convert::mapper::map_all;
use curriculum_convert::term::Term;
use curriculum_convert::{
    convert_documents, load_snapshot, resolve, ConvertError, ConvertOptions, Fault, Minter,
};
use curriculum_model::{vocab, Family};
use proptest::prelude::*;
use serde_json::{json, Value};

/// Shape of a randomly generated, valid curriculum graph.
#[derive(Debug, Clone)]
struct Shape {
    disciplines: usize,
    /// strand i -> discipline
    strand_parents: Vec<usize>,
    /// content descriptor i -> substrand (one substrand per strand)
    cd_parents: Vec<usize>,
    /// subject i -> disciplines it lists
    subject_disciplines: Vec<Vec<usize>>,
    /// scheme of subject i -> content descriptors
    scheme_cds: Vec<Vec<usize>>,
    themes: usize,
}

fn shape_strategy() -> impl Strategy<Value = Shape> {
    (1usize..=4, 1usize..=5, 1usize..=6, 1usize..=3, 0usize..=2).prop_flat_map(
        |(disciplines, strands, cds, subjects, themes)| {
            let all_disciplines: Vec<usize> = (0..disciplines).collect();
            let all_cds: Vec<usize> = (0..cds).collect();
            (
                prop::collection::vec(0..disciplines, strands),
                prop::collection::vec(0..strands, cds),
                prop::collection::vec(
                    prop::sample::subsequence(all_disciplines, 1..=disciplines),
                    subjects,
                ),
                prop::collection::vec(prop::sample::subsequence(all_cds, 1..=cds), subjects),
            )
                .prop_map(
                    move |(strand_parents, cd_parents, subject_disciplines, scheme_cds)| Shape {
                        disciplines,
                        strand_parents,
                        cd_parents,
                        subject_disciplines,
                        scheme_cds,
                        themes,
                    },
                )
        },
    )
}

fn reference(key: &str) -> Value {
    json!({"_type": "reference", "_ref": key})
}

/// Flat CMS query result for a shape.
fn documents(shape: &Shape) -> Vec<Value> {
    let mut docs = vec![
        json!({"_id": "phase-primary", "_type": "phase", "label": "Primary",
               "description": "Ages 5 to 11.", "lowerAgeBoundary": 5, "upperAgeBoundary": 11}),
        json!({"_id": "key-stage-2", "_type": "keyStage", "label": "Key Stage 2",
               "description": "Ages 7 to 11.", "lowerAgeBoundary": 7, "upperAgeBoundary": 11,
               "phase": reference("phase-primary")}),
    ];
    for d in 0..shape.disciplines {
        docs.push(json!({"_id": format!("discipline-{d}"), "_type": "discipline",
                         "prefLabel": format!("Discipline {d}"), "definition": "A discipline."}));
    }
    for (s, parent) in shape.strand_parents.iter().enumerate() {
        docs.push(json!({"_id": format!("strand-{s}"), "_type": "strand",
                         "prefLabel": format!("Strand {s}"),
                         "discipline": reference(&format!("discipline-{parent}"))}));
        docs.push(json!({"_id": format!("substrand-{s}"), "_type": "substrand",
                         "prefLabel": format!("Substrand {s}"),
                         "strand": reference(&format!("strand-{s}"))}));
    }
    for (c, parent) in shape.cd_parents.iter().enumerate() {
        docs.push(json!({"_id": format!("cd-{c}"), "_type": "contentDescriptor",
                         "prefLabel": format!("Descriptor {c}"),
                         "substrand": reference(&format!("substrand-{parent}"))}));
    }
    for (i, disciplines) in shape.subject_disciplines.iter().enumerate() {
        let refs: Vec<Value> = disciplines
            .iter()
            .map(|d| reference(&format!("discipline-{d}")))
            .collect();
        docs.push(json!({"_id": format!("subject-s{i}"), "_type": "subject",
                         "label": format!("Subject {i}"), "description": "A subject.",
                         "disciplines": refs}));
        docs.push(json!({"_id": format!("subsubject-s{i}"), "_type": "subsubject",
                         "label": format!("Subsubject {i}"), "description": "A sub-subject.",
                         "subject": reference(&format!("subject-s{i}"))}));
        let cds: Vec<Value> = shape.scheme_cds[i]
            .iter()
            .map(|c| reference(&format!("cd-{c}")))
            .collect();
        docs.push(json!({"_id": format!("scheme-s{i}"), "_type": "scheme",
                         "label": format!("Scheme {i}"), "description": "A scheme.",
                         "subsubject": reference(&format!("subsubject-s{i}")),
                         "keyStage": reference("key-stage-2"),
                         "contentDescriptors": cds}));
    }
    for t in 0..shape.themes {
        docs.push(json!({"_id": format!("theme-{t}"), "_type": "theme",
                         "prefLabel": format!("Theme {t}"), "definition": "A theme."}));
    }
    docs
}

fn shape_and_permutation() -> impl Strategy<Value = (Vec<Value>, Vec<Value>)> {
    shape_strategy().prop_flat_map(|shape| {
        let docs = documents(&shape);
        (Just(docs.clone()), Just(docs).prop_shuffle())
    })
}

fn rendered(docs: Vec<Value>) -> Vec<(String, String)> {
    convert_documents(load_snapshot(&Value::Array(docs)), ConvertOptions::default())
        .expect("generated graph is valid")
        .partitions
        .into_iter()
        .map(|p| (p.path.to_string_lossy().into_owned(), p.text))
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 128,
        failure_persistence: None,
        ..ProptestConfig::default()
    })]

    #[test]
    fn output_is_independent_of_input_order((docs, shuffled) in shape_and_permutation()) {
        prop_assert_eq!(rendered(docs), rendered(shuffled));
    }

    #[test]
    fn every_relationship_targets_a_minted_document(shape in shape_strategy()) {
        let minter = Minter::default();
        let graph = resolve(load_snapshot(&Value::Array(documents(&shape))), &minter)
            .expect("generated graph is valid");
        let schemes = [minter.resource("knowledge-taxonomy"), minter.resource("themes-scheme")];
        for statements in map_all(&graph, &minter) {
            for st in statements {
                if let Term::Iri(iri) = &st.object {
                    if iri.starts_with(minter.base()) {
                        prop_assert!(
                            graph.id_of(iri).is_some() || schemes.contains(iri),
                            "dangling object {}", iri
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn label_predicates_follow_the_type_family(shape in shape_strategy()) {
        let minter = Minter::default();
        let graph = resolve(load_snapshot(&Value::Array(documents(&shape))), &minter)
            .expect("generated graph is valid");
        for (id, statements) in map_all(&graph, &minter).into_iter().enumerate() {
            let family = graph.node(id).doc_type().family();
            let forbidden = match family {
                Family::Programme => [vocab::SKOS_PREF_LABEL, vocab::SKOS_DEFINITION],
                Family::Taxonomy => [vocab::RDFS_LABEL, vocab::RDFS_COMMENT],
            };
            prop_assert!(statements.iter().all(|s| !forbidden.contains(&s.predicate.as_str())));
            prop_assert_eq!(
                statements.iter().filter(|s| s.predicate == family.label_predicate()).count(),
                1
            );
        }
    }

    #[test]
    fn every_document_lands_in_exactly_one_partition(shape in shape_strategy()) {
        let docs = documents(&shape);
        let slugs: Vec<String> = docs
            .iter()
            .filter_map(|d| d["_id"].as_str().map(str::to_string))
            .collect();
        let partitions = rendered(docs);
        for slug in slugs {
            let needle = format!("\neng:{slug} a ");
            let owners = partitions.iter().filter(|(_, text)| text.contains(&needle)).count();
            prop_assert_eq!(owners, 1, "{} owned by {} partitions", slug, owners);
        }
    }

    #[test]
    fn every_independent_problem_is_reported(
        shape in shape_strategy(),
        broken in prop::collection::vec(any::<bool>(), 3),
    ) {
        let mut docs = documents(&shape);
        let mut expected = 0;
        let subjects = docs.iter_mut().filter(|d| d["_type"] == "subject");
        for (i, subject) in subjects.enumerate() {
            if !broken.get(i).copied().unwrap_or(false) {
                continue;
            }
            if let Some(list) = subject["disciplines"].as_array_mut() {
                list.push(reference(&format!("missing-discipline-{i}")));
                expected += 1;
            }
        }
        // Drop one required label as an independent validation problem.
        if let Some(obj) = docs[0].as_object_mut() {
            obj.remove("label");
        }

        match convert_documents(load_snapshot(&Value::Array(docs)), ConvertOptions::default()) {
            Err(ConvertError::Faults(report)) => {
                let missing = report
                    .faults()
                    .iter()
                    .filter(|f| matches!(f, Fault::MissingReference { .. }))
                    .count();
                let validation = report
                    .faults()
                    .iter()
                    .filter(|f| matches!(f, Fault::Validation { .. }))
                    .count();
                prop_assert_eq!(missing, expected);
                prop_assert_eq!(validation, 1);
                prop_assert_eq!(report.len(), expected + 1);
            }
            other => prop_assert!(
                false,
                "expected faults, got {:?}",
                other.map(|c| c.partitions.len())
            ),
        }
    }
}
