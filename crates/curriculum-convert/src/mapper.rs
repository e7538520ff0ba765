//! Property mapping: resolved node -> statements.
//!
//! Dispatch is on the node's closed type tag. The label/definition
//! predicates come from the type family, never from which fields happen to
//! be present, so one document can never mix the two vocabulary patterns.

use crate::minter::Minter;
use crate::resolver::{FieldValue, NodeId, ResolvedGraph};
use crate::term::{Literal, Statement, Term};
use curriculum_model::{vocab, DocumentType, Family, FieldKind, UrlEmit};
use rayon::prelude::*;

/// IRI of the concept scheme every knowledge-taxonomy concept belongs to.
pub fn knowledge_taxonomy_scheme(minter: &Minter) -> String {
    minter.resource("knowledge-taxonomy")
}

/// IRI of the cross-cutting themes concept scheme.
pub fn themes_scheme(minter: &Minter) -> String {
    minter.resource("themes-scheme")
}

/// Statements describing one node: type statements, then fields in table
/// order, then the family extras.
pub fn map_node(graph: &ResolvedGraph, id: NodeId, minter: &Minter) -> Vec<Statement> {
    let node = graph.node(id);
    let doc_type = node.doc_type();
    let family = doc_type.family();
    let subject = node.iri.as_str();
    let mut out = Vec::new();

    out.push(Statement::new(subject, vocab::RDF_TYPE, Term::iri(doc_type.class_iri())));
    if family == Family::Taxonomy {
        out.push(Statement::new(subject, vocab::RDF_TYPE, Term::iri(vocab::SKOS_CONCEPT)));
    }

    for (spec, value) in &node.values {
        let predicate = spec.predicate(family);
        match value {
            FieldValue::Text(text) => {
                out.push(Statement::new(
                    subject,
                    predicate,
                    Term::Literal(Literal::english(text.as_str())),
                ));
            }
            FieldValue::Integer(n) => {
                let datatype = match spec.kind {
                    FieldKind::PositiveInteger => vocab::XSD_POSITIVE_INTEGER,
                    _ => vocab::XSD_NON_NEGATIVE_INTEGER,
                };
                out.push(Statement::new(
                    subject,
                    predicate,
                    Term::Literal(Literal::typed(n.to_string(), datatype)),
                ));
            }
            FieldValue::Url(url) => {
                let object = match spec.kind {
                    FieldKind::Url(UrlEmit::AnyUri) => {
                        Term::Literal(Literal::typed(url.as_str(), vocab::XSD_ANY_URI))
                    }
                    _ => Term::iri(url.as_str()),
                };
                out.push(Statement::new(subject, predicate, object));
            }
            FieldValue::Reference(target) => {
                out.push(Statement::new(
                    subject,
                    predicate,
                    Term::iri(graph.node(*target).iri.as_str()),
                ));
            }
            FieldValue::References(targets) => {
                // Node ids are in identifier order already.
                out.extend(targets.iter().map(|t| {
                    Statement::new(subject, predicate, Term::iri(graph.node(*t).iri.as_str()))
                }));
            }
            FieldValue::Aims(aims) => {
                out.extend(aims.iter().map(|aim| {
                    Statement::new(
                        subject,
                        predicate,
                        Term::Literal(Literal::english(aim.as_str())),
                    )
                }));
            }
        }
    }

    if family == Family::Taxonomy {
        let scheme = match doc_type {
            DocumentType::Theme => themes_scheme(minter),
            _ => knowledge_taxonomy_scheme(minter),
        };
        if doc_type == DocumentType::Discipline {
            out.push(Statement::new(
                subject,
                vocab::SKOS_TOP_CONCEPT_OF,
                Term::iri(scheme.as_str()),
            ));
        }
        out.push(Statement::new(subject, vocab::SKOS_IN_SCHEME, Term::iri(scheme)));
    }

    out
}

/// Map every node. Mapping is independent per node, so it runs in parallel;
/// results are indexed by `NodeId`.
pub fn map_all(graph: &ResolvedGraph, minter: &Minter) -> Vec<Vec<Statement>> {
    (0..graph.len())
        .into_par_iter()
        .map(|id| map_node(graph, id, minter))
        .collect()
}
