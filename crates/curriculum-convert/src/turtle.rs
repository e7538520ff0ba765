//! Canonical Turtle rendering.
//!
//! Output is a pure function of the statement *set*: statements are
//! deduplicated and ordered before rendering, so input order never shows
//! up in the bytes. Subjects are grouped in blocks ordered by the rank of
//! their type (ontology header, concept schemes, then document types in
//! declaration order) and then by IRI; predicates follow a fixed declared
//! order with `rdf:type` first; objects are sorted.

use crate::term::{Literal, Statement, Term};
use curriculum_model::{vocab, DocumentType};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

const INDENT: &str = "    ";
const OBJECT_INDENT: &str = "        ";

pub fn render_turtle(statements: &[Statement]) -> String {
    let unique: BTreeSet<&Statement> = statements.iter().collect();

    let mut by_subject: BTreeMap<&str, BTreeMap<&str, Vec<&Term>>> = BTreeMap::new();
    for st in unique {
        by_subject
            .entry(st.subject.as_str())
            .or_default()
            .entry(st.predicate.as_str())
            .or_default()
            .push(&st.object);
    }

    let mut subjects: Vec<(usize, &str)> = by_subject
        .iter()
        .map(|(subject, preds)| (subject_rank(preds.get(vocab::RDF_TYPE)), *subject))
        .collect();
    subjects.sort();

    let mut out = String::new();
    for (prefix, ns) in vocab::PREFIXES {
        let _ = writeln!(out, "@prefix {prefix}: <{ns}> .");
    }

    for (_, subject) in subjects {
        let preds = &by_subject[subject];
        let mut ordered: Vec<(&str, &Vec<&Term>)> = preds.iter().map(|(p, o)| (*p, o)).collect();
        ordered.sort_by_key(|(p, _)| (predicate_rank(p), *p));

        out.push('\n');
        out.push_str(&render_iri(subject));
        let last = ordered.len().saturating_sub(1);
        for (i, (predicate, objects)) in ordered.into_iter().enumerate() {
            out.push_str(if i == 0 { " " } else { INDENT });
            if predicate == vocab::RDF_TYPE {
                out.push('a');
            } else {
                out.push_str(&render_iri(predicate));
            }
            out.push(' ');

            // Already sorted: the BTreeSet yields statements in term order.
            let rendered: Vec<String> = objects.iter().map(|o| render_term(o)).collect();
            out.push_str(&rendered.join(&format!(" ,\n{OBJECT_INDENT}")));
            out.push_str(if i == last { " .\n" } else { " ;\n" });
        }
    }

    out
}

/// Block rank of a subject, from its `rdf:type` objects.
fn subject_rank(types: Option<&Vec<&Term>>) -> usize {
    const ONTOLOGY: usize = 0;
    const CONCEPT_SCHEME: usize = 1;
    const FIRST_DOCUMENT: usize = 2;
    let unknown = FIRST_DOCUMENT + DocumentType::ALL.len();

    types
        .into_iter()
        .flatten()
        .filter_map(|t| t.as_iri())
        .map(|iri| match iri {
            vocab::OWL_ONTOLOGY => ONTOLOGY,
            vocab::SKOS_CONCEPT_SCHEME => CONCEPT_SCHEME,
            other => DocumentType::ALL
                .iter()
                .position(|t| t.class_iri() == other)
                .map_or(unknown, |p| FIRST_DOCUMENT + p),
        })
        .min()
        .unwrap_or(unknown)
}

fn predicate_rank(predicate: &str) -> usize {
    vocab::PREDICATE_ORDER
        .iter()
        .position(|p| *p == predicate)
        .unwrap_or(vocab::PREDICATE_ORDER.len())
}

fn render_term(term: &Term) -> String {
    match term {
        Term::Iri(iri) => render_iri(iri),
        Term::Literal(lit) => render_literal(lit),
    }
}

fn render_iri(iri: &str) -> String {
    if let Some(compact) = vocab::compact(iri) {
        return compact;
    }
    let mut out = String::with_capacity(iri.len() + 2);
    out.push('<');
    // UCHAR escapes decode back to the same forbidden code points, so
    // characters an IRI may not contain are percent-encoded instead.
    for c in iri.chars() {
        match c {
            '<' | '>' | '"' | '{' | '}' | '|' | '^' | '`' | '\\' => {
                let _ = write!(out, "%{:02X}", c as u32);
            }
            c if c <= ' ' || c == '\u{7f}' => {
                let _ = write!(out, "%{:02X}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('>');
    out
}

fn render_literal(lit: &Literal) -> String {
    let mut out = String::with_capacity(lit.lexical.len() + 2);
    out.push('"');
    escape_into(&lit.lexical, &mut out);
    out.push('"');
    if let Some(lang) = &lit.language {
        out.push('@');
        out.push_str(lang);
    } else if let Some(datatype) = &lit.datatype {
        out.push_str("^^");
        out.push_str(&render_iri(datatype));
    }
    out
}

fn escape_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c.is_control() => {
                let _ = write!(out, "\\u{:04X}", c as u32);
            }
            c => out.push(c),
        }
    }
}
