//! Fault taxonomy.
//!
//! Faults are structural problems in the input documents. They are never
//! transient: the run collects every one of them, reports them all, and
//! writes nothing.

use curriculum_model::{DocRef, DocumentType};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Fault {
    /// A record the loader could not turn into a document.
    #[error("{locator}: unreadable record: {reason}")]
    Malformed { locator: String, reason: String },

    #[error("{document}: field `{field}` references missing document `{target}`")]
    MissingReference {
        document: DocRef,
        field: String,
        target: String,
    },

    #[error(
        "{document}: field `{field}` references `{target}` of type {found}, expected {expected}"
    )]
    TypeMismatch {
        document: DocRef,
        field: String,
        target: String,
        expected: DocumentType,
        found: DocumentType,
    },

    #[error("{document}: field `{field}`: {reason}")]
    Validation {
        document: DocRef,
        field: String,
        reason: String,
    },

    #[error("identifier `{identifier}` is claimed by {}", join_refs(.sources))]
    DuplicateIdentifier {
        identifier: String,
        sources: Vec<DocRef>,
    },
}

fn join_refs(sources: &[DocRef]) -> String {
    sources
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(" and ")
}

impl Fault {
    pub fn kind(&self) -> &'static str {
        match self {
            Fault::Malformed { .. } => "malformed",
            Fault::MissingReference { .. } => "missing_reference",
            Fault::TypeMismatch { .. } => "type_mismatch",
            Fault::Validation { .. } => "validation",
            Fault::DuplicateIdentifier { .. } => "duplicate_identifier",
        }
    }

    pub(crate) fn validation(document: &DocRef, field: &str, reason: impl Into<String>) -> Self {
        Fault::Validation {
            document: document.clone(),
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// The complete, itemized fault list of a failed run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FaultReport {
    faults: Vec<Fault>,
}

impl FaultReport {
    /// Sorted and deduplicated, so the report itself is deterministic.
    pub fn new(mut faults: Vec<Fault>) -> Self {
        faults.sort();
        faults.dedup();
        Self { faults }
    }

    pub fn faults(&self) -> &[Fault] {
        &self.faults
    }

    pub fn len(&self) -> usize {
        self.faults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    pub fn into_faults(self) -> Vec<Fault> {
        self.faults
    }
}

impl fmt::Display for FaultReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} fault(s); no partitions written:",
            self.faults.len()
        )?;
        for fault in &self.faults {
            writeln!(f, "  [{}] {fault}", fault.kind())?;
        }
        Ok(())
    }
}

impl std::error::Error for FaultReport {}
