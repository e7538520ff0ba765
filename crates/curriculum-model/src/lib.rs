//! Curriculum CMS document model.
//!
//! This crate describes the *input* side of the conversion:
//!
//! - the closed set of thirteen document types and the two vocabulary
//!   families they belong to (`schema`),
//! - the declarative field tables the CMS edits (`schema`),
//! - the document record itself (`document`),
//! - and the ontology vocabulary the converter emits into (`vocab`).
//!
//! It performs no I/O and no validation; see `curriculum-convert` for the
//! resolver that enforces these tables.

pub mod document;
pub mod schema;
pub mod vocab;

pub use document::{DocRef, Document};
pub use schema::{DocumentType, Family, FieldKind, FieldRole, FieldSpec, UrlEmit};
