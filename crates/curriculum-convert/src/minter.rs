//! Identifier minting.
//!
//! `mint(type, slug)` is a pure, total function over valid slugs: the same
//! input yields the same identifier in every run. Identifiers follow the
//! published `eng:<slug>` scheme, so slugs must be unique across all types;
//! collisions are reported by the resolver as `DuplicateIdentifier`.

use curriculum_model::{vocab, DocumentType};
use regex::Regex;
use std::sync::OnceLock;

fn slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("slug pattern is a valid regex")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Minter {
    base: String,
}

impl Default for Minter {
    fn default() -> Self {
        Self {
            base: vocab::ENG.to_string(),
        }
    }
}

impl Minter {
    /// `base` must end in `/` or `#`.
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Whether `slug` can be minted: a valid IRI path segment that also
    /// compacts to a Turtle local name.
    pub fn is_valid_slug(slug: &str) -> bool {
        slug_pattern().is_match(slug) && !slug.ends_with('.')
    }

    pub fn mint(&self, _doc_type: DocumentType, slug: &str) -> String {
        format!("{}{}", self.base, slug)
    }

    /// Identifier for a non-document resource under the same base
    /// (ontology headers, concept schemes).
    pub fn resource(&self, local: &str) -> String {
        format!("{}{}", self.base, local)
    }
}
