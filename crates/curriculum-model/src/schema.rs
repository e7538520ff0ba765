//! Document types and their declarative field tables.
//!
//! The CMS field definitions are UI configuration owned by the CMS; this
//! module is the converter's view of them: which fields exist per type,
//! which are required, what shape their values take, and which ontology
//! predicate they map to.

use crate::vocab;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two descriptive-vocabulary patterns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Family {
    /// `rdfs:label` / `rdfs:comment`.
    Programme,
    /// `skos:prefLabel` / `skos:definition`, typed as `skos:Concept`.
    Taxonomy,
}

impl Family {
    /// Predicate for the label-like field.
    pub fn label_predicate(self) -> &'static str {
        match self {
            Family::Programme => vocab::RDFS_LABEL,
            Family::Taxonomy => vocab::SKOS_PREF_LABEL,
        }
    }

    /// Predicate for the definition-like field.
    pub fn definition_predicate(self) -> &'static str {
        match self {
            Family::Programme => vocab::RDFS_COMMENT,
            Family::Taxonomy => vocab::SKOS_DEFINITION,
        }
    }
}

/// Closed set of CMS document types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum DocumentType {
    Phase,
    KeyStage,
    YearGroup,
    Subject,
    SubSubject,
    Scheme,
    Progression,
    Discipline,
    Strand,
    SubStrand,
    ContentDescriptor,
    ContentSubDescriptor,
    Theme,
}

impl DocumentType {
    /// Declaration order. Serialized partitions list subjects in this order.
    pub const ALL: [DocumentType; 13] = [
        DocumentType::Phase,
        DocumentType::KeyStage,
        DocumentType::YearGroup,
        DocumentType::Subject,
        DocumentType::SubSubject,
        DocumentType::Scheme,
        DocumentType::Progression,
        DocumentType::Discipline,
        DocumentType::Strand,
        DocumentType::SubStrand,
        DocumentType::ContentDescriptor,
        DocumentType::ContentSubDescriptor,
        DocumentType::Theme,
    ];

    pub fn family(self) -> Family {
        match self {
            DocumentType::Phase
            | DocumentType::KeyStage
            | DocumentType::YearGroup
            | DocumentType::Subject
            | DocumentType::SubSubject
            | DocumentType::Scheme
            | DocumentType::Progression => Family::Programme,
            DocumentType::Discipline
            | DocumentType::Strand
            | DocumentType::SubStrand
            | DocumentType::ContentDescriptor
            | DocumentType::ContentSubDescriptor
            | DocumentType::Theme => Family::Taxonomy,
        }
    }

    /// The CMS `_type` tag.
    pub fn type_tag(self) -> &'static str {
        match self {
            DocumentType::Phase => "phase",
            DocumentType::KeyStage => "keyStage",
            DocumentType::YearGroup => "yearGroup",
            DocumentType::Subject => "subject",
            DocumentType::SubSubject => "subsubject",
            DocumentType::Scheme => "scheme",
            DocumentType::Progression => "progression",
            DocumentType::Discipline => "discipline",
            DocumentType::Strand => "strand",
            DocumentType::SubStrand => "substrand",
            DocumentType::ContentDescriptor => "contentDescriptor",
            DocumentType::ContentSubDescriptor => "contentSubdescriptor",
            DocumentType::Theme => "theme",
        }
    }

    /// Collection key in a grouped snapshot (`{"phases": [...]}`).
    pub fn collection(self) -> &'static str {
        match self {
            DocumentType::Phase => "phases",
            DocumentType::KeyStage => "keyStages",
            DocumentType::YearGroup => "yearGroups",
            DocumentType::Subject => "subjects",
            DocumentType::SubSubject => "subsubjects",
            DocumentType::Scheme => "schemes",
            DocumentType::Progression => "progressions",
            DocumentType::Discipline => "disciplines",
            DocumentType::Strand => "strands",
            DocumentType::SubStrand => "substrands",
            DocumentType::ContentDescriptor => "contentDescriptors",
            DocumentType::ContentSubDescriptor => "contentSubdescriptors",
            DocumentType::Theme => "themes",
        }
    }

    /// Ontology class local name.
    pub fn class_name(self) -> &'static str {
        match self {
            DocumentType::Phase => "Phase",
            DocumentType::KeyStage => "KeyStage",
            DocumentType::YearGroup => "YearGroup",
            DocumentType::Subject => "Subject",
            DocumentType::SubSubject => "SubSubject",
            DocumentType::Scheme => "Scheme",
            DocumentType::Progression => "Progression",
            DocumentType::Discipline => "Discipline",
            DocumentType::Strand => "Strand",
            DocumentType::SubStrand => "SubStrand",
            DocumentType::ContentDescriptor => "ContentDescriptor",
            DocumentType::ContentSubDescriptor => "ContentSubDescriptor",
            DocumentType::Theme => "Theme",
        }
    }

    pub fn class_iri(self) -> String {
        format!("{}{}", vocab::CURRIC, self.class_name())
    }

    pub fn from_type_tag(tag: &str) -> Option<DocumentType> {
        Self::ALL.into_iter().find(|t| t.type_tag() == tag)
    }

    pub fn from_collection(key: &str) -> Option<DocumentType> {
        Self::ALL.into_iter().find(|t| t.collection() == key)
    }

    /// Position in [`DocumentType::ALL`].
    pub fn ordinal(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(Self::ALL.len())
    }

    pub fn fields(self) -> &'static [FieldSpec] {
        match self {
            DocumentType::Phase => PHASE_FIELDS,
            DocumentType::KeyStage => KEY_STAGE_FIELDS,
            DocumentType::YearGroup => YEAR_GROUP_FIELDS,
            DocumentType::Subject => SUBJECT_FIELDS,
            DocumentType::SubSubject => SUB_SUBJECT_FIELDS,
            DocumentType::Scheme => SCHEME_FIELDS,
            DocumentType::Progression => PROGRESSION_FIELDS,
            DocumentType::Discipline => DISCIPLINE_FIELDS,
            DocumentType::Strand => STRAND_FIELDS,
            DocumentType::SubStrand => SUB_STRAND_FIELDS,
            DocumentType::ContentDescriptor => CONTENT_DESCRIPTOR_FIELDS,
            DocumentType::ContentSubDescriptor => CONTENT_SUB_DESCRIPTOR_FIELDS,
            DocumentType::Theme => THEME_FIELDS,
        }
    }

    pub fn field(self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|f| f.name == name)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.class_name())
    }
}

/// Shape of a field's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Natural-language text, emitted with an `@en` language tag.
    Text,
    /// Integer `>= 0`, emitted as `xsd:nonNegativeInteger`.
    NonNegativeInteger,
    /// Integer `> 0`, emitted as `xsd:positiveInteger`.
    PositiveInteger,
    /// Absolute URL.
    Url(UrlEmit),
    /// Single reference to a document of exactly `target` type.
    Reference { target: DocumentType },
    /// Reference list; every member must be of `target` type.
    ReferenceList { target: DocumentType, min: usize },
    /// Array of `{ "aimText": ... }` objects, each emitted as text.
    AimList,
}

/// How a URL field is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlEmit {
    /// As an IRI object.
    Iri,
    /// As an `xsd:anyURI` literal.
    AnyUri,
}

/// Which predicate a field maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// Family label predicate (`rdfs:label` / `skos:prefLabel`).
    Label,
    /// Family definition predicate (`rdfs:comment` / `skos:definition`).
    Definition,
    /// A fixed, type-specific predicate.
    Predicate(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub role: FieldRole,
}

impl FieldSpec {
    const fn new(name: &'static str, kind: FieldKind, required: bool, role: FieldRole) -> Self {
        Self {
            name,
            kind,
            required,
            role,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(
            self.kind,
            FieldKind::Reference { .. } | FieldKind::ReferenceList { .. }
        )
    }

    /// Declared target type for reference fields.
    pub fn reference_target(&self) -> Option<DocumentType> {
        match self.kind {
            FieldKind::Reference { target } | FieldKind::ReferenceList { target, .. } => {
                Some(target)
            }
            _ => None,
        }
    }

    /// Predicate this field maps to for a document of `family`.
    pub fn predicate(&self, family: Family) -> &'static str {
        match self.role {
            FieldRole::Label => family.label_predicate(),
            FieldRole::Definition => family.definition_predicate(),
            FieldRole::Predicate(iri) => iri,
        }
    }
}

use DocumentType as T;
use FieldKind as K;
use FieldRole as R;

const fn label(required: bool) -> FieldSpec {
    FieldSpec::new("label", K::Text, required, R::Label)
}

const fn description(required: bool) -> FieldSpec {
    FieldSpec::new("description", K::Text, required, R::Definition)
}

const fn pref_label() -> FieldSpec {
    FieldSpec::new("prefLabel", K::Text, true, R::Label)
}

const fn definition(required: bool) -> FieldSpec {
    FieldSpec::new("definition", K::Text, required, R::Definition)
}

const fn lower_age(required: bool) -> FieldSpec {
    FieldSpec::new(
        "lowerAgeBoundary",
        K::NonNegativeInteger,
        required,
        R::Predicate(vocab::CURRIC_LOWER_AGE_BOUNDARY),
    )
}

const fn upper_age(required: bool) -> FieldSpec {
    FieldSpec::new(
        "upperAgeBoundary",
        K::PositiveInteger,
        required,
        R::Predicate(vocab::CURRIC_UPPER_AGE_BOUNDARY),
    )
}

const fn broader(name: &'static str, target: DocumentType) -> FieldSpec {
    FieldSpec::new(
        name,
        K::Reference { target },
        true,
        R::Predicate(vocab::SKOS_BROADER),
    )
}

const PHASE_FIELDS: &[FieldSpec] = &[
    label(true),
    description(true),
    lower_age(true),
    upper_age(true),
];

const KEY_STAGE_FIELDS: &[FieldSpec] = &[
    label(true),
    description(true),
    lower_age(true),
    upper_age(true),
    FieldSpec::new(
        "phase",
        K::Reference { target: T::Phase },
        true,
        R::Predicate(vocab::CURRIC_IS_PART_OF),
    ),
];

const YEAR_GROUP_FIELDS: &[FieldSpec] = &[
    label(true),
    description(false),
    lower_age(false),
    upper_age(false),
    FieldSpec::new(
        "keyStage",
        K::Reference { target: T::KeyStage },
        true,
        R::Predicate(vocab::CURRIC_IS_PART_OF),
    ),
];

const SUBJECT_FIELDS: &[FieldSpec] = &[
    label(true),
    description(true),
    FieldSpec::new(
        "disciplines",
        K::ReferenceList {
            target: T::Discipline,
            min: 1,
        },
        true,
        R::Predicate(vocab::CURRIC_HAS_DISCIPLINE),
    ),
];

const SUB_SUBJECT_FIELDS: &[FieldSpec] = &[
    label(true),
    description(true),
    FieldSpec::new(
        "fullDescription",
        K::Text,
        false,
        R::Predicate(vocab::DCTERMS_DESCRIPTION),
    ),
    FieldSpec::new(
        "sourceUrl",
        K::Url(UrlEmit::Iri),
        false,
        R::Predicate(vocab::DCTERMS_SOURCE),
    ),
    FieldSpec::new(
        "subject",
        K::Reference { target: T::Subject },
        true,
        R::Predicate(vocab::CURRIC_IS_PART_OF),
    ),
    FieldSpec::new(
        "strands",
        K::ReferenceList {
            target: T::Strand,
            min: 0,
        },
        false,
        R::Predicate(vocab::CURRIC_HAS_STRAND),
    ),
    FieldSpec::new("aims", K::AimList, false, R::Predicate(vocab::CURRIC_HAS_AIM)),
];

const SCHEME_FIELDS: &[FieldSpec] = &[
    label(true),
    description(true),
    FieldSpec::new(
        "subsubject",
        K::Reference {
            target: T::SubSubject,
        },
        true,
        R::Predicate(vocab::CURRIC_IS_PART_OF),
    ),
    FieldSpec::new(
        "keyStage",
        K::Reference { target: T::KeyStage },
        true,
        R::Predicate(vocab::CURRIC_HAS_KEY_STAGE),
    ),
    FieldSpec::new(
        "contentDescriptors",
        K::ReferenceList {
            target: T::ContentDescriptor,
            min: 1,
        },
        true,
        R::Predicate(vocab::CURRIC_HAS_CONTENT_DESCRIPTOR),
    ),
];

const PROGRESSION_FIELDS: &[FieldSpec] = &[
    label(true),
    description(false),
    FieldSpec::new(
        "scheme",
        K::Reference { target: T::Scheme },
        true,
        R::Predicate(vocab::CURRIC_IS_PART_OF),
    ),
    FieldSpec::new(
        "substrand",
        K::Reference {
            target: T::SubStrand,
        },
        false,
        R::Predicate(vocab::CURRIC_HAS_SUB_STRAND),
    ),
    FieldSpec::new(
        "contentDescriptors",
        K::ReferenceList {
            target: T::ContentDescriptor,
            min: 0,
        },
        false,
        R::Predicate(vocab::CURRIC_HAS_CONTENT_DESCRIPTOR),
    ),
];

const DISCIPLINE_FIELDS: &[FieldSpec] = &[
    pref_label(),
    definition(true),
    FieldSpec::new(
        "scopeNote",
        K::Text,
        false,
        R::Predicate(vocab::SKOS_SCOPE_NOTE),
    ),
];

const STRAND_FIELDS: &[FieldSpec] = &[
    pref_label(),
    definition(false),
    broader("discipline", T::Discipline),
];

const SUB_STRAND_FIELDS: &[FieldSpec] = &[
    pref_label(),
    definition(false),
    broader("strand", T::Strand),
];

const CONTENT_DESCRIPTOR_FIELDS: &[FieldSpec] = &[
    pref_label(),
    definition(false),
    broader("substrand", T::SubStrand),
];

const CONTENT_SUB_DESCRIPTOR_FIELDS: &[FieldSpec] = &[
    pref_label(),
    definition(false),
    broader("contentDescriptor", T::ContentDescriptor),
    FieldSpec::new(
        "exampleText",
        K::Text,
        false,
        R::Predicate(vocab::CURRIC_EXAMPLE),
    ),
    FieldSpec::new(
        "exampleUrl",
        K::Url(UrlEmit::AnyUri),
        false,
        R::Predicate(vocab::CURRIC_EXAMPLE_URL),
    ),
];

const THEME_FIELDS: &[FieldSpec] = &[pref_label(), definition(true)];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_and_collections_round_trip() {
        for ty in DocumentType::ALL {
            assert_eq!(DocumentType::from_type_tag(ty.type_tag()), Some(ty));
            assert_eq!(DocumentType::from_collection(ty.collection()), Some(ty));
        }
        assert_eq!(DocumentType::from_type_tag("lesson"), None);
    }

    #[test]
    fn label_and_definition_roles_never_carry_fixed_predicates() {
        // A label/definition field that named its own predicate could mix
        // vocabulary patterns within one family.
        for ty in DocumentType::ALL {
            for field in ty.fields() {
                if matches!(field.role, FieldRole::Predicate(_)) {
                    let p = field.predicate(ty.family());
                    for family in [Family::Programme, Family::Taxonomy] {
                        assert_ne!(p, family.label_predicate(), "{ty}.{}", field.name);
                        assert_ne!(p, family.definition_predicate(), "{ty}.{}", field.name);
                    }
                }
            }
        }
    }

    #[test]
    fn every_type_has_exactly_one_required_label() {
        for ty in DocumentType::ALL {
            let labels: Vec<_> = ty
                .fields()
                .iter()
                .filter(|f| f.role == FieldRole::Label)
                .collect();
            assert_eq!(labels.len(), 1, "{ty}");
            assert!(labels[0].required, "{ty}");
        }
    }

    #[test]
    fn families_split_seven_and_six() {
        let programme = DocumentType::ALL
            .iter()
            .filter(|t| t.family() == Family::Programme)
            .count();
        assert_eq!(programme, 7);
        assert_eq!(DocumentType::ALL.len() - programme, 6);
    }

    #[test]
    fn ordinals_follow_declaration_order() {
        for (i, ty) in DocumentType::ALL.iter().enumerate() {
            assert_eq!(ty.ordinal(), i);
        }
    }
}
