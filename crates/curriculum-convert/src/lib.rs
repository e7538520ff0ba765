//! CMS document graph to RDF/Turtle conversion.
//!
//! The pipeline is a single forward pass with one validation gate:
//!
//! - [`loader`] normalizes a CMS snapshot into typed documents (collecting
//!   unreadable records instead of failing on the first),
//! - [`resolver`] indexes documents by key and minted identifier, resolves
//!   every reference and validates every field; any fault aborts the run,
//! - [`mapper`] turns each resolved node into statements using the
//!   vocabulary pattern of its type family,
//! - [`partition`] assigns each node to exactly one output partition,
//! - [`turtle`] renders each partition canonically,
//! - [`writer`] writes the whole partition set or nothing.
//!
//! Nothing after the resolver can observe an invalid graph, and nothing
//! is written unless every stage succeeded.

pub mod check;
pub mod digest;
pub mod fault;
pub mod loader;
pub mod mapper;
pub mod minter;
pub mod partition;
pub mod resolver;
pub mod term;
pub mod turtle;
pub mod writer;

pub use fault::{Fault, FaultReport};
pub use loader::{load_snapshot, load_snapshot_file, LoadedDocuments};
pub use minter::Minter;
pub use partition::{OntologyMetadata, PartitionKey, Router, SubjectPart};
pub use resolver::{resolve, NodeId, ResolvedGraph};
pub use writer::write_partitions;

use anyhow::{anyhow, Result};
use curriculum_model::DocumentType;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use term::Statement;

#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub minter: Minter,
    pub metadata: OntologyMetadata,
    /// Restrict per-subject partitions to these subject keys. Validation
    /// still covers the whole graph.
    pub subjects: Option<BTreeSet<String>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error(transparent)]
    Faults(#[from] FaultReport),

    #[error("unknown subject(s): {}; available: {}", .unknown.join(", "), .available.join(", "))]
    UnknownSubjects {
        unknown: Vec<String>,
        available: Vec<String>,
    },
}

/// One rendered output file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPartition {
    pub key: PartitionKey,
    /// Relative to the output root.
    pub path: PathBuf,
    /// Document nodes owned by this partition.
    pub nodes: usize,
    /// Distinct statements, header included.
    pub statements: usize,
    pub digest: String,
    pub text: String,
}

/// The complete partition set of one run, in partition-key order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Conversion {
    pub partitions: Vec<RenderedPartition>,
}

impl Conversion {
    pub fn partition(&self, key: &PartitionKey) -> Option<&RenderedPartition> {
        self.partitions.iter().find(|p| &p.key == key)
    }

    /// Parse every partition back and check the triple counts.
    pub fn verify(&self) -> Result<()> {
        for partition in &self.partitions {
            let parsed = check::parse_turtle(&partition.text)
                .map_err(|e| anyhow!("{}: {e}", partition.path.display()))?;
            if parsed != partition.statements {
                return Err(anyhow!(
                    "{}: parsed {parsed} triples, expected {}",
                    partition.path.display(),
                    partition.statements
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct Converter {
    options: ConvertOptions,
}

impl Converter {
    pub fn new(options: ConvertOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ConvertOptions {
        &self.options
    }

    pub fn resolve(&self, loaded: LoadedDocuments) -> Result<ResolvedGraph, FaultReport> {
        resolve(loaded, &self.options.minter)
    }

    pub fn convert_documents(&self, loaded: LoadedDocuments) -> Result<Conversion, ConvertError> {
        let graph = self.resolve(loaded)?;
        self.convert(&graph)
    }

    /// Map, route and render a resolved graph.
    pub fn convert(&self, graph: &ResolvedGraph) -> Result<Conversion, ConvertError> {
        let minter = &self.options.minter;
        let router = Router::new(graph);
        let selected = self.selected_subjects(&router)?;

        let mut buckets: BTreeMap<PartitionKey, (usize, Vec<Statement>)> = BTreeMap::new();
        buckets.insert(PartitionKey::ProgrammeStructure, (0, Vec::new()));
        if graph.of_type(DocumentType::Theme).next().is_some() {
            buckets.insert(PartitionKey::Themes, (0, partition::themes_scheme_statements(minter)));
        }
        for subject in &selected {
            for part in SubjectPart::ALL {
                buckets.insert(
                    PartitionKey::Subject {
                        subject: subject.to_string(),
                        part,
                    },
                    (0, Vec::new()),
                );
            }
        }

        let mapped = mapper::map_all(graph, minter);
        for (id, statements) in mapped.into_iter().enumerate() {
            let key = router.route(id);
            if let Some(subject) = key.subject() {
                if !selected.contains(subject) {
                    continue;
                }
            }
            let bucket = buckets.entry(key).or_default();
            bucket.0 += 1;
            bucket.1.extend(statements);
        }

        let partitions = buckets
            .into_iter()
            .map(|(key, (nodes, mut statements))| {
                statements.extend(partition::header_statements(
                    &key,
                    minter,
                    &self.options.metadata,
                ));
                let unique: BTreeSet<Statement> = statements.into_iter().collect();
                let unique: Vec<Statement> = unique.into_iter().collect();
                let text = turtle::render_turtle(&unique);
                tracing::debug!(
                    partition = %key,
                    nodes,
                    statements = unique.len(),
                    "rendered partition"
                );
                RenderedPartition {
                    path: key.relative_path(),
                    key,
                    nodes,
                    statements: unique.len(),
                    digest: digest::fnv1a64_digest_bytes(text.as_bytes()),
                    text,
                }
            })
            .collect::<Vec<_>>();

        tracing::info!(partitions = partitions.len(), "conversion complete");
        Ok(Conversion { partitions })
    }

    fn selected_subjects<'r>(
        &self,
        router: &'r Router<'_>,
    ) -> Result<BTreeSet<&'r str>, ConvertError> {
        let available = router.subjects();
        let Some(wanted) = &self.options.subjects else {
            return Ok(available);
        };

        let unknown: Vec<String> = wanted
            .iter()
            .filter(|s| !available.contains(s.as_str()))
            .cloned()
            .collect();
        if !unknown.is_empty() {
            return Err(ConvertError::UnknownSubjects {
                unknown,
                available: available.iter().map(|s| s.to_string()).collect(),
            });
        }
        Ok(available
            .into_iter()
            .filter(|s| wanted.contains(*s))
            .collect())
    }
}

/// Resolve and convert with the given options.
pub fn convert_documents(
    loaded: LoadedDocuments,
    options: ConvertOptions,
) -> Result<Conversion, ConvertError> {
    Converter::new(options).convert_documents(loaded)
}
