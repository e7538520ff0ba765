//! Curriculum CLI
//!
//! Converts CMS curriculum snapshots into the published Turtle partitions:
//! - `convert`: load, validate, render and write (all partitions or none)
//! - `subjects`: list the subject keys a snapshot would produce
//! - `check`: Turtle syntax check of an existing output tree

use anyhow::{anyhow, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use curriculum_convert::partition::subject_key;
use curriculum_convert::{
    check, load_snapshot, load_snapshot_file, write_partitions, ConvertError, ConvertOptions,
    Converter, FaultReport, LoadedDocuments, Minter, OntologyMetadata,
};
use curriculum_model::DocumentType;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

mod fetch;

const DEFAULT_INPUT: &str = "sanity-sample-data/sample-data.json";
const DEFAULT_OUT_DIR: &str = "data/national-curriculum-for-england";
const DEFAULT_ONTOLOGY_VERSION: &str = "0.1.0";

/// Output directories holding archived releases; never checked.
const VERSIONS_DIR: &str = "versions";

#[derive(Parser)]
#[command(name = "curriculum")]
#[command(
    author,
    version,
    about = "Curriculum CMS snapshots to ontology-conformant RDF/Turtle"
)]
struct Cli {
    /// More log output (-v info, -vv debug). `RUST_LOG` takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a snapshot into Turtle partitions.
    ///
    /// Every document is validated first. On any fault the full fault list is
    /// reported and nothing is written.
    Convert {
        #[command(flatten)]
        source: SourceArgs,
        /// Output root
        #[arg(long, default_value = DEFAULT_OUT_DIR)]
        out_dir: PathBuf,
        /// Subject keys to emit (comma separated), or `all`
        #[arg(long, value_delimiter = ',', default_value = "all")]
        subjects: Vec<String>,
        /// `dcterms:created` date for every partition header (YYYY-MM-DD)
        #[arg(long)]
        created: Option<NaiveDate>,
        /// `owl:versionInfo` for every partition header
        #[arg(long = "version", default_value = DEFAULT_ONTOLOGY_VERSION)]
        ontology_version: String,
        /// Base IRI for minted identifiers (must end in `/` or `#`)
        #[arg(long)]
        base: Option<String>,
        /// Parse every rendered partition back before writing
        #[arg(long)]
        verify: bool,
        /// Validate and render, but write nothing
        #[arg(long)]
        dry_run: bool,
        /// Also write the fault report as JSON when conversion fails
        #[arg(long)]
        faults_json: Option<PathBuf>,
    },

    /// List the subject keys found in a snapshot.
    Subjects {
        #[command(flatten)]
        source: SourceArgs,
    },

    /// Check Turtle syntax of files or directory trees (skips `versions/`).
    Check {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Where documents come from
    #[arg(long, value_enum, default_value_t = Source::Sample)]
    source: Source,
    /// Snapshot file (sample source)
    #[arg(long, default_value = DEFAULT_INPUT)]
    input: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Source {
    /// Static JSON snapshot; no credentials needed
    Sample,
    /// CMS query API; credentials from the environment
    Api,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Convert {
            source,
            out_dir,
            subjects,
            created,
            ontology_version,
            base,
            verify,
            dry_run,
            faults_json,
        } => {
            let options = convert_options(&subjects, created, ontology_version, base.as_deref())?;
            cmd_convert(
                &source,
                &out_dir,
                options,
                verify,
                dry_run,
                faults_json.as_deref(),
            )
        }
        Commands::Subjects { source } => cmd_subjects(&source),
        Commands::Check { paths } => cmd_check(&paths),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn convert_options(
    subjects: &[String],
    created: Option<NaiveDate>,
    version: String,
    base: Option<&str>,
) -> Result<ConvertOptions> {
    let minter = match base {
        None => Minter::default(),
        Some(base) => {
            url::Url::parse(base).map_err(|e| anyhow!("invalid --base {base:?}: {e}"))?;
            if !(base.ends_with('/') || base.ends_with('#')) {
                return Err(anyhow!("invalid --base {base:?}: must end in `/` or `#`"));
            }
            Minter::new(base)
        }
    };

    let wanted: BTreeSet<String> = subjects
        .iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    let subjects = if wanted.is_empty() || wanted.contains("all") {
        None
    } else {
        Some(wanted)
    };

    Ok(ConvertOptions {
        minter,
        metadata: OntologyMetadata { version, created },
        subjects,
    })
}

fn load(source: &SourceArgs) -> Result<(LoadedDocuments, String)> {
    match source.source {
        Source::Sample => {
            let loaded = load_snapshot_file(&source.input)?;
            Ok((loaded, source.input.display().to_string()))
        }
        Source::Api => {
            let config = fetch::FetchConfig::from_env()?;
            let snapshot = fetch::fetch_snapshot(&config)?;
            Ok((load_snapshot(&snapshot), config.describe()))
        }
    }
}

fn cmd_convert(
    source: &SourceArgs,
    out_dir: &Path,
    options: ConvertOptions,
    verify: bool,
    dry_run: bool,
    faults_json: Option<&Path>,
) -> Result<()> {
    let (loaded, origin) = load(source)?;
    println!(
        "{} {} documents from {}",
        "Loaded".green().bold(),
        loaded.documents.len(),
        origin
    );
    for ty in DocumentType::ALL {
        let count = loaded.count_of(ty);
        if count > 0 {
            println!("  {} {:<22} {}", "→".yellow(), ty.collection(), count);
        }
    }

    let conversion = match Converter::new(options).convert_documents(loaded) {
        Ok(conversion) => conversion,
        Err(ConvertError::Faults(report)) => {
            if let Some(path) = faults_json {
                write_fault_report(path, &report)?;
            }
            return Err(report.into());
        }
        Err(e) => return Err(e.into()),
    };

    if verify {
        conversion.verify()?;
        println!(
            "{} {} partitions parse back cleanly",
            "ok".green().bold(),
            conversion.partitions.len()
        );
    }

    if !dry_run {
        write_partitions(out_dir, &conversion)?;
    }

    let verb = if dry_run { "rendered" } else { "wrote" };
    for partition in &conversion.partitions {
        let shown = if dry_run {
            partition.path.clone()
        } else {
            out_dir.join(&partition.path)
        };
        println!(
            "{} {} ({} documents, {} statements, {})",
            verb.green().bold(),
            shown.display().to_string().bold(),
            partition.nodes,
            partition.statements,
            partition.digest
        );
    }
    if dry_run {
        println!("  {} dry run: nothing written", "→".yellow());
    }
    Ok(())
}

fn write_fault_report(path: &Path, report: &FaultReport) -> Result<()> {
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    eprintln!("{} {}", "wrote".yellow().bold(), path.display());
    Ok(())
}

fn cmd_subjects(source: &SourceArgs) -> Result<()> {
    let (loaded, _) = load(source)?;
    let subjects: BTreeSet<&str> = loaded
        .documents
        .iter()
        .filter(|d| d.doc_type == DocumentType::Subject)
        .map(|d| subject_key(&d.slug))
        .collect();
    if subjects.is_empty() {
        eprintln!("{} no subjects found", "info:".yellow().bold());
    }
    for subject in subjects {
        println!("{subject}");
    }
    Ok(())
}

fn cmd_check(paths: &[PathBuf]) -> Result<()> {
    let mut files: Vec<PathBuf> = Vec::new();
    for root in paths {
        if root.is_file() {
            files.push(root.clone());
            continue;
        }
        for entry in walkdir::WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !(e.file_type().is_dir() && e.file_name() == VERSIONS_DIR))
        {
            let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
            let path = entry.path();
            if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "ttl") {
                files.push(path.to_path_buf());
            }
        }
    }
    if files.is_empty() {
        return Err(anyhow!("no .ttl files found"));
    }

    let mut failed = 0usize;
    for file in &files {
        match check::check_file(file) {
            Ok(triples) => println!(
                "{} {} ({} triples)",
                "ok".green().bold(),
                file.display(),
                triples
            ),
            Err(e) => {
                failed += 1;
                println!("{} {}: {e:#}", "error".red().bold(), file.display());
            }
        }
    }

    if failed > 0 {
        return Err(anyhow!(
            "{failed} of {} file(s) failed the Turtle check",
            files.len()
        ));
    }
    Ok(())
}
