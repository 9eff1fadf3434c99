//! PDF Radicación CLI tool
//!
//! Command-line front end: reads scans and the reference workbook from disk,
//! runs a batch and writes the renamed PDFs into a directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use glob::glob;
use tracing::warn;

use pdf_radicacion::grouping::{group_documents, ParsedDocument};
use pdf_radicacion::{
    logging, parse_document_name, BatchConfig, BatchProcessor, RawDocument, UnknownSubtypePolicy,
};

/// PDF Radicación - merge and rename scanned invoice documents
#[derive(Parser)]
#[command(name = "pdf-radicacion")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Process every scan in a folder
    pdf-radicacion process --reference facturas.xlsx --nit 900364721 -o salida \"scans/*.pdf\"

    # Keep going with unknown subtype codes, naming them OTHER
    pdf-radicacion process -r facturas.xlsx --nit 900364721 -o salida --unknown-subtype fallback scans/*.pdf

    # Show how scans would be grouped, without merging
    pdf-radicacion plan \"scans/*.pdf\"")]
struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge and rename a batch of scans using the reference workbook
    Process {
        /// Input PDF files. Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Reference workbook (column A = consecutive, column B = record number)
        #[arg(short, long)]
        reference: PathBuf,

        /// Provider identifier (NIT) used in output names
        #[arg(long)]
        nit: String,

        /// Output directory
        #[arg(short, long)]
        output: PathBuf,

        /// Worker threads for merging (default: from config or CPU count)
        #[arg(short, long)]
        jobs: Option<usize>,

        /// What to do with unknown subtype codes
        #[arg(long, value_enum)]
        unknown_subtype: Option<PolicyArg>,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Exit with status 2 if anything was skipped
        #[arg(long)]
        strict: bool,
    },

    /// Show how scans would be grouped and ordered, without merging
    Plan {
        /// Input PDF files. Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    Skip,
    Fallback,
}

impl From<PolicyArg> for UnknownSubtypePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Skip => UnknownSubtypePolicy::Skip,
            PolicyArg::Fallback => UnknownSubtypePolicy::Fallback,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Process {
            inputs,
            reference,
            nit,
            output,
            jobs,
            unknown_subtype,
            config,
            strict,
        } => cmd_process(
            inputs,
            reference,
            nit,
            output,
            jobs,
            unknown_subtype,
            config,
            strict,
        ),
        Commands::Plan { inputs } => cmd_plan(inputs),
        Commands::Info { input } => cmd_info(input),
    };

    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            process::exit(1);
        }
    }
}

/// Resolve input arguments to files, sorted so that upload positions are
/// stable between runs
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for pattern in patterns {
        if pattern.contains(['*', '?', '[']) {
            let mut matched = false;
            for entry in glob(&pattern).with_context(|| format!("invalid glob pattern: {}", pattern))? {
                match entry {
                    Ok(path) => {
                        paths.push(path);
                        matched = true;
                    }
                    Err(e) => warn!("glob error for {}: {}", pattern, e),
                }
            }
            if !matched {
                bail!("no files matched pattern: {}", pattern);
            }
        } else {
            paths.push(PathBuf::from(pattern));
        }
    }

    paths.sort();

    Ok(paths)
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Read every input into memory, in sorted path order
fn read_documents(paths: &[PathBuf]) -> Result<Vec<RawDocument>> {
    paths
        .iter()
        .map(|path| {
            let bytes = fs::read(path).with_context(|| format!("cannot read {}", path.display()))?;
            Ok(RawDocument::new(display_name(path), bytes))
        })
        .collect()
}

/// Run a batch and write its artifacts
#[allow(clippy::too_many_arguments)]
fn cmd_process(
    inputs: Vec<String>,
    reference: PathBuf,
    nit: String,
    output: PathBuf,
    jobs: Option<usize>,
    unknown_subtype: Option<PolicyArg>,
    config: Option<PathBuf>,
    strict: bool,
) -> Result<i32> {
    if nit.trim().is_empty() {
        bail!("--nit must not be empty");
    }

    let mut config = match config {
        Some(path) => BatchConfig::from_file(&path)?,
        None => BatchConfig::default(),
    };
    if let Some(jobs) = jobs {
        config.concurrency = jobs;
    }
    if let Some(policy) = unknown_subtype {
        config.unknown_subtype = policy.into();
    }

    let paths = expand_globs(inputs)?;
    let documents = read_documents(&paths)?;
    let reference_bytes =
        fs::read(&reference).with_context(|| format!("cannot read {}", reference.display()))?;

    eprintln!("Processing {} PDF files...", documents.len());

    let mut processor = BatchProcessor::new(&config)?;
    let report = processor
        .run(documents, &reference_bytes, nit.trim())
        .with_context(|| format!("batch aborted ({})", reference.display()))?;

    fs::create_dir_all(&output)
        .with_context(|| format!("cannot create {}", output.display()))?;

    for artifact in &report.artifacts {
        let target = output.join(&artifact.filename);
        fs::write(&target, &artifact.content)
            .with_context(|| format!("cannot write {}", target.display()))?;
        println!("  {} ({} pages)", artifact.filename, artifact.pages);
    }

    println!("{}", report.summary());

    if !report.diagnostics.is_empty() {
        println!("Skipped:");
        for diagnostic in &report.diagnostics {
            println!("  - {}", diagnostic);
        }
    }

    eprintln!("Output: {}", output.display());

    Ok(if strict && !report.is_clean() { 2 } else { 0 })
}

/// Print the groups a batch would form
fn cmd_plan(inputs: Vec<String>) -> Result<i32> {
    let paths = expand_globs(inputs)?;

    let mut parsed = Vec::new();
    let mut invalid = Vec::new();

    for (position, path) in paths.iter().enumerate() {
        let name = display_name(path);
        match parse_document_name(&name) {
            Ok(identity) => parsed.push(ParsedDocument {
                position,
                identity,
                document: RawDocument::new(name, Vec::new()),
            }),
            Err(e) => invalid.push(e.to_string()),
        }
    }

    let groups = group_documents(parsed);
    for group in &groups {
        println!("{}: {}", group.key, group.member_names().join(" + "));
    }

    if !invalid.is_empty() {
        println!("Invalid names:");
        for message in &invalid {
            println!("  - {}", message);
        }
    }

    println!("{} group(s), {} invalid name(s)", groups.len(), invalid.len());

    Ok(0)
}

/// Show information about a PDF
fn cmd_info(input: PathBuf) -> Result<i32> {
    let bytes = fs::read(&input).with_context(|| format!("cannot read {}", input.display()))?;
    let metadata = pdf_radicacion::pdf::extract_metadata(&display_name(&input), &bytes)?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }

    if let Ok(identity) = parse_document_name(&display_name(&input)) {
        println!(
            "Consecutive: {}, subtype: {}",
            identity.consecutive_id, identity.subtype_code
        );
    }

    Ok(0)
}
