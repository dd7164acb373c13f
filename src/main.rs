//! selstats - Diversity and selection statistics for coding alignments
//!
//! ## Usage
//!
//! ```bash
//! selstats -a geneA.fasta
//! selstats -d alignments/ -f -o dsim dyak
//! ```
//!
//! Results are written to `selectionStats.txt` in the working directory.

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use log::{info, warn};

use selstats::analysis::{analyze_inputs, AnalysisConfig};
use selstats::genetic_code::{GeneticCode, GeneticCodes};
use selstats::input::{existing_dir, existing_file, resolve_inputs, InputSource};
use selstats::report::DEFAULT_REPORT_NAME;
use selstats::stats::DEFAULT_MAX_MISSING;

/// clap value parser for the genetic code id.
fn genetic_code(value: &str) -> Result<GeneticCode, String> {
    let id: u8 = value
        .parse()
        .map_err(|_| format!("{} is not a genetic code id", value))?;
    let codes = GeneticCodes::new();
    codes.get(id).cloned().ok_or_else(|| {
        let known: Vec<String> = codes.all().iter().map(|c| c.id.to_string()).collect();
        format!("Unknown genetic code {} (available: {})", id, known.join(", "))
    })
}

/// clap value parser for the missing-data threshold.
fn fraction(value: &str) -> Result<f64, String> {
    let x: f64 = value
        .parse()
        .map_err(|_| format!("{} is not a number", value))?;
    if (0.0..=1.0).contains(&x) {
        Ok(x)
    } else {
        Err(format!("{} is not between 0 and 1", x))
    }
}

/// Calculate diversity and selection statistics
///
/// Reads one FASTA alignment or a directory of `*.fasta` alignments and
/// writes theta, pi, Tajima's D, and in frame mode piN, piS and one
/// McDonald-Kreitman test per outgroup.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(group(ArgGroup::new("input").required(true).args(["alignment", "directory"])))]
struct Args {
    /// Alignment to calculate statistics
    #[arg(short = 'a', long = "alignment", value_parser = existing_file)]
    alignment: Option<PathBuf>,

    /// Directory of alignments (*.fasta)
    #[arg(short = 'd', long = "directory", value_parser = existing_dir)]
    directory: Option<PathBuf>,

    /// Alignments are in correct reading frame (enables stop masking, piN/piS and MK tests)
    #[arg(short = 'f', long = "frame")]
    frame: bool,

    /// Outgroup(s) for McDonald-Kreitman tests
    #[arg(short = 'o', long = "outgroup", num_args = 1..)]
    outgroup: Vec<String>,

    /// Genetic code used to classify synonymous changes (NCBI id)
    #[arg(short = 'g', long = "genetic-code", default_value = "1", value_parser = genetic_code)]
    genetic_code: GeneticCode,

    /// Maximum fraction of missing data for a site to be analysed
    #[arg(long = "max-missing", default_value_t = DEFAULT_MAX_MISSING, value_parser = fraction)]
    max_missing: f64,

    /// Report file
    #[arg(long = "output", default_value = DEFAULT_REPORT_NAME)]
    output: PathBuf,

    /// Verbose logging
    #[arg(short = 'v', long = "verbose")]
    verbose: bool,
}

impl Args {
    fn source(&self) -> InputSource {
        match (&self.alignment, &self.directory) {
            (Some(file), _) => InputSource::Alignment(file.clone()),
            (None, Some(dir)) => InputSource::Directory(dir.clone()),
            (None, None) => unreachable!("clap requires one input"),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if !args.outgroup.is_empty() && !args.frame {
        warn!("Outgroups are only used in frame mode (-f); no MK tests will be run");
    }

    let inputs = resolve_inputs(&args.source())?;
    info!("Analysing {} alignment(s)", inputs.len());

    let config = AnalysisConfig {
        frame: args.frame,
        outgroups: args.outgroup.clone(),
        max_missing: args.max_missing,
        genetic_code: args.genetic_code.clone(),
    };
    let table = analyze_inputs(&inputs, &config).context("Analysis aborted, no report written")?;

    let written = table
        .write_file(&args.output)
        .with_context(|| format!("Could not write {}", args.output.display()))?;
    let rejected: Vec<&str> = table.rejected().collect();
    if !rejected.is_empty() {
        warn!("Not in frame, left out of the report: {}", rejected.join(", "));
    }
    if table.is_empty() {
        warn!("No alignment analysed, {} holds the header only", args.output.display());
    } else {
        info!(
            "Wrote {} of {} alignment(s) to {}",
            written,
            table.len(),
            args.output.display()
        );
    }

    Ok(())
}
