//! deeppcb2yolo: turn the DeepPCB defect corpus into a YOLO dataset.
//!
//! The raw corpus stores absolute corner boxes next to each tested board
//! image. This crate pairs images with their annotation files, converts the
//! boxes to normalized center/size labels, splits the corpus
//! deterministically into train and val, and writes the Ultralytics
//! `images/` + `labels/` tree with a `data.yaml` manifest.
//!
//! # Modules
//!
//! - [`ir`]: Box types, the defect taxonomy, DeepPCB and YOLO I/O
//! - [`split`]: Seeded train/val assignment
//! - [`prepare`]: The conversion pipeline and its run report
//! - [`validation`]: Checks an emitted tree against the trainer contract
//! - [`error`]: Error types for deeppcb2yolo operations

pub mod error;
pub mod ir;
pub mod prepare;
pub mod split;
pub mod validation;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use error::Deeppcb2YoloError;

/// The deeppcb2yolo CLI application.
#[derive(Parser)]
#[command(name = "deeppcb2yolo")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert a raw DeepPCB corpus into a YOLO dataset.
    Prepare(PrepareArgs),
    /// Check an emitted YOLO dataset for problems.
    Check(CheckArgs),
}

/// Report rendering.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Arguments for the prepare subcommand.
#[derive(clap::Args)]
struct PrepareArgs {
    /// Root of the raw DeepPCB corpus.
    #[arg(long, env = "DEEPPCB_RAW_ROOT")]
    raw: PathBuf,

    /// Destination dataset root. Existing content is deleted.
    #[arg(long, env = "DEEPPCB_DEST_ROOT")]
    dest: PathBuf,

    /// Seed for the train/val shuffle.
    #[arg(long, env = "DEEPPCB_SEED", default_value_t = split::DEFAULT_SEED)]
    seed: u64,

    /// Fraction of candidates assigned to train.
    #[arg(long, default_value_t = split::DEFAULT_TRAIN_RATIO, value_parser = parse_ratio)]
    train_ratio: f64,

    /// File-name glob selecting candidate images.
    #[arg(long, default_value = ir::io_deeppcb::DEFAULT_CANDIDATE_PATTERN)]
    pattern: String,

    /// Output format for the run summary.
    #[arg(long, value_enum, default_value = "text")]
    output: OutputFormat,

    /// Hide progress bars.
    #[arg(long, short)]
    quiet: bool,
}

/// Arguments for the check subcommand.
#[derive(clap::Args)]
struct CheckArgs {
    /// Dataset root containing data.yaml, images/ and labels/.
    root: PathBuf,

    /// Treat warnings as errors (exit non-zero if any warnings).
    #[arg(long)]
    strict: bool,

    /// Output format for the report.
    #[arg(long, value_enum, default_value = "text")]
    output: OutputFormat,
}

/// Run the deeppcb2yolo CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), Deeppcb2YoloError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Prepare(args)) => run_prepare(args),
        Some(Commands::Check(args)) => run_check(args),
        None => {
            println!("deeppcb2yolo {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Convert the DeepPCB defect corpus into a YOLO detection dataset.");
            println!();
            println!("Run 'deeppcb2yolo --help' for usage information.");
            Ok(())
        }
    }
}

fn run_prepare(args: PrepareArgs) -> Result<(), Deeppcb2YoloError> {
    let config = prepare::PrepareConfig {
        seed: args.seed,
        train_ratio: args.train_ratio,
        pattern: args.pattern,
        show_progress: !args.quiet && args.output == OutputFormat::Text,
        ..prepare::PrepareConfig::new(args.raw, args.dest)
    };

    let report = prepare::prepare_dataset(&config)?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", report),
    }
    Ok(())
}

fn run_check(args: CheckArgs) -> Result<(), Deeppcb2YoloError> {
    let report = validation::check_dataset(&args.root)?;

    match args.output {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => print!("{}", report),
    }

    let opts = validation::CheckOptions {
        strict: args.strict,
    };
    if opts.fails(&report) {
        Err(Deeppcb2YoloError::CheckFailed {
            error_count: report.error_count(),
            warning_count: report.warning_count(),
            report,
        })
    } else {
        Ok(())
    }
}

fn parse_ratio(raw: &str) -> Result<f64, String> {
    match raw.parse::<f64>() {
        Ok(val) if (0.0..=1.0).contains(&val) => Ok(val),
        _ => Err("ratio must be between 0.0 and 1.0".to_string()),
    }
}
