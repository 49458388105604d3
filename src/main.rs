// beat-corpus CLI
// Builds corpora of corrupted beat predictions and scores single files

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use beat_corpus::beats::{read_annotation_file, write_beats_file};
use beat_corpus::corpus::generate_prediction;
use beat_corpus::evaluation::score;
use beat_corpus::rng::create_rng;
use beat_corpus::{BuildConfig, CorpusBuilder, EvaluationConfig, SeverityConfig};

/// Generate imperfect beat-tracking predictions from ground-truth annotations
#[derive(Parser)]
#[command(name = "beat-corpus")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the prediction corpus for a dataset split
    Build {
        /// Path to a JSON build config (defaults are used when omitted)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Split to build, overriding the config
        #[arg(long)]
        split: Option<String>,

        /// Base seed, overriding the config
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Corrupt one annotation file, clean it and print its F1
    Corrupt {
        /// Ground-truth annotation file
        #[arg(short, long)]
        annotation: PathBuf,

        /// RNG seed
        #[arg(long, default_value_t = 0)]
        seed: u64,

        /// Write the cleaned prediction here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Score an estimated beat file against a reference
    Score {
        /// Reference annotation file
        #[arg(short, long)]
        reference: PathBuf,

        /// Estimated beat file
        #[arg(short, long)]
        estimate: PathBuf,

        /// Match window in seconds
        #[arg(long, default_value_t = 0.07)]
        tolerance: f64,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            config,
            split,
            seed,
        } => run_build(config, split, seed),
        Commands::Corrupt {
            annotation,
            seed,
            output,
        } => run_corrupt(annotation, seed, output),
        Commands::Score {
            reference,
            estimate,
            tolerance,
        } => run_score(reference, estimate, tolerance),
    }
}

fn run_build(config_path: Option<PathBuf>, split: Option<String>, seed: Option<u64>) -> Result<()> {
    let mut config = match config_path {
        Some(path) => BuildConfig::load(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => BuildConfig::default(),
    };
    if let Some(split) = split {
        config.split = split;
    }
    if let Some(seed) = seed {
        config.base_seed = seed;
    }

    let builder = CorpusBuilder::open(config).context("Failed to open corpus builder")?;
    let summary = builder.build().context("Corpus build failed")?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    if summary.processed == 0 {
        bail!("No performances were processed");
    }
    Ok(())
}

fn run_corrupt(annotation_path: PathBuf, seed: u64, output: Option<PathBuf>) -> Result<()> {
    let annotation = read_annotation_file(&annotation_path)
        .with_context(|| format!("Failed to read {}", annotation_path.display()))?;

    let mut rng = create_rng(seed);
    let (result, stats) = generate_prediction(
        &annotation,
        &SeverityConfig::default(),
        &EvaluationConfig::default(),
        &mut rng,
    )?;

    log::info!(
        "Deleted {}, inserted {}, offset {}, noisy {}",
        stats.deleted,
        stats.inserted,
        stats.offset,
        stats.noisy
    );

    if let Some(path) = output {
        write_beats_file(&path, &result.prediction)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    println!("F1: {:.4}", result.f1);
    Ok(())
}

fn run_score(reference_path: PathBuf, estimate_path: PathBuf, tolerance: f64) -> Result<()> {
    let reference = read_annotation_file(&reference_path)
        .with_context(|| format!("Failed to read {}", reference_path.display()))?;
    let estimate = read_annotation_file(&estimate_path)
        .with_context(|| format!("Failed to read {}", estimate_path.display()))?;

    let config = EvaluationConfig {
        tolerance,
        ..EvaluationConfig::default()
    };
    let f1 = score(&estimate, &reference, &config)?;

    println!("F1: {:.4}", f1);
    Ok(())
}
