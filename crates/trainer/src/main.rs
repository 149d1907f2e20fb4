//! Wine Forest Trainer CLI
//!
//! Trains the Wine random forest deterministically and writes `modelo.pkl`.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;
use wine_forest::DEFAULT_ARTIFACT_PATH;
use wine_trainer::{save_and_verify, train_and_evaluate, Dataset, TrainingParams};

#[derive(Parser, Debug)]
#[command(name = "train")]
#[command(author = "Wine Classifier Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deterministic random-forest trainer for the Wine classifier", long_about = None)]
struct Args {
    /// CSV dataset (13 feature columns, last column is the class id).
    /// Defaults to the bundled Wine dataset.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output path for the model artifact
    #[arg(short, long, default_value = DEFAULT_ARTIFACT_PATH)]
    output: PathBuf,

    /// Number of trees in the forest
    #[arg(long, default_value = "100")]
    trees: usize,

    /// Maximum tree depth (unlimited when omitted)
    #[arg(long)]
    max_depth: Option<usize>,

    /// Minimum samples per leaf
    #[arg(long, default_value = "1")]
    min_samples_leaf: usize,

    /// Features examined per split (defaults to floor(sqrt(n_features)))
    #[arg(long)]
    max_features: Option<usize>,

    /// Fraction of samples held out for evaluation
    #[arg(long, default_value = "0.2")]
    test_size: f64,

    /// Random seed for the split and the forest
    #[arg(long, default_value = "42")]
    seed: i64,

    /// Copy an existing artifact to `<output>.bak` before replacing it
    #[arg(long)]
    backup: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Wine Random Forest Trainer v{}", env!("CARGO_PKG_VERSION"));

    let dataset = match &args.input {
        Some(path) => {
            info!("Loading dataset from: {}", path.display());
            Dataset::from_csv(path).context("Failed to load dataset")?
        }
        None => {
            info!("Loading bundled Wine dataset");
            Dataset::wine()?
        }
    };

    info!(
        "Loaded {} samples with {} features, class counts {:?}",
        dataset.len(),
        dataset.feature_count,
        dataset.class_counts()
    );

    info!("Feature statistics:");
    for (name, (min, max)) in dataset.feature_names.iter().zip(dataset.feature_stats()) {
        info!("  {}: min={}, max={}", name, min, max);
    }

    let params = TrainingParams {
        n_trees: args.trees,
        max_depth: args.max_depth,
        min_samples_leaf: args.min_samples_leaf,
        max_features: args.max_features,
        seed: args.seed,
        ..TrainingParams::default()
    };

    info!("Training configuration:");
    info!("  Trees: {}", params.n_trees);
    info!(
        "  Max depth: {}",
        params
            .max_depth
            .map_or_else(|| "unlimited".to_string(), |d| d.to_string())
    );
    info!("  Min samples per leaf: {}", params.min_samples_leaf);
    info!(
        "  Max features: {}",
        params.resolved_max_features(dataset.feature_count)
    );
    info!("  Seed: {}", params.seed);

    let outcome = train_and_evaluate(&dataset, params, args.test_size)
        .context("Training failed")?;

    info!(
        "Trained {} trees on {} samples, evaluated on {}",
        outcome.model.num_trees(),
        outcome.train_len,
        outcome.test_len
    );
    println!("\nAccuracy: {:.4}\n", outcome.report.accuracy);
    println!("{}", outcome.report);

    let probe = dataset
        .features
        .first()
        .context("Dataset has no rows to verify against")?
        .clone();

    let (artifact, class_name) = save_and_verify(outcome.model, &args.output, args.backup, &probe)
        .context("Failed to save model")?;

    info!("✓ Training completed successfully");
    info!("  Model: {}", args.output.display());
    info!("  Hash: {}", artifact.model_hash);
    info!("  Sample prediction: {}", class_name);

    Ok(())
}
