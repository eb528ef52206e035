use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use proteus_io::{DatasetReader, ExperimentName, ResultWriter, read_shapelets};
use proteus_series::Rescaling;
use proteus_shapelet::timing::{ContractPlan, estimate_operations, total_candidates};
use proteus_shapelet::{
    Checkpoint, ClassValueMode, DistanceType, FileCheckpoint, FittedShapeletTransform,
    QualityMeasure, SearchStrategy, ShapeletDistance, ShapeletTransformConfig,
};

#[derive(Parser)]
#[command(name = "proteus")]
#[command(about = "Shapelet discovery and shapelet-transform features for time series classification")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// How candidates are compared with series.
#[derive(Args, Debug, Clone)]
struct DistanceArgs {
    /// Window rescaling: "z-normalize" or "none"
    #[arg(long, default_value = "z-normalize")]
    rescaling: String,

    /// Multivariate distance: "independent" or "dependent"
    #[arg(long, default_value = "independent")]
    distance: String,
}

/// Search tuning shared by `fit`.
#[derive(Args, Debug, Clone)]
struct SearchArgs {
    /// Number of shapelets to keep (defaults to min(10 N, 1000))
    #[arg(long)]
    k: Option<usize>,

    /// Shortest candidate length (defaults to 3)
    #[arg(long)]
    min_length: Option<usize>,

    /// Longest candidate length (defaults to the series length)
    #[arg(long)]
    max_length: Option<usize>,

    /// Search strategy: "full", "random", "improved-random", "subsample",
    /// "refined", "skewed", "tabu", "local", "genetic", "skipping" or "timed"
    #[arg(long)]
    strategy: Option<String>,

    /// Candidate count: per series for random/tabu/local/genetic, in total for
    /// the improved-random family
    #[arg(long, default_value_t = 1000)]
    candidates: u64,

    /// Step between candidate lengths (full and skipping)
    #[arg(long, default_value_t = 1)]
    length_step: usize,

    /// Step between candidate starts (full and skipping)
    #[arg(long, default_value_t = 1)]
    position_step: usize,

    /// Fraction of series searched by "subsample"
    #[arg(long, default_value_t = 0.5)]
    proportion: f64,

    /// Minimum coverage ratio kept by "refined"
    #[arg(long, default_value_t = 0.1)]
    min_ratio: f64,

    /// Comma-separated length weights for "skewed", one per length
    #[arg(long, value_delimiter = ',')]
    length_weights: Vec<f64>,

    /// Quality measure: "information-gain", "f-stat" or "kruskal-wallis"
    #[arg(long, default_value = "information-gain")]
    quality: String,

    /// Score candidates one-vs-rest around their own class
    #[arg(long, default_value_t = false)]
    binary: bool,

    /// Keep an equal share of shapelets per class
    #[arg(long, default_value_t = false)]
    balanced: bool,

    /// Visit series in class round-robin order
    #[arg(long, default_value_t = false)]
    round_robin: bool,

    /// Keep shapelets that overlap a better one from the same series
    #[arg(long, default_value_t = false)]
    keep_self_similar: bool,

    /// Drop near-identical shapelets when merging
    #[arg(long, default_value_t = false)]
    prune_near_duplicates: bool,

    /// Abandon candidates that cannot beat the current K-th best
    #[arg(long, default_value_t = false)]
    pruning: bool,

    /// Wall-clock contract in seconds
    #[arg(long)]
    contract_secs: Option<f64>,

    /// Re-estimate the per-series quota from observed timings (needs a contract)
    #[arg(long, default_value_t = false)]
    adaptive: bool,

    /// Maximum passes over the data when a contract allows restarts
    #[arg(long, default_value_t = 10)]
    max_passes: usize,

    #[command(flatten)]
    distance: DistanceArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Discover shapelets in a labelled dataset and write the transformed training set
    Fit {
        /// Path to the input CSV file
        #[arg(long)]
        data: PathBuf,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        /// Write a search checkpoint after every series
        #[arg(long, default_value_t = false)]
        checkpoint: bool,

        /// Resume the search from a checkpoint file
        #[arg(long)]
        resume: Option<PathBuf>,

        #[command(flatten)]
        search: SearchArgs,
    },

    /// Transform a dataset with a saved shapelet file
    Transform {
        /// Path to the shapelet file written by `fit`
        #[arg(long)]
        shapelets: PathBuf,

        /// Path to the input CSV file
        #[arg(long)]
        data: PathBuf,

        /// Experiment name for output files
        #[arg(long)]
        experiment: String,

        /// Output directory for result files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        distance: DistanceArgs,
    },

    /// Estimate the search cost of a dataset and plan a contract
    Estimate {
        /// Path to the input CSV file
        #[arg(long)]
        data: PathBuf,

        /// Shortest candidate length (defaults to 3)
        #[arg(long)]
        min_length: Option<usize>,

        /// Longest candidate length (defaults to the series length)
        #[arg(long)]
        max_length: Option<usize>,

        /// Wall-clock contract in seconds to plan for
        #[arg(long)]
        contract_secs: Option<f64>,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct FitOutput {
    experiment: String,
    n_series: usize,
    n_shapelets: usize,
    strategy: String,
    best_quality: Option<f64>,
    candidates_evaluated: u64,
    early_abandons: u64,
    passes: usize,
    elapsed_secs: f64,
    contract_exhausted: bool,
}

#[derive(Serialize)]
struct TransformOutput {
    experiment: String,
    n_series: usize,
    n_shapelets: usize,
}

#[derive(Serialize)]
struct EstimateOutput {
    n_series: usize,
    series_length: usize,
    n_channels: usize,
    min_length: usize,
    max_length: usize,
    total_candidates: u64,
    operations: f64,
    plan: Option<PlanOutput>,
}

#[derive(Serialize)]
struct PlanOutput {
    contract_secs: f64,
    k: usize,
    strategy: String,
    target_operations: f64,
}

fn parse_rescaling(s: &str) -> Result<Rescaling> {
    match s {
        "z-normalize" => Ok(Rescaling::ZNormalize),
        "none" => Ok(Rescaling::None),
        other => anyhow::bail!("unknown rescaling: {other} (expected z-normalize or none)"),
    }
}

fn parse_distance_type(s: &str) -> Result<DistanceType> {
    match s {
        "independent" => Ok(DistanceType::Independent),
        "dependent" => Ok(DistanceType::Dependent),
        other => anyhow::bail!("unknown distance: {other} (expected independent or dependent)"),
    }
}

fn parse_quality(s: &str) -> Result<QualityMeasure> {
    match s {
        "information-gain" => Ok(QualityMeasure::InformationGain),
        "f-stat" => Ok(QualityMeasure::FStat),
        "kruskal-wallis" => Ok(QualityMeasure::KruskalWallis),
        other => anyhow::bail!(
            "unknown quality measure: {other} (expected information-gain, f-stat, or kruskal-wallis)"
        ),
    }
}

fn parse_strategy(s: &str, args: &SearchArgs) -> Result<SearchStrategy> {
    let candidates = args.candidates;
    let strategy = match s {
        "full" => SearchStrategy::Full {
            length_step: args.length_step,
            position_step: args.position_step,
        },
        "random" => SearchStrategy::Random {
            candidates_per_series: candidates,
        },
        "improved-random" => SearchStrategy::ImprovedRandom {
            total_candidates: candidates,
        },
        "subsample" => SearchStrategy::SubsampleRandom {
            total_candidates: candidates,
            proportion: args.proportion,
        },
        "refined" => SearchStrategy::RefinedRandom {
            total_candidates: candidates,
            min_ratio: args.min_ratio,
        },
        "skewed" => SearchStrategy::SkewedRandom {
            total_candidates: candidates,
            length_weights: args.length_weights.clone(),
        },
        "tabu" => SearchStrategy::Tabu {
            candidates_per_series: candidates,
            neighbourhood_width: 3,
            tabu_size: 50,
        },
        "local" => SearchStrategy::Local {
            candidates_per_series: candidates,
            max_steps: 20,
        },
        "genetic" => SearchStrategy::Genetic {
            candidates_per_series: candidates,
            population_size: 20,
            tournament_size: 3,
            crossover_rate: 0.8,
            mutation_rate: 0.1,
        },
        "skipping" => SearchStrategy::Skipping {
            position_skip: args.position_step,
            length_skip: args.length_step,
        },
        "timed" => SearchStrategy::TimedRandom {
            time_per_series: None,
            nanos_per_operation: proteus_shapelet::timing::NANOS_PER_OPERATION,
        },
        other => anyhow::bail!(
            "unknown strategy: {other} (expected full, random, improved-random, subsample, refined, skewed, tabu, local, genetic, skipping, or timed)"
        ),
    };
    Ok(strategy)
}

fn parse_contract(secs: Option<f64>) -> Result<Option<Duration>> {
    secs.map(|s| {
        Duration::try_from_secs_f64(s).with_context(|| format!("invalid contract: {s} seconds"))
    })
    .transpose()
}

/// Start from the dataset or contract preset, then apply explicit flags.
fn build_config(
    dataset: &proteus_series::Dataset,
    args: &SearchArgs,
    seed: u64,
) -> Result<ShapeletTransformConfig> {
    let contract = parse_contract(args.contract_secs)?;
    let preset = match contract {
        Some(contract) => ShapeletTransformConfig::for_contract(dataset, contract)?,
        None => ShapeletTransformConfig::for_dataset(dataset)?,
    };

    let mut config = ShapeletTransformConfig::new(
        args.k.unwrap_or(preset.k()),
        args.min_length.unwrap_or(preset.min_length()),
        args.max_length.unwrap_or(preset.max_length()),
    )?
    .with_search(preset.search().clone())
    .with_class_value_mode(preset.class_value_mode())
    .with_balanced_classes(preset.balanced_classes() || args.balanced)
    .with_candidate_pruning(preset.candidate_pruning() || args.pruning)
    .with_contract(contract)
    .with_quality(parse_quality(&args.quality)?)
    .with_round_robin(args.round_robin)
    .with_remove_self_similar(!args.keep_self_similar)
    .with_prune_near_duplicates(args.prune_near_duplicates)
    .with_adaptive_timing(args.adaptive)
    .with_max_passes(args.max_passes)
    .with_rescaling(parse_rescaling(&args.distance.rescaling)?)
    .with_distance_type(parse_distance_type(&args.distance.distance)?)
    .with_seed(seed);

    if let Some(strategy) = &args.strategy {
        config = config.with_search(parse_strategy(strategy, args)?);
    }
    if args.binary {
        config = config.with_class_value_mode(ClassValueMode::Binary);
    }
    if !config.quality().supports_bound() {
        config = config.with_candidate_pruning(false);
    }
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Fit {
            data,
            experiment,
            output_dir,
            checkpoint,
            resume,
            search,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            // 1. Read dataset
            let loaded = DatasetReader::new(&data)
                .read()
                .context("failed to read input CSV")?;
            let dataset = loaded.dataset();

            // 2. Build configuration
            let config = build_config(dataset, &search, cli.seed)?;
            info!(
                k = config.k(),
                min_length = config.min_length(),
                max_length = config.max_length(),
                strategy = ?config.search(),
                "configuration ready"
            );

            // 3. Search, with optional checkpointing and resume
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            let mut sink = checkpoint.then(|| FileCheckpoint::new(writer.checkpoint_path()));
            let fitted = match resume {
                Some(path) => {
                    let state = FileCheckpoint::load(&path)
                        .with_context(|| format!("failed to load checkpoint {}", path.display()))?;
                    info!(cursor = state.cursor, pass = state.pass, "resuming search");
                    config.fit_from_checkpoint(
                        dataset,
                        state,
                        sink.as_mut().map(|s| s as &mut dyn Checkpoint),
                    )
                }
                None => match sink.as_mut() {
                    Some(sink) => config.fit_with_checkpoint(dataset, sink),
                    None => config.fit(dataset),
                },
            }
            .context("shapelet search failed")?;

            // 4. Transform the training set and write artifacts
            let features = fitted
                .transform(dataset)
                .context("transform of the training set failed")?;
            writer.write_shapelets(&fitted)?;
            writer.write_features(loaded.series_ids(), &features, loaded.class_names())?;
            writer.write_fit_summary(loaded.series_ids(), loaded.class_names(), &fitted)?;

            // 5. Print summary
            let stats = fitted.stats();
            let output = FitOutput {
                experiment,
                n_series: dataset.len(),
                n_shapelets: fitted.n_shapelets(),
                strategy: stats.strategy.clone(),
                best_quality: fitted.shapelets().first().map(|s| s.quality()),
                candidates_evaluated: stats.candidates_evaluated,
                early_abandons: stats.early_abandons,
                passes: stats.passes,
                elapsed_secs: stats.elapsed.as_secs_f64(),
                contract_exhausted: stats.contract_exhausted,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Transform {
            shapelets,
            data,
            experiment,
            output_dir,
            distance,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;

            // 1. Load shapelets
            let shapelet_set = read_shapelets(&shapelets).context("failed to read shapelet file")?;
            let distance = ShapeletDistance::new(
                parse_rescaling(&distance.rescaling)?,
                parse_distance_type(&distance.distance)?,
            );
            let transform = FittedShapeletTransform::from_shapelets(shapelet_set, distance);

            // 2. Read dataset (labels optional)
            let loaded = DatasetReader::new(&data)
                .read()
                .context("failed to read input CSV")?;

            // 3. Transform and write features
            let features = transform
                .transform(loaded.dataset())
                .context("transform failed")?;
            let writer = ResultWriter::new(&output_dir, experiment_name)?;
            writer.write_features(loaded.series_ids(), &features, loaded.class_names())?;

            // 4. Print summary
            let output = TransformOutput {
                experiment,
                n_series: features.n_rows(),
                n_shapelets: features.n_shapelets(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Estimate {
            data,
            min_length,
            max_length,
            contract_secs,
        } => {
            let loaded = DatasetReader::new(&data)
                .read()
                .context("failed to read input CSV")?;
            let dataset = loaded.dataset();
            let n = dataset.len();
            let m = dataset.series_length();
            let channels = dataset.n_channels();
            let min_length = min_length.unwrap_or(3.min(m));
            let max_length = max_length.unwrap_or(m);
            if min_length == 0 || min_length > max_length || max_length > m {
                anyhow::bail!("invalid length range {min_length}..={max_length} for series of length {m}");
            }

            let operations =
                estimate_operations(n, m, min_length, max_length, 1, 1) * channels as f64;
            let plan = parse_contract(contract_secs)?.map(|contract| {
                let plan = ContractPlan::for_contract(n, m, channels, contract);
                PlanOutput {
                    contract_secs: contract.as_secs_f64(),
                    k: plan.k,
                    strategy: format!("{:?}", plan.strategy),
                    target_operations: plan.target_operations,
                }
            });
            info!(n_series = n, operations, "estimate complete");

            let output = EstimateOutput {
                n_series: n,
                series_length: m,
                n_channels: channels,
                min_length,
                max_length,
                total_candidates: total_candidates(n, m, min_length, max_length)
                    * channels as u64,
                operations,
                plan,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
