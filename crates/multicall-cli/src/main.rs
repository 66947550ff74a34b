//! Multicall - spin-reversal multi-call sampling CLI
//!
//! The `multicall` command samples a binary quadratic model several times,
//! each call under its own random spin-reversal transform, and prints the
//! merged result.
//!
//! ## Commands
//!
//! - `run`: sample a model file with a reference sampler
//! - `inspect`: summarise a model file

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, Level};

use multicall_core::{
    CallConfig, ExactSolver, MaskStrategy, MultiCallComposite, MultiCallConfig, RandomSampler,
    Sampler,
};
use qubo_model::{BinaryQuadraticModel, SampleSet};

#[derive(Parser)]
#[command(name = "multicall")]
#[command(author = "Multicall Contributors")]
#[command(version = multicall_core::VERSION)]
#[command(about = "Spin-reversal multi-call sampling for binary quadratic models", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sample a model with repeated, spin-reversed calls
    Run(RunArgs),

    /// Print a summary of a model file
    Inspect {
        /// Path to the model (JSON)
        #[arg(short, long)]
        model: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Path to the model (JSON)
    #[arg(short, long)]
    model: PathBuf,

    /// Number of child sampler calls
    #[arg(short, long, default_value = "1")]
    calls: usize,

    /// Send the original model to every call
    #[arg(long)]
    no_spin_reversals: bool,

    /// Child sampler
    #[arg(long, value_enum, default_value = "exact")]
    sampler: SamplerKind,

    /// Samples per call (random sampler only)
    #[arg(long)]
    num_reads: Option<u64>,

    /// Seed for flip masks; call `i` of the random sampler uses `seed + i`
    #[arg(long)]
    seed: Option<u64>,

    /// Pair every mask with its complement
    #[arg(long)]
    antithetic: bool,

    /// Maximum child calls in flight
    #[arg(long)]
    max_concurrent: Option<usize>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum SamplerKind {
    Exact,
    Random,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    multicall_core::init_tracing(cli.json, level);

    match cli.command {
        Commands::Run(args) => {
            let base = MultiCallConfig::from_env().context("Invalid MULTICALL_* environment")?;
            let result = cmd_run(&args, base).await?;
            println!("{}", serde_json::to_string_pretty(&render_result(&result))?);
            Ok(())
        }
        Commands::Inspect { model } => {
            println!("{}", cmd_inspect(&model)?);
            Ok(())
        }
    }
}

fn load_model(path: &Path) -> Result<BinaryQuadraticModel> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read model file {}", path.display()))?;
    BinaryQuadraticModel::from_json(&text)
        .with_context(|| format!("Invalid model file {}", path.display()))
}

/// Command-line flags applied on top of `config`.
fn build_config(args: &RunArgs, mut config: MultiCallConfig) -> Result<MultiCallConfig> {
    if args.no_spin_reversals {
        config.spin_reversals = false;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if args.antithetic {
        config.mask_strategy = MaskStrategy::Antithetic;
    }
    if let Some(max_concurrent) = args.max_concurrent {
        config.max_concurrent = max_concurrent;
    }
    if let Some(num_reads) = args.num_reads {
        config.shared.insert("num_reads", num_reads);
    }
    config.validate()?;
    Ok(config)
}

fn call_configs(args: &RunArgs) -> Vec<CallConfig> {
    (0..args.calls)
        .map(|i| match (args.sampler, args.seed) {
            (SamplerKind::Random, Some(seed)) => {
                CallConfig::new().with("seed", seed.wrapping_add(i as u64))
            }
            _ => CallConfig::new(),
        })
        .collect()
}

async fn cmd_run(args: &RunArgs, base: MultiCallConfig) -> Result<SampleSet> {
    let bqm = load_model(&args.model)?;
    let config = build_config(args, base)?;
    let child: Arc<dyn Sampler> = match args.sampler {
        SamplerKind::Exact => Arc::new(ExactSolver),
        SamplerKind::Random => Arc::new(RandomSampler),
    };

    info!(
        model = %args.model.display(),
        calls = args.calls,
        sampler = ?args.sampler,
        spin_reversals = config.spin_reversals,
        "sampling model"
    );

    let composite = MultiCallComposite::new(child, config)?;
    let result = composite.sample(&bqm, call_configs(args)).await?;
    Ok(result)
}

fn render_result(result: &SampleSet) -> Value {
    json!({
        "vartype": result.vartype(),
        "variables": result.variables(),
        "num_samples": result.len(),
        "lowest": result.lowest(),
        "records": result.records(),
    })
}

fn cmd_inspect(path: &Path) -> Result<String> {
    let bqm = load_model(path)?;
    let mut lines = vec![
        format!("Vartype:      {}", bqm.vartype()),
        format!("Variables:    {}", bqm.num_variables()),
        format!("Interactions: {}", bqm.num_interactions()),
        format!("Offset:       {}", bqm.offset()),
    ];
    for v in bqm.variables() {
        lines.push(format!("  {:<12} h = {}", v, bqm.linear(v).unwrap_or_default()));
    }
    for (u, v, bias) in bqm.interactions() {
        lines.push(format!("  {u} -- {v}  J = {bias}"));
    }
    Ok(lines.join("\n"))
}
