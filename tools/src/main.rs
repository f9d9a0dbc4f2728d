//! dca-runner: headless driver for the case allocation core.
//!
//! Usage:
//!   dca-runner generate --rows 1000 --seed 42 --out training_data.csv
//!   dca-runner train --data training_data.csv --config dca.json
//!   dca-runner process --input cases.csv --out processed_cases.csv
//!   dca-runner status

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use dca_core::{
    case_generator::generate_cases,
    config::DcaConfig,
    engine::{BatchEngine, ProcessedBatch},
    ingest,
    pipeline::ModelStatus,
    rng::{RngBank, RngSlot},
};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dca-runner",
    about = "Train the recovery classifier and allocate debt cases to collection agencies",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a synthetic labelled training file
    Generate(GenerateArgs),
    /// Train the classifier and persist the model bundle
    Train(TrainArgs),
    /// Score, assign and summarize a batch of cases
    Process(ProcessArgs),
    /// Report whether a model bundle is loaded
    Status(ConfigArgs),
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// JSON configuration file (defaults apply when omitted)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Number of cases to generate
    #[arg(long, default_value_t = 1000)]
    rows: usize,
    /// Master seed
    #[arg(long, default_value_t = 42)]
    seed: u64,
    /// Output CSV path
    #[arg(long, default_value = "training_data.csv")]
    out: PathBuf,
}

#[derive(Args, Debug)]
struct TrainArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// Labelled training CSV
    #[arg(long, default_value = "training_data.csv")]
    data: PathBuf,
}

#[derive(Args, Debug)]
struct ProcessArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// Cases CSV to score and assign
    #[arg(long)]
    input: PathBuf,
    /// Output CSV path
    #[arg(long, default_value = "processed_cases.csv")]
    out: PathBuf,
    /// Override the configured seed for agency selection
    #[arg(long)]
    seed: Option<u64>,
    /// Output field delimiter
    #[arg(long, default_value_t = ',')]
    delimiter: char,
    /// Print the full processed batch as JSON instead of a text summary
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Command::Generate(args) => run_generate(args),
        Command::Train(args) => run_train(args),
        Command::Process(args) => run_process(args),
        Command::Status(args) => run_status(args),
    }
}

fn load_config(args: &ConfigArgs) -> Result<DcaConfig> {
    match &args.config {
        Some(path) => DcaConfig::load(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(DcaConfig::default()),
    }
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let mut rng = RngBank::new(args.seed).for_slot(RngSlot::Generator);
    let cases = generate_cases(args.rows, &mut rng)?;

    let file = File::create(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;
    ingest::write_cases(BufWriter::new(file), &cases)?;

    println!("Synthetic data generated: {} ({} records)", args.out.display(), cases.len());
    Ok(())
}

fn run_train(args: TrainArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    config.validate()?;
    let file = File::open(&args.data)
        .with_context(|| format!("opening {}", args.data.display()))?;
    let cases = ingest::read_training_cases(BufReader::new(file))?;

    let mut engine = BatchEngine::new(config, Default::default());
    let report = engine.train(&cases)?;

    println!("=== TRAINING SUMMARY ===");
    println!("  bundle:     {}", report.bundle_id);
    println!("  train rows: {}", report.train_rows);
    println!("  test rows:  {}", report.test_rows);
    println!("  accuracy:   {:.2}", report.accuracy);
    println!();
    println!("{}", report.report);
    Ok(())
}

fn run_process(args: ProcessArgs) -> Result<()> {
    let mut config = load_config(&args.config)?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if !args.delimiter.is_ascii() {
        bail!("delimiter must be a single ASCII character");
    }

    let engine = BatchEngine::build(config)?;
    if !engine.status().is_ready() {
        bail!(
            "model not ready: no usable bundle in {} (run `dca-runner train` first)",
            engine.pipeline().store().dir().display()
        );
    }

    let file = File::open(&args.input)
        .with_context(|| format!("opening {}", args.input.display()))?;
    let table = ingest::read_cases(BufReader::new(file))?;
    let batch = engine.process(table.cases())?;

    let out = File::create(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;
    ingest::write_assigned(BufWriter::new(out), &table, &batch.cases, args.delimiter as u8)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
    } else {
        print_batch(&batch, &args.out);
    }
    Ok(())
}

fn run_status(args: ConfigArgs) -> Result<()> {
    let config = load_config(&args)?;
    let engine = BatchEngine::build(config)?;

    match engine.status() {
        ModelStatus::Ready { bundle_id, trained_at, accuracy } => {
            println!("Model status: loaded");
            println!("  bundle:     {bundle_id}");
            println!("  trained at: {trained_at}");
            println!("  accuracy:   {accuracy:.2}");
        }
        ModelStatus::NotReady => {
            println!(
                "Model status: not found in {}",
                engine.pipeline().store().dir().display()
            );
        }
    }
    println!("  agencies:   {}", engine.roster().len());
    Ok(())
}

fn print_batch(batch: &ProcessedBatch, out: &std::path::Path) {
    let s = &batch.summary;

    println!("=== BATCH SUMMARY ===");
    println!("  output:            {}", out.display());
    println!("  total cases:       {}", s.total_cases);
    println!("  amount at risk:    ${:.2}", s.amount_at_risk);
    match s.avg_confidence {
        Some(c) => println!("  avg recovery prob: {:.1}%", c * 100.0),
        None => println!("  avg recovery prob: n/a"),
    }
    println!("  active agencies:   {}", s.active_agencies);
    println!(
        "  likelihood:        High {} | Medium {} | Low {}",
        s.likelihood_counts.high, s.likelihood_counts.medium, s.likelihood_counts.low
    );
    for r in &s.amount_by_region {
        println!("  region {:<10} ${:.2}", r.region, r.total_amount);
    }

    println!();
    println!("=== INSIGHTS ===");
    println!(
        "  focus on {} high-priority cases, potential recovery ${:.2}",
        s.high_priority_cases, s.potential_recovery
    );
    println!("  {} cases overdue by more than 120 days", s.critical_overdue_cases);
    if let Some(d) = s.avg_days_overdue {
        println!("  average days overdue: {d:.0}");
    }

    println!();
    println!("=== AGENCY LOAD ===");
    for a in &batch.agency_stats {
        println!(
            "  {:<20} | cases: {:>5} | amount: ${:>12.2} | avg score: {:.2}",
            a.dca_assigned, a.cases_assigned, a.total_amount, a.avg_likelihood_score
        );
    }
}
