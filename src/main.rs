use clap::{CommandFactory, Parser, Subcommand};
use fairank::{ConsensusBuilder, FairRankBuilder};
use polars::prelude::*;
use std::error::Error;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Re-rank a single scored item list under fair position bands
    Run(RunArgs),
    /// Fair re-rank many rankings of the same items and pick the consensus
    Consensus(ConsensusArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Path to the input CSV data file (one row per item)
    #[arg(short, long)]
    data: PathBuf,

    /// Column holding the unique item identifier
    #[arg(long, default_value = "id")]
    id: String,

    /// Column holding the ranking score (higher is better)
    #[arg(long, default_value = "score")]
    score: String,

    /// Column holding the protected attribute
    #[arg(long)]
    group: String,

    /// Path to export the re-ranked items as CSV
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to export results as JSON
    #[arg(long)]
    output_json: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct ConsensusArgs {
    /// Path to the wide rankings CSV (columns are item ids, rows are rankings)
    #[arg(short, long)]
    rankings: PathBuf,

    /// Path to the attributes CSV mapping item ids to the protected attribute
    #[arg(short, long)]
    attributes: PathBuf,

    /// Column of the attributes CSV holding the item identifier
    #[arg(long, default_value = "id")]
    id: String,

    /// Column of the attributes CSV holding the protected attribute
    #[arg(long)]
    group: String,

    /// Name of a ranker-id index column to drop from the rankings CSV
    #[arg(long)]
    ranker_col: Option<String>,

    /// Treat cells as rank values (lower is better) instead of scores
    #[arg(long)]
    ascending: bool,

    /// Path to export the consensus fair ranking as CSV
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Path to export results as JSON
    #[arg(long)]
    output_json: Option<PathBuf>,
}

fn read_csv(path: &Path) -> Result<DataFrame, Box<dyn Error>> {
    Ok(LazyCsvReader::new(path.to_path_buf())
        .with_has_header(true)
        .finish()?
        .collect()?)
}

fn write_csv(df: &mut DataFrame, path: &Path) -> Result<(), Box<dyn Error>> {
    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file).finish(df)?;
    Ok(())
}

fn run_single(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let df = read_csv(&args.data)?;
    let results = FairRankBuilder::new(df, &args.id, &args.score, &args.group).run()?;
    results.summary();
    if let Some(path) = &args.output {
        let mut out = results.to_dataframe()?;
        write_csv(&mut out, path)?;
    }
    if let Some(path) = &args.output_json {
        let json = results
            .to_json()
            .map_err(|e| format!("Failed to serialize to JSON: {}", e))?;
        std::fs::write(path, json)?;
    }
    Ok(())
}

fn run_consensus(args: ConsensusArgs) -> Result<(), Box<dyn Error>> {
    let mut rankings = read_csv(&args.rankings)?;
    if let Some(col) = &args.ranker_col {
        rankings = rankings.drop(col)?;
    }
    let attributes = read_csv(&args.attributes)?;
    let results = ConsensusBuilder::new(rankings, attributes, &args.id, &args.group)
        .ascending(args.ascending)
        .run()?;
    results.summary();
    if let Some(path) = &args.output {
        let mut out = results.to_dataframe()?;
        write_csv(&mut out, path)?;
    }
    if let Some(path) = &args.output_json {
        let json = results
            .to_json()
            .map_err(|e| format!("Failed to serialize to JSON: {}", e))?;
        std::fs::write(path, json)?;
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Run(args) => run_single(args),
        Commands::Consensus(args) => run_consensus(args),
    };
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        let mut cmd = Cli::command();
        let _ = cmd.print_help();
        std::process::exit(1);
    }
}
