mod config;
mod input;
mod output;

use clap::Parser;
use dapmrs_core::{
    CompileOptions, DataTable, MarketConfig, MarketReport, SyntheticOptions, example_table, run_market,
};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::DapmrsConfig;

pub fn bail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(1);
}

#[derive(Parser)]
#[command(name = "dapmrs", version, about = "Deferred acceptance matching with MRS-weighted preferences")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run a matching market and compile payoff columns
    Match(MatchArgs),
    /// Write the seeded example dataset to a CSV file
    Example(ExampleArgs),
    /// Create a default config file at ~/.config/dapmrs/config.toml
    Init,
}

/// Market shape shared by `match` and `example`.
#[derive(clap::Args)]
struct MarketArgs {
    /// Characteristics per applicant (2, 3 or 4)
    #[arg(long)]
    applicant_features: Option<usize>,

    /// Characteristics per reviewer (2, 3 or 4)
    #[arg(long)]
    reviewer_features: Option<usize>,

    /// Reviewers add a bias term on the applicants' binary bias characteristic
    #[arg(long)]
    bias: bool,

    /// Seed for the synthetic market
    #[arg(long)]
    seed: Option<u64>,

    /// Number of pairs in the synthetic market
    #[arg(long)]
    size: Option<usize>,

    /// Path to config file (default: ~/.config/dapmrs/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Debug-level logging for every iteration
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser)]
struct MatchArgs {
    #[command(flatten)]
    market: MarketArgs,

    /// CSV with one row per pair of agents. Without it the synthetic market is used.
    #[arg(long)]
    data: Option<PathBuf>,

    /// Prefix for derived columns. Pass "" for none. Default: "dap"
    #[arg(long)]
    prefix: Option<String>,

    /// Append original index and matched-counterpart columns
    #[arg(long)]
    allocation: bool,

    /// Iteration cap for the proposal loop. Default: 1000
    #[arg(long)]
    max_iterations: Option<usize>,

    /// Directory for the output CSVs. Default: current directory
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// File name stem for the output CSVs. Default: "dap_mrs"
    #[arg(long)]
    files_name: Option<String>,

    /// Skip writing the output CSVs
    #[arg(long)]
    no_save: bool,

    /// Output JSON instead of table
    #[arg(long)]
    json: bool,

    /// Applicant side name in the summary table
    #[arg(long)]
    applicant_label: Option<String>,

    /// Reviewer side name in the summary table
    #[arg(long)]
    reviewer_label: Option<String>,
}

#[derive(Parser)]
struct ExampleArgs {
    #[command(flatten)]
    market: MarketArgs,

    /// Destination CSV
    #[arg(long)]
    out: PathBuf,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "dapmrs=debug,dapmrs_core=debug" } else { "dapmrs=info,dapmrs_core=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Resolve the market shape: CLI flags first, then the config file, then defaults.
fn market_config(args: &MarketArgs, cfg: &DapmrsConfig, max_iterations: Option<usize>) -> MarketConfig {
    let defaults = MarketConfig::default();
    MarketConfig {
        applicant_features: args.applicant_features.or(cfg.applicant_features).unwrap_or(defaults.applicant_features),
        reviewer_features: args.reviewer_features.or(cfg.reviewer_features).unwrap_or(defaults.reviewer_features),
        bias: args.bias || cfg.bias.unwrap_or(false),
        columns: cfg.columns.clone().unwrap_or(defaults.columns),
        max_iterations: max_iterations.or(cfg.max_iterations).unwrap_or(defaults.max_iterations),
    }
}

fn synthetic_options(args: &MarketArgs, cfg: &DapmrsConfig, market: &MarketConfig) -> SyntheticOptions {
    let defaults = SyntheticOptions::default();
    SyntheticOptions {
        size: args.size.or(cfg.size).unwrap_or(defaults.size),
        seed: args.seed.or(cfg.seed).unwrap_or(defaults.seed),
        applicant_features: market.applicant_features,
        reviewer_features: market.reviewer_features,
        bias: market.bias,
    }
}

fn generate(options: &SyntheticOptions) -> DataTable {
    example_table(options).unwrap_or_else(|e| bail(format!("Invalid synthetic market: {e}")))
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Match(args) => run_match(args),
        Commands::Example(args) => run_example(args),
        Commands::Init => {
            let path = config::create_default_config();
            println!("Created config at {}", path.display());
            println!("Edit it to set your default feature counts, column names, etc.");
        }
    }
}

fn run_match(args: MatchArgs) {
    init_tracing(args.market.verbose);

    let config_path = args.market.config.clone().unwrap_or_else(config::config_path);
    let cfg = config::load_config(&config_path);

    let mut market = market_config(&args.market, &cfg, args.max_iterations);
    let options = CompileOptions {
        prefix: args.prefix.clone().or(cfg.prefix.clone()).unwrap_or_else(|| CompileOptions::default().prefix),
        allocation: args.allocation || cfg.allocation.unwrap_or(false),
    };

    let table = match &args.data {
        Some(path) => {
            info!(path = %path.display(), "reading market data");
            input::read_table(path)
        }
        None => {
            if cfg.columns.is_some() {
                warn!("custom column names do not apply to the synthetic market");
            }
            market.columns = Default::default();
            let synthetic = synthetic_options(&args.market, &cfg, &market);
            info!(size = synthetic.size, seed = synthetic.seed, "generating synthetic market");
            generate(&synthetic)
        }
    };

    let report = run_market(&table, &market, &options).unwrap_or_else(|e| bail(e));
    emit_report(&args, &cfg, &report);
}

fn emit_report(args: &MatchArgs, cfg: &DapmrsConfig, report: &MarketReport) {
    if !args.no_save {
        let dir = args.output_dir.clone().or(cfg.output_dir.clone()).unwrap_or_else(|| PathBuf::from("."));
        let files_name = args.files_name.clone().or(cfg.files_name.clone()).unwrap_or_else(|| "dap_mrs".to_string());
        let (data_path, log_path) = output::save_report(&dir, &files_name, report);
        info!(data = %data_path.display(), log = %log_path.display(), "saved results");
    }

    if args.json {
        output::print_json(report);
    } else {
        let applicant_label = args.applicant_label.clone().or(cfg.applicant_label.clone()).unwrap_or_else(|| "Applicants".to_string());
        let reviewer_label = args.reviewer_label.clone().or(cfg.reviewer_label.clone()).unwrap_or_else(|| "Reviewers".to_string());
        output::print_table(report, &applicant_label, &reviewer_label);
    }
}

fn run_example(args: ExampleArgs) {
    init_tracing(args.market.verbose);

    let config_path = args.market.config.clone().unwrap_or_else(config::config_path);
    let cfg = config::load_config(&config_path);

    let market = market_config(&args.market, &cfg, None);
    let synthetic = synthetic_options(&args.market, &cfg, &market);
    let table = generate(&synthetic);

    let file = std::fs::File::create(&args.out)
        .unwrap_or_else(|e| bail(format!("Failed to create {}: {e}", args.out.display())));
    output::write_table(file, &table)
        .unwrap_or_else(|e| bail(format!("Failed to write {}: {e}", args.out.display())));

    info!(rows = table.n_rows(), path = %args.out.display(), "wrote example market");
}
