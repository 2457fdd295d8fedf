use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about = "Leader/follower facility pricing", long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, default_value = "info", global = true)]
    pub log_level: tracing::Level,

    /// TOML file with solver, search and input settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// MIP backend for exact follower work (microlp)
    #[arg(long, global = true)]
    pub solver: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search leader prices for one instance
    Solve(SolveArgs),
    /// Compute the follower's response to fixed leader prices
    Follower(FollowerArgs),
    /// Solve every instance file in a directory
    Batch(BatchArgs),
}

/// Instance clipping; unset flags keep the config file values.
#[derive(Args, Debug, Clone, Default)]
pub struct InputArgs {
    /// Fraction of the kept facilities given to the leader
    #[arg(long)]
    pub leader_share: Option<f64>,

    /// Read at most this many facilities
    #[arg(long)]
    pub facility_limit: Option<usize>,

    /// Read at most this many clients
    #[arg(long)]
    pub client_limit: Option<usize>,

    /// Take the leader facility count from the file header
    #[arg(long)]
    pub leaders_from_header: bool,
}

/// Leader search settings shared by `solve` and `batch`.
#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Follower response (vnd, exact, cooperative, bnb)
    #[arg(long)]
    pub strategy: Option<String>,

    /// Seed for the leader search
    #[arg(long)]
    pub seed: Option<u64>,

    /// Re-solve the follower exactly at the final leader prices
    #[arg(long)]
    pub verify_exact: bool,

    /// Score leader candidates on this many threads ("auto" for all cores)
    #[arg(long)]
    pub threads: Option<String>,
}

#[derive(Args, Debug)]
pub struct SolveArgs {
    /// Instance file
    pub instance: PathBuf,

    #[command(flatten)]
    pub search: SearchArgs,

    #[command(flatten)]
    pub input: InputArgs,

    /// Write the solution as JSON
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct FollowerArgs {
    /// Instance file
    pub instance: PathBuf,

    /// Comma-separated leader prices, one per leader facility
    #[arg(long, value_delimiter = ',', required = true)]
    pub leader_prices: Vec<i64>,

    /// Response method (exact, cooperative, bnb, vnd)
    #[arg(long, default_value = "exact")]
    pub method: String,

    /// Seed for randomised methods
    #[arg(long)]
    pub seed: Option<u64>,

    #[command(flatten)]
    pub input: InputArgs,

    /// Write the response as JSON
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Directory of instance files
    pub dir: PathBuf,

    #[command(flatten)]
    pub search: SearchArgs,

    #[command(flatten)]
    pub input: InputArgs,

    /// Text report, rewritten after every instance
    #[arg(long, default_value = "result.txt")]
    pub out: PathBuf,

    /// Also write the run records as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,
}
