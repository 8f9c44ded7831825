use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use simval::Flavor;

#[derive(Parser)]
#[command(
    name = "simval",
    about = "Validate detector simulation output against generator truth",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Validate the shards of one category and write a report
    Run(RunArgs),

    /// Sum per-category reports into combined buckets
    Merge(MergeArgs),

    /// Print the counters and buckets of a report
    Inspect(InspectArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Category: 1-4 or nue, numu, anue, anumu
    #[arg(value_name = "CATEGORY")]
    pub category: Flavor,

    /// Process a single shard with per-event diagnostics
    #[arg(short, long)]
    pub debug: bool,

    /// Write an event display per event (debug mode only)
    #[arg(long)]
    pub event_display: bool,

    /// First shard (default: 4 in debug mode, 0 otherwise)
    #[arg(long, value_name = "N")]
    pub start_shard: Option<usize>,

    /// Number of shards (default: 1 in debug mode, 10 otherwise)
    #[arg(short = 'n', long, value_name = "N")]
    pub n_shards: Option<usize>,

    /// Directory for the report
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Directory for event displays
    #[arg(long, value_name = "DIR", default_value = "Plots")]
    pub plot_dir: PathBuf,

    #[command(flatten)]
    pub location: LocationOptions,

    #[command(flatten)]
    pub cuts: CutOptions,
}

/// Where the shard stores live.
#[derive(Args)]
#[command(next_help_heading = "Data Location")]
pub struct LocationOptions {
    /// Data root of the production layout
    #[arg(long, value_name = "DIR", env = "THEIA_DATA_PATH")]
    pub data_path: Option<PathBuf>,

    /// Production tag under the data root
    #[arg(long, value_name = "TAG", env = "THEIA_PRODUCTION_TAG")]
    pub production_tag: Option<String>,

    /// Directory holding genie_<n> truth stores (overrides the production layout)
    #[arg(long, value_name = "DIR", requires = "sim_root")]
    pub truth_root: Option<PathBuf>,

    /// Directory holding theia_* simulation stores (overrides the production layout)
    #[arg(long, value_name = "DIR", requires = "truth_root")]
    pub sim_root: Option<PathBuf>,
}

/// Event selection.
#[derive(Args)]
#[command(next_help_heading = "Cuts")]
pub struct CutOptions {
    /// Keep final-state neutrinos in the truth energy sum
    #[arg(long)]
    pub no_cut_nu_final: bool,

    /// Keep events whose vertex is close to a wall
    #[arg(long)]
    pub no_cut_to_wall: bool,

    /// Keep energy-mismatched events in the resolution distributions
    #[arg(long)]
    pub no_cut_ematch: bool,

    /// Relative energy tolerance
    #[arg(long, value_name = "TOL", default_value = "0.001")]
    pub e_tolerance: f64,

    /// Minimum vertex distance to a wall (mm)
    #[arg(long, value_name = "MM", default_value = "50.0")]
    pub distance_cut: f64,

    /// Truth particles kept per event (0 keeps all)
    #[arg(long, value_name = "N", default_value = "100")]
    pub max_truth_particles: usize,
}

#[derive(Args)]
pub struct MergeArgs {
    /// Category reports to combine
    #[arg(value_name = "REPORT", required = true)]
    pub reports: Vec<PathBuf>,

    /// Output file
    #[arg(short, long, value_name = "FILE")]
    pub output: PathBuf,
}

#[derive(Args)]
pub struct InspectArgs {
    /// Category or merged report
    #[arg(value_name = "REPORT")]
    pub report: PathBuf,

    /// Print the non-empty bins of one bucket
    #[arg(short, long, value_name = "NAME")]
    pub bucket: Option<String>,
}

pub fn parse() -> Cli {
    Cli::parse()
}
