use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "The qupled developers",
    version,
    about = "qupled CLI - Solve dielectric schemes (STLS, QSTLS and their IET extensions) for quantum plasmas through an external solver and work with the results.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Solve a dielectric scheme and write its result file.
    Solve(SolveArgs),
    /// Plot tables stored in a result file.
    Plot(PlotArgs),
    /// Compute the radial distribution function from a result file.
    Rdf(RdfArgs),
    /// Print the internal energy stored in a result file.
    Energy(EnergyArgs),
}

/// Arguments for the `solve` subcommand.
#[derive(Args, Debug, Default)]
pub struct SolveArgs {
    // --- State Point ---
    /// Theory to solve (STLS, STLS-HNC, STLS-IOI, STLS-LCT, QSTLS, QSTLS-HNC, QSTLS-IOI, QSTLS-LCT).
    #[arg(short, long, required = true, value_name = "NAME")]
    pub theory: String,

    /// Quantum coupling parameter (rs).
    #[arg(short = 'r', long, required = true, value_name = "FLOAT")]
    pub coupling: f64,

    /// Quantum degeneracy parameter (theta).
    #[arg(short = 'd', long, required = true, value_name = "FLOAT")]
    pub degeneracy: f64,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Solver ---
    /// Solver executable, overriding the config file.
    #[arg(long, value_name = "PROGRAM")]
    pub solver: Option<String>,

    /// Directory the solver runs in and the results are written to.
    #[arg(long, value_name = "DIR")]
    pub work_dir: Option<PathBuf>,

    // --- Input Overrides ---
    /// Initial guess for the chemical potential bracket.
    #[arg(long, num_args = 2, value_names = ["LOW", "HIGH"], allow_negative_numbers = true)]
    pub chemical_potential: Option<Vec<f64>>,

    /// Wave-vector grid cutoff.
    #[arg(long, value_name = "FLOAT")]
    pub cutoff: Option<f64>,

    /// Wave-vector grid resolution.
    #[arg(long, value_name = "FLOAT")]
    pub resolution: Option<f64>,

    /// Maximum number of iterations.
    #[arg(long, value_name = "INT")]
    pub iterations: Option<usize>,

    /// Minimum error for convergence.
    #[arg(long, value_name = "FLOAT")]
    pub error: Option<f64>,

    /// Mixing parameter for the iterations, between zero and one.
    #[arg(long, value_name = "FLOAT")]
    pub mixing: Option<f64>,

    /// Number of Matsubara frequencies.
    #[arg(long, value_name = "INT")]
    pub matsubara: Option<usize>,

    /// Number of iterations between recovery checkpoints.
    #[arg(long, value_name = "INT")]
    pub output_frequency: Option<usize>,

    /// Recovery checkpoint to restart from.
    #[arg(long, value_name = "PATH")]
    pub recovery_file: Option<PathBuf>,

    /// Mapping between quantum and classical state points (standard, sqrt, linear).
    #[arg(long, value_name = "NAME")]
    pub iet_mapping: Option<String>,

    /// Scheme for the 2D integrals of the quantum IET schemes (full, segregated).
    #[arg(long = "int-2d-scheme", value_name = "NAME")]
    pub int_2d_scheme: Option<String>,

    /// Accuracy of the integral computations.
    #[arg(long, value_name = "FLOAT")]
    pub int_error: Option<f64>,

    /// Number of threads forwarded to the solver.
    #[arg(short = 'j', long, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Precomputed fixed auxiliary density response (quantum schemes).
    #[arg(long, value_name = "PATH")]
    pub fixed: Option<PathBuf>,

    /// Archive of fixed auxiliary density response files (quantum IET schemes).
    #[arg(long, value_name = "ZIP")]
    pub fixed_iet: Option<PathBuf>,

    /// Result file of a previous run used as initial guess.
    #[arg(long, value_name = "PATH")]
    pub guess: Option<PathBuf>,

    // --- Post-processing ---
    /// Append the radial distribution function to the result file.
    #[arg(long)]
    pub rdf: bool,

    /// Tables to plot after solving, comma separated (e.g. 'ssf,slfc,rdf').
    #[arg(long, value_name = "TABLES", value_delimiter = ',')]
    pub plot: Vec<String>,

    /// Write plots as PNG files to this directory instead of opening a window.
    #[arg(long, value_name = "DIR")]
    pub plot_dir: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S inputs.mixing=0.5
    /// List values are comma-separated: -S inputs.chemical-potential=-10,10
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `plot` subcommand.
#[derive(Args, Debug)]
pub struct PlotArgs {
    /// Result file to read.
    #[arg(required = true, value_name = "FILE")]
    pub file: PathBuf,

    /// Tables to plot, comma separated (adr, bf, idr, rdf, sdr, slfc, ssf, ssfHF).
    #[arg(short, long, required = true, value_name = "TABLES", value_delimiter = ',')]
    pub tables: Vec<String>,

    /// Matsubara indices for the 2D tables, comma separated. Defaults to all.
    #[arg(short, long, value_name = "INDICES", value_delimiter = ',')]
    pub matsubara: Vec<usize>,

    /// Write plots as PNG files to this directory instead of opening a window.
    #[arg(long, value_name = "DIR")]
    pub plot_dir: Option<PathBuf>,
}

/// Arguments for the `rdf` subcommand.
#[derive(Args, Debug)]
pub struct RdfArgs {
    /// Result file to read.
    #[arg(required = true, value_name = "FILE")]
    pub file: PathBuf,

    /// First point of the distance grid.
    #[arg(long, value_name = "FLOAT")]
    pub start: Option<f64>,

    /// End of the distance grid (excluded).
    #[arg(long, value_name = "FLOAT")]
    pub stop: Option<f64>,

    /// Spacing of the distance grid.
    #[arg(long, value_name = "FLOAT")]
    pub step: Option<f64>,

    /// Print the result without appending it to the file.
    #[arg(long)]
    pub no_save: bool,
}

/// Arguments for the `energy` subcommand.
#[derive(Args, Debug)]
pub struct EnergyArgs {
    /// Result file to read.
    #[arg(required = true, value_name = "FILE")]
    pub file: PathBuf,
}
