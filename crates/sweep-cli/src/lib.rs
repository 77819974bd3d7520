//! CLI argument parsing for sweep.

use camino::Utf8PathBuf;
use clap::{ArgAction, Args as ClapArgs, Parser, Subcommand};
use sweep_matrix::{BinaryMatrix, EnumerationParams, MatrixError};

#[derive(Parser, Debug)]
#[command(name = "sweep")]
#[command(about = "Generate and check SLURM parameter-sweep jobs")]
pub struct Args {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

impl Args {
    /// Log filter used when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Enumerate connectivity matrices into parameter files
    Params(ParamsArgs),
    /// Generate job scripts from parameter files
    Scripts(ScriptsArgs),
    /// Find failed jobs and write a resubmission script
    Check(CheckArgs),
}

#[derive(ClapArgs, Debug)]
pub struct ParamsArgs {
    /// Number of nodes
    #[arg(short, long, required_unless_present = "seed")]
    pub nodes: Option<usize>,

    /// Free cells left at 0 in each matrix
    #[arg(short, long)]
    pub free_connects: usize,

    /// Nodes whose columns are always 1 (1-based, comma separated)
    #[arg(short, long, value_delimiter = ',')]
    pub dominant: Vec<usize>,

    /// Force self-connections on the diagonal
    #[arg(long)]
    pub self_connect: bool,

    /// Seed matrix, `*` marking free cells, e.g. "[* 1; 0 *]"
    #[arg(long)]
    pub seed: Option<String>,

    /// C matrix written with every record [default: drive node 1]
    #[arg(long)]
    pub c_matrix: Option<String>,

    /// Hidden nodes written with every record (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub hidden: Vec<usize>,

    /// Base name of the parameter files
    #[arg(long, default_value = "params")]
    pub name: String,

    /// Directory for the parameter files
    #[arg(short, long, default_value = ".")]
    pub output_dir: Utf8PathBuf,

    /// Keep existing parameter files
    #[arg(long)]
    pub no_overwrite: bool,
}

impl ParamsArgs {
    pub fn enumeration_params(&self) -> Result<EnumerationParams, MatrixError> {
        Ok(EnumerationParams {
            nodes: self.nodes.unwrap_or(0),
            free_connects: self.free_connects,
            dominant_nodes: self.dominant.clone(),
            self_connect: self.self_connect,
            seed: self.seed.as_deref().map(str::parse).transpose()?,
        })
    }

    pub fn c_matrix(&self) -> Result<Option<BinaryMatrix>, MatrixError> {
        self.c_matrix.as_deref().map(str::parse).transpose()
    }
}

#[derive(ClapArgs, Debug)]
pub struct ScriptsArgs {
    /// Sweep configuration (JSON)
    #[arg(short, long)]
    pub config: Utf8PathBuf,

    /// Parameter files; file i uses the prefix `<prefix_output>_<i>`
    #[arg(required = true)]
    pub params: Vec<Utf8PathBuf>,
}

#[derive(ClapArgs, Debug)]
pub struct CheckArgs {
    /// Output tree to scan
    pub dir: Utf8PathBuf,

    /// Where to write the resubmission script
    #[arg(short, long, default_value = "rerun.sh")]
    pub output: Utf8PathBuf,

    /// Print the status of every job found
    #[arg(long)]
    pub report: bool,
}
