//! CLI struct definitions for the riskgate command-line interface.
//!
//! All clap-derived types live here. Dispatch logic lives in `lib.rs`.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "riskgate",
    version = env!("CARGO_PKG_VERSION"),
    about = "Normalize infrastructure plan changes and security scanner findings, score the risk, and decide pass/block for CI."
)]
pub(crate) struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Evaluate records against the gate policy (exit 0 pass, 1 block, 2 error)
    Evaluate(EvaluateCli),
    /// Convert a tool's native JSON output into a record envelope
    Ingest(IngestCli),
    /// Inspect or validate gate configuration
    Policy(PolicyCli),
    /// Print the input, report and adapter schemas as JSON
    Schema,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
    Markdown,
}

#[derive(clap::Args, Debug)]
pub(crate) struct EvaluateCli {
    /// Record file (array or envelope). Use '-' for stdin. Repeatable.
    #[clap(long = "input", short = 'i')]
    pub inputs: Vec<String>,
    /// Native tool output as TOOL=FILE (e.g. tfsec=tfsec.json). Repeatable.
    #[clap(long = "source", short = 's')]
    pub sources: Vec<String>,
    /// Configuration file (overrides RISKGATE_CONFIG and ./riskgate.toml).
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// Output format.
    #[clap(long, value_enum, default_value = "text")]
    pub format: OutputFormat,
    /// Number of findings to list in the report.
    #[clap(long)]
    pub top: Option<usize>,
    /// Disable ANSI colors in text output.
    #[clap(long)]
    pub no_color: bool,
    /// Write the report to a file instead of stdout.
    #[clap(long, short = 'o')]
    pub output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub(crate) struct IngestCli {
    /// Adapter name (terraform, tfsec, checkov).
    #[clap(long)]
    pub tool: String,
    /// Tool output file; stdin when omitted or '-'.
    #[clap(long)]
    pub file: Option<String>,
}

#[derive(clap::Args, Debug)]
pub(crate) struct PolicyCli {
    #[clap(subcommand)]
    pub command: PolicyCommand,
}

#[derive(Subcommand, Debug)]
pub(crate) enum PolicyCommand {
    /// Print the effective configuration as JSON
    Show {
        #[clap(long)]
        config: Option<PathBuf>,
        /// Print the built-in defaults file verbatim.
        #[clap(long)]
        defaults: bool,
    },
    /// Validate a configuration file
    Check {
        #[clap(long)]
        config: Option<PathBuf>,
    },
}
