//! CLI type definitions.
//!
//! Clap command structures that define the CLI interface.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "foreman")]
#[command(about = "Foreman - process orchestration for agent-delegated workflows", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Path to a configuration file (defaults to .foreman/config.yaml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a declarative process spec
    Run(RunArgs),

    /// List recorded runs
    Runs(RunsArgs),

    /// Show one run's state and journal
    Show(ShowArgs),

    /// Record a decision for a suspended breakpoint
    Decide(DecideArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Path to the process spec (YAML)
    pub spec: PathBuf,

    /// Path to a JSON file with the process inputs
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Override the default agent backend for this run
    #[arg(short, long)]
    pub backend: Option<String>,
}

#[derive(Args)]
pub struct RunsArgs {
    /// Maximum number of runs to display
    #[arg(short, long, default_value = "50")]
    pub limit: usize,

    /// Filter by status
    #[arg(short, long)]
    pub status: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Run ID
    pub run_id: Uuid,

    /// Number of trailing journal entries to display
    #[arg(short, long, default_value = "20")]
    pub tail: usize,
}

#[derive(Args)]
#[command(group = clap::ArgGroup::new("verdict").required(true).args(["approve", "reject", "amend"]))]
pub struct DecideArgs {
    /// Run ID
    pub run_id: Uuid,

    /// Breakpoint ID (may be omitted when exactly one is pending)
    pub breakpoint: Option<Uuid>,

    /// Approve: let the run proceed
    #[arg(long)]
    pub approve: bool,

    /// Reject: abort the run at this gate
    #[arg(long)]
    pub reject: bool,

    /// Amend: proceed with this JSON payload attached
    #[arg(long, value_name = "JSON")]
    pub amend: Option<String>,

    /// Note for the run journal and subsequent phases
    #[arg(short, long)]
    pub note: Option<String>,
}
