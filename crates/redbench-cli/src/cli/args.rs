use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "redbench",
    version,
    about = "Checks whether SQL optimizers produce the same plan for a query and its redundant rewrite"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Benchmark engines over a corpus and report equivalence scores
    Run(RunArgs),
    /// Parse a corpus and report what it contains
    Validate(ValidateArgs),
    /// Write a sample config, corpus and recorded plans
    Init(InitArgs),
    Version,
}

#[derive(Parser, Clone)]
pub struct RunArgs {
    #[arg(long, default_value = "redbench.yaml")]
    pub config: PathBuf,

    /// corpus document (overrides `corpus` in the config)
    #[arg(long)]
    pub corpus: Option<PathBuf>,

    /// recorded plan outputs, JSONL (overrides `replay` in the config)
    #[arg(long)]
    pub replay: Option<PathBuf>,

    /// loose|strict
    #[arg(long)]
    pub fidelity: Option<String>,

    /// include records marked `Filter: true`
    #[arg(long)]
    pub no_filter: bool,

    /// engine to run (repeatable): sqlserver|oracle|mysql|postgresql
    #[arg(long = "engine")]
    pub engines: Vec<String>,

    /// free-form run label, e.g. "with indexes"
    #[arg(long)]
    pub label: Option<String>,

    /// write the JSON report here
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// write the plain-text report here
    #[arg(long)]
    pub text_out: Option<PathBuf>,

    /// list every record with its plans
    #[arg(long)]
    pub verbose: bool,

    /// strict mode (controls exit code policy: any different plan -> exit 1)
    #[arg(long)]
    pub strict: bool,
}

#[derive(Parser, Clone)]
pub struct ValidateArgs {
    #[arg(long)]
    pub corpus: PathBuf,

    /// text|json
    #[arg(long, default_value = "text")]
    pub format: String,
}

#[derive(Parser, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
}
