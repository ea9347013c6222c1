use super::args::*;
use std::path::Path;

pub mod run;
pub mod validate;

pub mod exit_codes {
    pub const OK: i32 = 0;
    pub const NOT_EQUIVALENT: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Run(args) => run::run(args).await,
        Command::Validate(args) => validate::run(args).await,
        Command::Init(args) => cmd_init(args).await,
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(exit_codes::OK)
        }
    }
}

async fn cmd_init(args: InitArgs) -> anyhow::Result<i32> {
    write_sample_config_if_missing(&args.dir.join("redbench.yaml"))?;
    write_file_if_missing(
        &args.dir.join("queries.sql"),
        redbench_core::config::SAMPLE_CORPUS,
    )?;
    write_file_if_missing(
        &args.dir.join("plans.jsonl"),
        redbench_core::config::SAMPLE_PLANS,
    )?;
    Ok(exit_codes::OK)
}

fn write_file_if_missing(path: &Path, content: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::write(path, content)?;
        eprintln!("created {}", path.display());
    } else {
        eprintln!("note: {} already exists (skipped)", path.display());
    }
    Ok(())
}

fn write_sample_config_if_missing(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        redbench_core::config::write_sample_config(path)?;
        eprintln!("created {}", path.display());
    } else {
        eprintln!("note: {} already exists", path.display());
    }
    Ok(())
}
