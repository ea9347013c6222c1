use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;

use cli::args::Cli;
use cli::commands::{dispatch, exit_codes};

fn init_logging() {
    let filter = EnvFilter::try_from_env("REDBENCH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let json = std::env::var("REDBENCH_LOG_FORMAT").ok().as_deref() == Some("json");

    if json {
        fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_target(true)
            .with_current_span(false)
            .with_span_list(false)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_timer(fmt::time::UtcTime::rfc_3339())
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main(flavor = "multi_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging();
    let code = match dispatch(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("fatal: {e:?}");
            exit_codes::CONFIG_ERROR
        }
    };
    std::process::exit(code);
}
