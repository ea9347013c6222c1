use super::exit_codes;
use crate::cli::args::RunArgs;
use redbench_adapters::default_adapters;
use redbench_core::config::{load_config, BenchConfig, SUPPORTED_CONFIG_VERSION};
use redbench_core::engine::Benchmark;
use redbench_core::errors::ConfigError;
use redbench_core::model::{EngineId, Fidelity};
use redbench_core::providers::replay::ReplayProducer;
use redbench_core::providers::PlanProducer;
use redbench_core::report::{console, json, text, BenchReport};
use redbench_core::score::Scoreboard;
use std::collections::BTreeMap;
use std::path::Path;

pub async fn run(args: RunArgs) -> anyhow::Result<i32> {
    let cfg = match effective_config(&args) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("config error: {}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let Some(replay_path) = cfg.replay.as_deref() else {
        eprintln!("config error: no recorded plans; pass --replay or set `replay` in the config");
        return Ok(exit_codes::CONFIG_ERROR);
    };

    let mut bench = match Benchmark::from_path(
        Path::new(&cfg.corpus),
        cfg.run_settings(),
        default_adapters(),
    ) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("error: {}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let producer = match ReplayProducer::from_path(replay_path) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {:#}", e);
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };
    tracing::info!(
        event = "redbench.cli.producer",
        producer = producer.producer_name(),
        recordings = producer.len(),
        fingerprint = producer.fingerprint().as_deref().unwrap_or("-")
    );

    let mut runs = Vec::new();
    let mut aborted = false;
    for &engine in &cfg.engines {
        let scripts = cfg.scripts_for(engine);
        let setup = scripts.and_then(|s| s.setup.as_deref()).map(Path::new);
        let teardown = scripts.and_then(|s| s.teardown.as_deref()).map(Path::new);

        match bench
            .run_engine_with_scripts(engine, &producer, &producer, setup, teardown)
            .await
        {
            Ok(run) => runs.push(run),
            Err(e) => {
                eprintln!("error: {} run aborted: {}", engine.display_name(), e);
                aborted = true;
            }
        }
    }

    let report = BenchReport::build(bench.corpus(), bench.settings(), runs, cfg.label.clone());
    console::print_summary(&report, args.verbose);

    if let Some(out) = &args.out {
        json::write_json(&report, out)?;
        eprintln!("wrote {}", out.display());
    }
    if let Some(out) = &args.text_out {
        text::write_text(&report, out)?;
        eprintln!("wrote {}", out.display());
    }

    Ok(decide_exit_code(&report.scoreboard, aborted, args.strict))
}

/// Config file values with command-line flags applied on top.
fn effective_config(args: &RunArgs) -> Result<BenchConfig, ConfigError> {
    let mut cfg = if args.config.exists() {
        load_config(&args.config, false)?
    } else if let Some(corpus) = &args.corpus {
        tracing::debug!(
            event = "redbench.cli.no_config",
            config = %args.config.display()
        );
        BenchConfig {
            version: SUPPORTED_CONFIG_VERSION,
            corpus: path_string(corpus),
            fidelity: Fidelity::default(),
            filter: true,
            engines: EngineId::RUN_ORDER.to_vec(),
            replay: None,
            label: None,
            scripts: BTreeMap::new(),
        }
    } else {
        return Err(ConfigError(format!(
            "{} not found (run `redbench init` or pass --corpus)",
            args.config.display()
        )));
    };

    if let Some(corpus) = &args.corpus {
        cfg.corpus = path_string(corpus);
    }
    if let Some(replay) = &args.replay {
        cfg.replay = Some(path_string(replay));
    }
    if let Some(f) = &args.fidelity {
        cfg.fidelity = Fidelity::parse(f)
            .ok_or_else(|| ConfigError(format!("unknown fidelity '{}' (loose|strict)", f)))?;
    }
    if args.no_filter {
        cfg.filter = false;
    }
    if !args.engines.is_empty() {
        cfg.engines = parse_engines(&args.engines)?;
    }
    if args.label.is_some() {
        cfg.label = args.label.clone();
    }
    Ok(cfg)
}

fn parse_engines(names: &[String]) -> Result<Vec<EngineId>, ConfigError> {
    let mut out = Vec::new();
    for name in names {
        let e = EngineId::parse(name).ok_or_else(|| {
            ConfigError(format!(
                "unknown engine '{}' (sqlserver|oracle|mysql|postgresql)",
                name
            ))
        })?;
        if !out.contains(&e) {
            out.push(e);
        }
    }
    Ok(out)
}

fn path_string(p: &Path) -> String {
    p.to_string_lossy().into_owned()
}

fn decide_exit_code(board: &Scoreboard, aborted: bool, strict: bool) -> i32 {
    if aborted {
        return exit_codes::CONFIG_ERROR;
    }
    if strict && !board.all_equivalent() {
        return exit_codes::NOT_EQUIVALENT;
    }
    exit_codes::OK
}
