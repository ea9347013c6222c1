use async_trait::async_trait;
use redbench_core::adapter_api::{AdapterSet, PlanAdapter};
use redbench_core::corpus::parse_corpus;
use redbench_core::engine::{Benchmark, RunSettings, RunState};
use redbench_core::errors::BenchError;
use redbench_core::model::{EngineId, ExecutionPlan, Fidelity, RawPlan};
use redbench_core::providers::{PlanProducer, ScriptRunner};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Takes plan lines as they are; enough to exercise the runner.
struct VerbatimAdapter(EngineId);

impl PlanAdapter for VerbatimAdapter {
    fn engine(&self) -> EngineId {
        self.0
    }

    fn normalize(&self, raw: &RawPlan, _fidelity: Fidelity) -> redbench_core::errors::Result<ExecutionPlan> {
        match raw {
            RawPlan::Lines(lines) => Ok(ExecutionPlan::new(lines.iter().map(String::as_str))),
            other => Err(BenchError::malformed_plan(self.0, format!("unexpected {}", other.shape()))),
        }
    }
}

#[derive(Default)]
struct MapProducer {
    plans: HashMap<String, Vec<&'static str>>,
    calls: Mutex<Vec<String>>,
}

impl MapProducer {
    fn with(mut self, query: &str, ops: &[&'static str]) -> Self {
        self.plans.insert(query.to_string(), ops.to_vec());
        self
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlanProducer for MapProducer {
    async fn fetch_raw_plan(
        &self,
        _engine: EngineId,
        query: &str,
        _fidelity: Fidelity,
    ) -> anyhow::Result<RawPlan> {
        let query = query.trim().to_string();
        self.calls.lock().unwrap().push(query.clone());
        match self.plans.get(&query) {
            Some(ops) => Ok(RawPlan::Lines(ops.iter().map(|s| s.to_string()).collect())),
            None => Err(anyhow::anyhow!("connection reset")),
        }
    }

    fn producer_name(&self) -> &'static str {
        "map"
    }
}

#[derive(Default)]
struct RecordingScripts {
    ran: Mutex<Vec<String>>,
}

#[async_trait]
impl ScriptRunner for RecordingScripts {
    async fn run_script(&self, _engine: EngineId, script: &str) -> anyhow::Result<()> {
        self.ran.lock().unwrap().push(script.trim().to_string());
        if script.contains("FAIL") {
            anyhow::bail!("syntax error near FAIL");
        }
        Ok(())
    }
}

const CORPUS: &str = "\
-- Category: Where
-- Description: same plan
-- Version: correct
SELECT 1
-- Version: redundancy
SELECT 1 WHERE 1=1
-- end
-- Category: Where
-- Description: extra sort
-- Version: correct
SELECT 2
-- Version: redundancy
SELECT 2 ORDER BY 1
-- end
-- Category: Joins
-- Description: skipped by default
-- Filter: true
-- Version: correct
SELECT 3
-- Version: redundancy
SELECT 3 JOIN
-- end
";

fn adapters() -> AdapterSet {
    AdapterSet::new([Arc::new(VerbatimAdapter(EngineId::PostgreSql)) as Arc<dyn PlanAdapter>])
}

fn producer() -> MapProducer {
    MapProducer::default()
        .with("SELECT 1", &["Seq Scan on t", "Sort"])
        .with("SELECT 1 WHERE 1=1", &["Sort", "Seq Scan on t"])
        .with("SELECT 2", &["Index Scan on t"])
        .with("SELECT 2 ORDER BY 1", &["Index Scan on t", "Sort"])
        .with("SELECT 3", &["Hash Join"])
        .with("SELECT 3 JOIN", &["Hash Join"])
}

fn bench(settings: RunSettings) -> Benchmark {
    Benchmark::new(parse_corpus(CORPUS).unwrap(), settings, adapters())
}

#[tokio::test]
async fn test_run_records_verdicts_and_counts() -> anyhow::Result<()> {
    let mut b = bench(RunSettings::default());
    let run = b.run_engine(EngineId::PostgreSql, &producer()).await?;

    assert_eq!(run.evaluated, 2);
    assert_eq!(run.passed, 1);
    assert_eq!(run.skipped, 1);
    assert_eq!(b.state(), RunState::Idle);

    let records = b.corpus().records();
    assert_eq!(records[0].verdict[&EngineId::PostgreSql], true);
    assert_eq!(records[1].verdict[&EngineId::PostgreSql], false);
    assert!(!records[2].is_evaluated(EngineId::PostgreSql));
    assert_eq!(
        records[1].plans[&EngineId::PostgreSql].redundant.operations(),
        ["Index Scan on t", "Sort"]
    );

    let board = b.scoreboard();
    assert_eq!(board.engine(EngineId::PostgreSql).unwrap().evaluated, 2);
    assert_eq!(board.category("Where").unwrap().passed_for(EngineId::PostgreSql), 1);
    assert_eq!(board.category("Joins").unwrap().total, 0);
    Ok(())
}

#[tokio::test]
async fn test_filter_off_evaluates_every_record() -> anyhow::Result<()> {
    let mut b = bench(RunSettings {
        fidelity: Fidelity::Strict,
        filter: false,
    });
    let run = b.run_engine(EngineId::PostgreSql, &producer()).await?;
    assert_eq!(run.evaluated, b.corpus().len());
    assert_eq!(run.skipped, 0);
    assert_eq!(run.fidelity, Fidelity::Strict);
    Ok(())
}

#[tokio::test]
async fn test_filtered_records_never_reach_producer() -> anyhow::Result<()> {
    let p = producer();
    let mut b = bench(RunSettings::default());
    b.run_engine(EngineId::PostgreSql, &p).await?;
    let calls = p.calls();
    assert_eq!(calls.len(), 4);
    assert!(!calls.iter().any(|q| q.starts_with("SELECT 3")));
    Ok(())
}

#[tokio::test]
async fn test_producer_failure_aborts_and_keeps_earlier_results() {
    let p = MapProducer::default()
        .with("SELECT 1", &["Seq Scan on t"])
        .with("SELECT 1 WHERE 1=1", &["Seq Scan on t"]);
    let mut b = bench(RunSettings::default());

    let err = b.run_engine(EngineId::PostgreSql, &p).await.unwrap_err();
    match err {
        BenchError::PlanProducerFailure { engine, record, .. } => {
            assert_eq!(engine, EngineId::PostgreSql);
            assert_eq!(record, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(b.state(), RunState::Idle);
    assert!(b.corpus().records()[0].is_evaluated(EngineId::PostgreSql));
    assert!(!b.corpus().records()[1].is_evaluated(EngineId::PostgreSql));
}

#[tokio::test]
async fn test_engine_without_adapter_is_config_error() {
    let mut b = bench(RunSettings::default());
    let err = b.run_engine(EngineId::Oracle, &producer()).await.unwrap_err();
    assert!(matches!(err, BenchError::Config(_)));
    assert!(p_untouched(&b));
}

fn p_untouched(b: &Benchmark) -> bool {
    b.corpus().iter().all(|r| r.verdict.is_empty())
}

#[tokio::test]
async fn test_reset_clears_results_only() -> anyhow::Result<()> {
    let mut b = bench(RunSettings::default());
    b.run_engine(EngineId::PostgreSql, &producer()).await?;
    b.reset();

    assert!(p_untouched(&b));
    assert_eq!(b.corpus().len(), 3);
    assert!(b.corpus().records()[2].filter_excluded);
    assert!(b.scoreboard().engines.is_empty());

    let run = b.run_engine(EngineId::PostgreSql, &producer()).await?;
    assert_eq!(run.passed, 1);
    Ok(())
}

#[tokio::test]
async fn test_scripts_wrap_the_run() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let setup = dir.path().join("setup.sql");
    let teardown = dir.path().join("teardown.sql");
    std::fs::write(&setup, "CREATE INDEX i ON t(a);")?;
    std::fs::write(&teardown, "DROP INDEX i;")?;

    let scripts = RecordingScripts::default();
    let mut b = bench(RunSettings::default());
    let run = b
        .run_engine_with_scripts(
            EngineId::PostgreSql,
            &producer(),
            &scripts,
            Some(&setup),
            Some(&teardown),
        )
        .await?;

    assert_eq!(run.evaluated, 2);
    assert_eq!(
        *scripts.ran.lock().unwrap(),
        ["CREATE INDEX i ON t(a);", "DROP INDEX i;"]
    );
    Ok(())
}

#[tokio::test]
async fn test_failing_setup_skips_the_run() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let setup = dir.path().join("setup.sql");
    std::fs::write(&setup, "FAIL")?;

    let scripts = RecordingScripts::default();
    let p = producer();
    let mut b = bench(RunSettings::default());
    let err = b
        .run_engine_with_scripts(EngineId::PostgreSql, &p, &scripts, Some(&setup), None)
        .await
        .unwrap_err();

    assert!(matches!(err, BenchError::ScriptExecutionFailure { .. }));
    assert!(p.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn test_missing_script_file() {
    let scripts = RecordingScripts::default();
    let mut b = bench(RunSettings::default());
    let err = b
        .run_engine_with_scripts(
            EngineId::PostgreSql,
            &producer(),
            &scripts,
            Some(std::path::Path::new("/nonexistent/setup.sql")),
            None,
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BenchError::FileNotFound { .. }));
    assert!(scripts.ran.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_teardown_runs_after_failed_benchmark() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let teardown = dir.path().join("teardown.sql");
    std::fs::write(&teardown, "DROP INDEX i;")?;

    let scripts = RecordingScripts::default();
    let mut b = bench(RunSettings::default());
    let err = b
        .run_engine_with_scripts(
            EngineId::PostgreSql,
            &MapProducer::default(),
            &scripts,
            None,
            Some(&teardown),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, BenchError::PlanProducerFailure { record: 0, .. }));
    assert_eq!(*scripts.ran.lock().unwrap(), ["DROP INDEX i;"]);
    Ok(())
}
