use crate::adapter_api::AdapterSet;
use crate::compare::equivalent;
use crate::errors::{BenchError, ConfigError, Result};
use crate::model::{EngineId, Fidelity, PlanPair, QueryCorpus};
use crate::providers::{PlanProducer, ScriptRunner};
use crate::score::{aggregate, Scoreboard};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSettings {
    pub fidelity: Fidelity,
    /// Skip records marked `Filter: true`.
    pub filter: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            fidelity: Fidelity::Loose,
            filter: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running(EngineId),
}

/// Outcome of benchmarking one engine over the corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineRun {
    pub engine: EngineId,
    pub fidelity: Fidelity,
    pub filter: bool,
    pub passed: usize,
    pub evaluated: usize,
    pub skipped: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

pub struct Benchmark {
    corpus: QueryCorpus,
    settings: RunSettings,
    adapters: AdapterSet,
    state: RunState,
}

impl Benchmark {
    pub fn new(corpus: QueryCorpus, settings: RunSettings, adapters: AdapterSet) -> Self {
        Self {
            corpus,
            settings,
            adapters,
            state: RunState::Idle,
        }
    }

    pub fn from_path(path: &Path, settings: RunSettings, adapters: AdapterSet) -> Result<Self> {
        let corpus = crate::corpus::load_corpus(path)?;
        Ok(Self::new(corpus, settings, adapters))
    }

    pub fn corpus(&self) -> &QueryCorpus {
        &self.corpus
    }

    pub fn into_corpus(self) -> QueryCorpus {
        self.corpus
    }

    pub fn settings(&self) -> RunSettings {
        self.settings
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Clears plans and verdicts of every record so engines can be re-run
    /// (e.g. after creating indexes).
    pub fn reset(&mut self) {
        self.corpus.reset_results();
        tracing::info!(event = "redbench.run.reset", records = self.corpus.len());
    }

    pub fn scoreboard(&self) -> Scoreboard {
        aggregate(&self.corpus, self.settings.filter)
    }

    /// Benchmarks one engine over the whole corpus, writing plans and
    /// verdicts onto the records. A producer failure aborts the run; results
    /// recorded before it stay on the corpus.
    pub async fn run_engine(
        &mut self,
        engine: EngineId,
        producer: &dyn PlanProducer,
    ) -> Result<EngineRun> {
        if self.adapters.get(engine).is_none() {
            return Err(ConfigError(format!("no plan adapter registered for {}", engine)).into());
        }

        self.state = RunState::Running(engine);
        tracing::info!(
            event = "redbench.run.start",
            engine = %engine,
            producer = producer.producer_name(),
            fidelity = %self.settings.fidelity,
            filter = self.settings.filter,
            records = self.corpus.len()
        );

        let result = self.run_records(engine, producer).await;
        self.state = RunState::Idle;

        match &result {
            Ok(run) => tracing::info!(
                event = "redbench.run.finish",
                engine = %engine,
                passed = run.passed,
                evaluated = run.evaluated,
                skipped = run.skipped
            ),
            Err(e) => tracing::error!(
                event = "redbench.run.aborted",
                engine = %engine,
                error = %e
            ),
        }
        result
    }

    async fn run_records(
        &mut self,
        engine: EngineId,
        producer: &dyn PlanProducer,
    ) -> Result<EngineRun> {
        let RunSettings { fidelity, filter } = self.settings;
        let started_at = Utc::now();
        let mut passed = 0;
        let mut evaluated = 0;
        let mut skipped = 0;

        for idx in 0..self.corpus.len() {
            let record = &self.corpus.records()[idx];
            if !record.is_active(filter) {
                skipped += 1;
                tracing::debug!(
                    event = "redbench.run.filtered",
                    engine = %engine,
                    record = idx,
                    description = %record.description
                );
                continue;
            }
            let queries = record.queries_for(engine).clone();

            let producer_failure = |source| BenchError::PlanProducerFailure {
                engine,
                record: idx,
                source,
            };
            let raw_correct = producer
                .fetch_raw_plan(engine, &queries.correct, fidelity)
                .await
                .map_err(producer_failure)?;
            let raw_redundant = producer
                .fetch_raw_plan(engine, &queries.redundant, fidelity)
                .await
                .map_err(producer_failure)?;

            let correct = self.adapters.normalize(engine, &raw_correct, fidelity)?;
            let redundant = self.adapters.normalize(engine, &raw_redundant, fidelity)?;
            let same = equivalent(&correct, &redundant);

            evaluated += 1;
            if same {
                passed += 1;
            }

            tracing::debug!(
                event = "redbench.run.verdict",
                engine = %engine,
                record = idx,
                equivalent = same,
                correct_ops = correct.len(),
                redundant_ops = redundant.len()
            );

            self.corpus.records_mut()[idx].record_result(
                engine,
                PlanPair { correct, redundant },
                same,
            );
        }

        Ok(EngineRun {
            engine,
            fidelity,
            filter,
            passed,
            evaluated,
            skipped,
            started_at,
            finished_at: Utc::now(),
        })
    }

    /// Runs `setup`, benchmarks the engine, then runs `teardown`.
    ///
    /// Teardown is still attempted when the benchmark fails after setup; in
    /// that case the benchmark error is returned and a teardown failure is
    /// only logged.
    pub async fn run_engine_with_scripts(
        &mut self,
        engine: EngineId,
        producer: &dyn PlanProducer,
        scripts: &dyn ScriptRunner,
        setup: Option<&Path>,
        teardown: Option<&Path>,
    ) -> Result<EngineRun> {
        let teardown_text = teardown.map(read_script).transpose()?;

        if let Some(path) = setup {
            let text = read_script(path)?;
            run_script(scripts, engine, path, &text).await?;
        }

        let result = self.run_engine(engine, producer).await;

        if let (Some(path), Some(text)) = (teardown, teardown_text) {
            let td = run_script(scripts, engine, path, &text).await;
            match (&result, td) {
                (Ok(_), Err(e)) => return Err(e),
                (Err(_), Err(e)) => tracing::warn!(
                    event = "redbench.script.teardown_failed",
                    engine = %engine,
                    error = %e
                ),
                _ => {}
            }
        }

        result
    }
}

fn read_script(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(BenchError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    Ok(std::fs::read_to_string(path)?)
}

async fn run_script(
    scripts: &dyn ScriptRunner,
    engine: EngineId,
    path: &Path,
    text: &str,
) -> Result<()> {
    tracing::info!(event = "redbench.script.run", engine = %engine, script = %path.display());
    scripts
        .run_script(engine, text)
        .await
        .map_err(|source| BenchError::ScriptExecutionFailure {
            engine,
            script: path.display().to_string(),
            source,
        })
}
