use crate::model::EngineId;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Failure taxonomy of the benchmark pipeline.
///
/// None of these are retried here; recovery policy belongs to the caller
/// or to the boundary implementation that raised them.
#[derive(Debug, Error)]
pub enum BenchError {
    /// Corpus document or script file is missing.
    #[error("file not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Structurally invalid test definition.
    #[error("malformed corpus at line {line}: {reason}")]
    MalformedCorpus { line: usize, reason: String },

    /// Raw plan output does not have the shape the engine adapter consumes.
    #[error("malformed {engine} plan: {reason}")]
    MalformedPlan { engine: EngineId, reason: String },

    /// The plan producer could not return a plan; aborts the engine's run.
    #[error("plan producer failed for {engine} on record #{record}: {source}")]
    PlanProducerFailure {
        engine: EngineId,
        record: usize,
        #[source]
        source: anyhow::Error,
    },

    /// Setup or teardown script failed (its transaction is rolled back by the runner).
    #[error("script {script} failed on {engine}: {source}")]
    ScriptExecutionFailure {
        engine: EngineId,
        script: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BenchError {
    pub fn malformed_corpus(line: usize, reason: impl Into<String>) -> Self {
        BenchError::MalformedCorpus {
            line,
            reason: reason.into(),
        }
    }

    pub fn malformed_plan(engine: EngineId, reason: impl Into<String>) -> Self {
        BenchError::MalformedPlan {
            engine,
            reason: reason.into(),
        }
    }

    /// Errors caused by the inputs rather than by a database boundary.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            BenchError::FileNotFound { .. }
                | BenchError::MalformedCorpus { .. }
                | BenchError::Config(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for ConfigError {}

pub type Result<T> = std::result::Result<T, BenchError>;
