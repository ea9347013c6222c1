pub mod console;
pub mod json;
pub mod text;

use crate::engine::{EngineRun, RunSettings};
use crate::model::{EngineId, Fidelity, PlanPair, QueryCorpus, QueryPair};
use crate::score::{aggregate, Scoreboard};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything a report sink needs; rendering lives in the submodules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchReport {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub redbench_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub fidelity: Fidelity,
    pub filter: bool,
    pub runs: Vec<EngineRun>,
    pub scoreboard: Scoreboard,
    pub records: Vec<RecordReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordReport {
    pub index: usize,
    pub category: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub filtered: bool,
    pub queries: QueryPair,
    pub results: BTreeMap<EngineId, EngineResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineResult {
    pub equivalent: bool,
    pub plans: PlanPair,
}

impl BenchReport {
    pub fn build(
        corpus: &QueryCorpus,
        settings: RunSettings,
        runs: Vec<EngineRun>,
        label: Option<String>,
    ) -> Self {
        let records = corpus
            .iter()
            .enumerate()
            .map(|(index, r)| RecordReport {
                index,
                category: r.category.clone(),
                description: r.description.clone(),
                source: r.source.clone(),
                reference: r.reference.clone(),
                filtered: r.filter_excluded,
                queries: r.default_queries.clone(),
                results: r
                    .verdict
                    .iter()
                    .filter_map(|(engine, &equivalent)| {
                        let plans = r.plans.get(engine)?.clone();
                        Some((*engine, EngineResult { equivalent, plans }))
                    })
                    .collect(),
            })
            .collect();

        Self {
            schema_version: 1,
            generated_at: Utc::now(),
            redbench_version: env!("CARGO_PKG_VERSION").to_string(),
            label,
            fidelity: settings.fidelity,
            filter: settings.filter,
            runs,
            scoreboard: aggregate(corpus, settings.filter),
            records,
        }
    }

    /// Engines with results, in the order they were run.
    pub fn engines(&self) -> Vec<EngineId> {
        let mut out: Vec<EngineId> = self.runs.iter().map(|r| r.engine).collect();
        for e in self.scoreboard.engines.keys() {
            if !out.contains(e) {
                out.push(*e);
            }
        }
        out
    }
}
