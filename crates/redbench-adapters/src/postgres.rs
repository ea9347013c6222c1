use redbench_core::adapter_api::PlanAdapter;
use redbench_core::errors::Result;
use redbench_core::model::{EngineId, ExecutionPlan, Fidelity, RawPlan};

use crate::plan_lines;

/// `EXPLAIN` text output, one token per line.
pub struct PostgresAdapter;

impl PlanAdapter for PostgresAdapter {
    fn engine(&self) -> EngineId {
        EngineId::PostgreSql
    }

    fn normalize(&self, raw: &RawPlan, fidelity: Fidelity) -> Result<ExecutionPlan> {
        let lines = plan_lines(EngineId::PostgreSql, raw)?;
        Ok(match fidelity {
            Fidelity::Strict => ExecutionPlan::new(lines),
            Fidelity::Loose => lines.iter().map(|l| loose_token(l)).collect(),
        })
    }
}

/// Node text without its cost estimate: `->  Hash Join  (cost=...)` keeps `->  Hash Join`.
fn loose_token(line: &str) -> &str {
    let head = match line.find('(') {
        Some(i) => &line[..i],
        None => line,
    };
    let head = head.trim();
    head.strip_suffix(':').unwrap_or(head).trim()
}
