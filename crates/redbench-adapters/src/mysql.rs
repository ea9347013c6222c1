use redbench_core::adapter_api::PlanAdapter;
use redbench_core::errors::Result;
use redbench_core::model::{EngineId, ExecutionPlan, Fidelity, PlanRow, RawPlan};

use crate::unsupported;

const UNKNOWN: &str = "Unknown";
const NONE: &str = "None";

/// Tabular `EXPLAIN` rows, one per access path.
pub struct MySqlAdapter;

impl PlanAdapter for MySqlAdapter {
    fn engine(&self) -> EngineId {
        EngineId::MySql
    }

    fn normalize(&self, raw: &RawPlan, fidelity: Fidelity) -> Result<ExecutionPlan> {
        let RawPlan::Table(rows) = raw else {
            return Err(unsupported(EngineId::MySql, raw));
        };
        Ok(rows.iter().map(|row| token(row, fidelity)).collect())
    }
}

fn token(row: &PlanRow, fidelity: Fidelity) -> String {
    let col = |name: &str, missing: &'static str| row.get(name).unwrap_or(missing).to_string();

    let prefix = format!(
        "{} on {} ({})",
        col("select_type", UNKNOWN),
        col("table", UNKNOWN),
        col("type", UNKNOWN)
    );
    let extra = col("Extra", NONE);

    match fidelity {
        Fidelity::Loose => format!("{}, {}", prefix, extra),
        Fidelity::Strict => format!(
            "{}, key: {} comparing to {}, rows: {} (filtered {}%), {}",
            prefix,
            col("key", NONE),
            col("ref", NONE),
            col("rows", UNKNOWN),
            col("filtered", UNKNOWN),
            extra
        ),
    }
}
