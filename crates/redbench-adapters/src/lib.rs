use std::sync::Arc;

use redbench_core::adapter_api::{AdapterSet, PlanAdapter};
use redbench_core::errors::{BenchError, Result};
use redbench_core::model::{EngineId, RawPlan};

mod mysql;
mod postgres;
mod sqlserver;

pub mod oracle;

pub use mysql::MySqlAdapter;
pub use oracle::OracleAdapter;
pub use postgres::PostgresAdapter;
pub use sqlserver::SqlServerAdapter;

pub fn adapter_for(engine: EngineId) -> Arc<dyn PlanAdapter> {
    match engine {
        EngineId::SqlServer => Arc::new(SqlServerAdapter),
        EngineId::Oracle => Arc::new(OracleAdapter::default()),
        EngineId::MySql => Arc::new(MySqlAdapter),
        EngineId::PostgreSql => Arc::new(PostgresAdapter),
    }
}

pub fn default_adapters() -> AdapterSet {
    AdapterSet::new(EngineId::ALL.into_iter().map(adapter_for))
}

/// Text lines of a plan delivered either as lines or as a one-column table.
pub(crate) fn plan_lines(engine: EngineId, raw: &RawPlan) -> Result<Vec<String>> {
    match raw {
        RawPlan::Lines(lines) => Ok(lines.clone()),
        RawPlan::Table(rows) => rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                if row.len() != 1 {
                    return Err(BenchError::malformed_plan(
                        engine,
                        format!("row {} has {} columns, expected 1", i, row.len()),
                    ));
                }
                Ok(row.values().next().flatten().unwrap_or_default().to_string())
            })
            .collect(),
        RawPlan::Document(_) => Err(unsupported(engine, raw)),
    }
}

pub(crate) fn unsupported(engine: EngineId, raw: &RawPlan) -> BenchError {
    BenchError::malformed_plan(
        engine,
        format!("cannot normalize a {} plan", raw.shape()),
    )
}
