//! `DBMS_XPLAN.DISPLAY(..., 'BASIC')` output:
//!
//! ```text
//! Plan hash value: 1601196873
//!
//! ----------------------------------
//! | Id  | Operation         | Name |
//! ----------------------------------
//! |   0 | SELECT STATEMENT  |      |
//! |   1 |  TABLE ACCESS FULL| T    |
//! ----------------------------------
//! ```

use redbench_core::adapter_api::PlanAdapter;
use redbench_core::errors::Result;
use redbench_core::model::{EngineId, ExecutionPlan, Fidelity, RawPlan};

use crate::plan_lines;

/// Leading rows to skip before the plan body, per fidelity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanTableLayout {
    pub name: &'static str,
    pub loose_skip: usize,
    pub strict_skip: usize,
}

pub const DBMS_XPLAN_BASIC_V1: PlanTableLayout = PlanTableLayout {
    name: "dbms_xplan_basic_v1",
    loose_skip: 4,
    strict_skip: 2,
};

#[derive(Debug, Clone, Copy)]
pub struct OracleAdapter {
    layout: PlanTableLayout,
}

impl Default for OracleAdapter {
    fn default() -> Self {
        Self::with_layout(DBMS_XPLAN_BASIC_V1)
    }
}

impl OracleAdapter {
    pub fn with_layout(layout: PlanTableLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> PlanTableLayout {
        self.layout
    }
}

impl PlanAdapter for OracleAdapter {
    fn engine(&self) -> EngineId {
        EngineId::Oracle
    }

    fn normalize(&self, raw: &RawPlan, fidelity: Fidelity) -> Result<ExecutionPlan> {
        let lines = plan_lines(EngineId::Oracle, raw)?;
        let skip = match fidelity {
            Fidelity::Loose => self.layout.loose_skip,
            Fidelity::Strict => self.layout.strict_skip,
        };
        let body = lines
            .iter()
            .skip(skip)
            .map(|l| l.trim())
            .take_while(|l| !l.is_empty());

        Ok(match fidelity {
            Fidelity::Strict => body.collect(),
            Fidelity::Loose => body.filter_map(operation_on_object).collect(),
        })
    }
}

/// `|   1 |  TABLE ACCESS FULL| T    |` becomes `TABLE ACCESS FULL on T`.
/// Separator rows have too few fields and yield nothing.
fn operation_on_object(row: &str) -> Option<String> {
    let fields: Vec<&str> = row.split('|').collect();
    if fields.len() < 5 {
        return None;
    }
    let token = format!("{} on {}", fields[2].trim(), fields[3].trim());
    Some(token.trim().to_string())
}
