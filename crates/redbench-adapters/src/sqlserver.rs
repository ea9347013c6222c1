use redbench_core::adapter_api::PlanAdapter;
use redbench_core::errors::{BenchError, Result};
use redbench_core::model::{EngineId, ExecutionPlan, Fidelity, PlanRow, RawPlan};

const UNKNOWN: &str = "Unknown";

/// Showplan XML for `loose`, `SHOWPLAN_ALL` rows for `strict`.
pub struct SqlServerAdapter;

impl PlanAdapter for SqlServerAdapter {
    fn engine(&self) -> EngineId {
        EngineId::SqlServer
    }

    fn normalize(&self, raw: &RawPlan, fidelity: Fidelity) -> Result<ExecutionPlan> {
        match (fidelity, raw) {
            (Fidelity::Loose, RawPlan::Document(xml)) => showplan_operations(xml),
            (Fidelity::Strict, RawPlan::Table(rows)) => {
                Ok(rows.iter().skip(1).map(estimate_token).collect())
            }
            _ => {
                let wanted = match fidelity {
                    Fidelity::Loose => "document",
                    Fidelity::Strict => "table",
                };
                tracing::debug!(
                    event = "redbench.adapter.shape_mismatch",
                    engine = "sqlserver",
                    fidelity = %fidelity,
                    shape = raw.shape()
                );
                Err(BenchError::malformed_plan(
                    EngineId::SqlServer,
                    format!(
                        "{} fidelity needs a {} plan, got {}",
                        fidelity,
                        wanted,
                        raw.shape()
                    ),
                ))
            }
        }
    }
}

fn showplan_operations(xml: &str) -> Result<ExecutionPlan> {
    if xml.trim().is_empty() {
        return Ok(ExecutionPlan::empty());
    }
    let doc = roxmltree::Document::parse(xml).map_err(|e| {
        BenchError::malformed_plan(EngineId::SqlServer, format!("invalid showplan XML: {}", e))
    })?;

    let ops = doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "RelOp")
        .filter_map(|rel_op| {
            let op = rel_op.attribute("PhysicalOp")?;
            Some(match storage_object(rel_op) {
                Some(object) => format!("{} on {}", op, object),
                None => op.to_string(),
            })
        });
    Ok(ops.collect())
}

/// First `Object` owned by this `RelOp` (not by a nested one), as `schema.table` or `table`.
fn storage_object(rel_op: roxmltree::Node<'_, '_>) -> Option<String> {
    let object = rel_op
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == "Object")
        .find(|n| {
            n.ancestors()
                .skip(1)
                .find(|a| a.is_element() && a.tag_name().name() == "RelOp")
                == Some(rel_op)
        })?;

    let table = unbracket(object.attribute("Table")?);
    match object.attribute("Schema").map(unbracket) {
        Some(schema) if !schema.is_empty() => Some(format!("{}.{}", schema, table)),
        _ => Some(table.to_string()),
    }
}

fn unbracket(name: &str) -> &str {
    name.trim_start_matches('[').trim_end_matches(']')
}

fn estimate_token(row: &PlanRow) -> String {
    let op = row
        .get("StmtText")
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .or_else(|| row.get("PhysicalOp"))
        .unwrap_or(UNKNOWN);
    let field = |name: &str| row.get(name).unwrap_or(UNKNOWN);

    format!(
        "{} (Est Rows: {}, Est IO Cost: {}, Est CPU Time: {}, Avg Row Size: {})",
        op,
        field("EstimateRows"),
        field("EstimateIO"),
        field("EstimateCPU"),
        field("AvgRowSize")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHOWPLAN: &str = r#"<?xml version="1.0" encoding="utf-16"?>
<ShowPlanXML xmlns="http://schemas.microsoft.com/sqlserver/2004/07/showplan" Version="1.564">
  <BatchSequence><Batch><Statements><StmtSimple StatementText="SELECT ...">
    <QueryPlan>
      <RelOp NodeId="0" PhysicalOp="Hash Match" LogicalOp="Inner Join">
        <Hash>
          <RelOp NodeId="1" PhysicalOp="Clustered Index Scan" LogicalOp="Clustered Index Scan">
            <IndexScan>
              <Object Database="[bench]" Schema="[dbo]" Table="[Orders]" Index="[PK_Orders]" />
            </IndexScan>
          </RelOp>
          <RelOp NodeId="2" PhysicalOp="Table Scan" LogicalOp="Table Scan">
            <TableScan>
              <Object Table="[Customers]" />
            </TableScan>
          </RelOp>
        </Hash>
      </RelOp>
    </QueryPlan>
  </StmtSimple></Statements></Batch></BatchSequence>
</ShowPlanXML>"#;

    #[test]
    fn test_loose_operations_in_document_order() {
        let p = SqlServerAdapter
            .normalize(&RawPlan::Document(SHOWPLAN.to_string()), Fidelity::Loose)
            .unwrap();
        assert_eq!(
            p.operations(),
            [
                "Hash Match",
                "Clustered Index Scan on dbo.Orders",
                "Table Scan on Customers"
            ]
        );
    }

    #[test]
    fn test_empty_document_is_empty_plan() {
        let p = SqlServerAdapter
            .normalize(&RawPlan::Document(String::new()), Fidelity::Loose)
            .unwrap();
        assert!(p.is_empty());
    }

    #[test]
    fn test_invalid_xml_is_malformed() {
        let err = SqlServerAdapter
            .normalize(&RawPlan::Document("<RelOp".into()), Fidelity::Loose)
            .unwrap_err();
        assert!(matches!(err, BenchError::MalformedPlan { .. }));
    }

    #[test]
    fn test_strict_skips_statement_row() {
        let rows = vec![
            PlanRow::new()
                .with("StmtText", Some("SELECT a FROM t"))
                .with("PhysicalOp", None),
            PlanRow::new()
                .with("StmtText", Some("  |--Table Scan(OBJECT:([bench].[dbo].[t]))"))
                .with("PhysicalOp", Some("Table Scan"))
                .with("EstimateRows", Some("1000"))
                .with("EstimateIO", Some("0.0075"))
                .with("EstimateCPU", Some("0.001257"))
                .with("AvgRowSize", Some("11")),
            PlanRow::new().with("PhysicalOp", Some("Sort")),
        ];
        let p = SqlServerAdapter
            .normalize(&RawPlan::Table(rows), Fidelity::Strict)
            .unwrap();
        assert_eq!(
            p.operations(),
            [
                "|--Table Scan(OBJECT:([bench].[dbo].[t])) (Est Rows: 1000, Est IO Cost: 0.0075, Est CPU Time: 0.001257, Avg Row Size: 11)",
                "Sort (Est Rows: Unknown, Est IO Cost: Unknown, Est CPU Time: Unknown, Avg Row Size: Unknown)"
            ]
        );
    }

    #[test]
    fn test_shape_must_match_fidelity() {
        let err = SqlServerAdapter
            .normalize(&RawPlan::Table(vec![]), Fidelity::Loose)
            .unwrap_err();
        assert!(err.to_string().contains("loose fidelity needs a document plan, got table"));
    }
}
