use crate::report::console::{render_records, render_summary};
use crate::report::BenchReport;
use anyhow::Context;
use std::path::Path;

/// Plain-text report: header line, summary, then every record with its plans.
pub fn render_text(report: &BenchReport) -> String {
    let label = report
        .label
        .as_deref()
        .map(|l| format!(" {}", l))
        .unwrap_or_default();
    format!(
        "Benchmark ({}){} from: {}\n\n{}\n{}",
        report.fidelity,
        label,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        render_summary(report),
        render_records(report)
    )
}

pub fn write_text(report: &BenchReport, out: &Path) -> anyhow::Result<()> {
    std::fs::write(out, render_text(report))
        .with_context(|| format!("failed to write {}", out.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::RunSettings;
    use crate::model::{Fidelity, QueryCorpus, QueryPair, QueryRecord};

    #[test]
    fn test_header_names_fidelity_and_label() {
        let corpus = QueryCorpus::from(vec![QueryRecord::new("Where", "x", QueryPair::new("a", "b"))]);
        let settings = RunSettings {
            fidelity: Fidelity::Strict,
            filter: false,
        };
        let report = BenchReport::build(&corpus, settings, vec![], Some("without indexes".into()));
        let text = render_text(&report);
        assert!(text.starts_with("Benchmark (strict) without indexes from: "));
        assert!(text.contains("Redundancy Benchmark for 1 queries:"));
    }
}
