use crate::compare::surplus;
use crate::report::{BenchReport, RecordReport};
use std::fmt::Write;

const RULE: &str = "----------------------------------------------------------------------------------------------------";

pub fn print_summary(report: &BenchReport, verbose: bool) {
    eprintln!("\n{}", render_summary(report));
    if verbose {
        eprintln!("{}", render_records(report));
    }
}

/// Per-engine `passed / evaluated` lines followed by the category table.
pub fn render_summary(report: &BenchReport) -> String {
    let mut out = String::new();
    let engines = report.engines();

    out.push_str("Benchmark Results:\n");
    if engines.is_empty() {
        out.push_str("  (no engine was run)\n");
        return out;
    }
    for e in &engines {
        let t = report.scoreboard.engine(*e).unwrap_or_default();
        let _ = writeln!(
            out,
            "{}: {} / {} ({:.0}%)",
            e.display_name(),
            t.passed,
            t.evaluated,
            t.ratio() * 100.0
        );
    }

    let width = report
        .scoreboard
        .categories
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("Category".len());

    out.push('\n');
    let _ = write!(out, "{:<width$}  {:>5}", "Category", "total");
    for e in &engines {
        let _ = write!(out, "  {:>10}", e.key());
    }
    out.push('\n');
    for c in &report.scoreboard.categories {
        let _ = write!(out, "{:<width$}  {:>5}", c.name, c.total);
        for e in &engines {
            let _ = write!(out, "  {:>10}", c.passed_for(*e));
        }
        out.push('\n');
    }

    out.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
    let evaluated: usize = report.scoreboard.engines.values().map(|t| t.evaluated).sum();
    let passed: usize = report.scoreboard.engines.values().map(|t| t.passed).sum();
    let filtered = report.records.iter().filter(|r| r.filtered).count();
    let _ = writeln!(
        out,
        "Summary: {} same plans, {} different plans over {} engine(s) ({} fidelity, {} filtered record(s){})",
        passed,
        evaluated - passed,
        engines.len(),
        report.fidelity,
        filtered,
        if report.filter { "" } else { ", filter off" }
    );
    out
}

pub fn render_records(report: &BenchReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}");
    let _ = writeln!(
        out,
        "Redundancy Benchmark for {} queries:",
        report.records.len()
    );
    let _ = writeln!(out, "{RULE}");
    for r in &report.records {
        out.push_str(&render_record(r));
        let _ = writeln!(out, "{RULE}");
    }
    out
}

pub fn render_record(r: &RecordReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Category: {}", r.category);
    if let Some(s) = &r.source {
        let _ = writeln!(out, "Source: {}", s);
    }
    if let Some(s) = &r.reference {
        let _ = writeln!(out, "Reference: {}", s);
    }
    let _ = writeln!(out, "Description: {}", r.description);
    if r.filtered {
        out.push_str("Filtered: true\n");
    }
    out.push_str("Correct query:\n");
    push_block(&mut out, &r.queries.correct);
    out.push_str("Query with redundancy:\n");
    push_block(&mut out, &r.queries.redundant);
    out.push_str("Results:\n");

    for (engine, res) in &r.results {
        let (icon, label) = if res.equivalent {
            ("✅", "same plans")
        } else {
            ("❌", "different plans")
        };
        let _ = writeln!(out, "\n{} {} ({}):", icon, engine.display_name(), label);
        out.push_str("   Correct Query:\n");
        for op in res.plans.correct.operations() {
            let _ = writeln!(out, "   - {}", op);
        }
        out.push_str("\n   Query with redundancy:\n");
        for op in res.plans.redundant.operations() {
            let _ = writeln!(out, "   - {}", op);
        }
        if !res.equivalent {
            for (op, n) in surplus(&res.plans.redundant, &res.plans.correct) {
                let _ = writeln!(out, "   → extra in redundant plan: {} (x{})", op, n);
            }
            for (op, n) in surplus(&res.plans.correct, &res.plans.redundant) {
                let _ = writeln!(out, "   → missing from redundant plan: {} (x{})", op, n);
            }
        }
    }
    out
}

fn push_block(out: &mut String, text: &str) {
    out.push_str(text);
    if !text.ends_with('\n') {
        out.push('\n');
    }
}
