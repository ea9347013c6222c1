use crate::report::BenchReport;
use anyhow::Context;
use std::path::Path;

pub fn write_json(report: &BenchReport, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let s = serde_json::to_string_pretty(report)?;
    std::fs::write(out, s).with_context(|| format!("failed to write {}", out.display()))?;
    Ok(())
}
