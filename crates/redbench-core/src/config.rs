use crate::engine::RunSettings;
use crate::errors::ConfigError;
use crate::model::{EngineId, Fidelity};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BenchConfig {
    #[serde(default, rename = "configVersion", alias = "version")]
    pub version: u32,
    pub corpus: String,
    #[serde(default)]
    pub fidelity: Fidelity,
    #[serde(default = "default_filter")]
    pub filter: bool,
    #[serde(default = "default_engines")]
    pub engines: Vec<EngineId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replay: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub scripts: BTreeMap<EngineId, EngineScripts>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EngineScripts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub teardown: Option<String>,
}

fn default_filter() -> bool {
    true
}

fn default_engines() -> Vec<EngineId> {
    EngineId::RUN_ORDER.to_vec()
}

impl BenchConfig {
    pub fn run_settings(&self) -> RunSettings {
        RunSettings {
            fidelity: self.fidelity,
            filter: self.filter,
        }
    }

    pub fn scripts_for(&self, engine: EngineId) -> Option<&EngineScripts> {
        self.scripts.get(&engine)
    }
}

pub fn load_config(path: &Path, strict: bool) -> Result<BenchConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;

    let mut ignored_keys = std::collections::BTreeSet::new();
    let deserializer = serde_yaml::Deserializer::from_str(&raw);

    let mut cfg: BenchConfig = serde_ignored::deserialize(deserializer, |path| {
        ignored_keys.insert(path.to_string());
    })
    .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;

    let meaningful_unknowns: Vec<_> = ignored_keys
        .iter()
        .filter(|k| !k.starts_with('_') && !k.starts_with("x-"))
        .collect();
    if !meaningful_unknowns.is_empty() {
        if strict {
            return Err(ConfigError(format!(
                "Unknown fields detected in strict mode: {:?} (file: {})",
                meaningful_unknowns,
                path.display()
            )));
        }
        tracing::warn!(
            event = "redbench.config.ignored_fields",
            fields = ?meaningful_unknowns,
            file = %path.display()
        );
    }

    if cfg.version != 0 && cfg.version != SUPPORTED_CONFIG_VERSION {
        return Err(ConfigError(format!(
            "unsupported config version {} (supported: 0, {})",
            cfg.version, SUPPORTED_CONFIG_VERSION
        )));
    }

    if cfg.corpus.trim().is_empty() {
        return Err(ConfigError("config has no corpus path".into()));
    }

    if cfg.engines.is_empty() {
        return Err(ConfigError("config lists no engines".into()));
    }

    let mut seen = std::collections::BTreeSet::new();
    for e in &cfg.engines {
        if !seen.insert(*e) {
            return Err(ConfigError(format!("engine {} listed twice", e)));
        }
    }

    normalize_paths(&mut cfg, path);
    Ok(cfg)
}

/// Relative paths in a config are relative to the config file's directory.
fn normalize_paths(cfg: &mut BenchConfig, config_path: &Path) {
    let base = config_path.parent().unwrap_or(Path::new(""));
    let resolve = |s: &mut String| {
        if s.trim().is_empty() || Path::new(s.as_str()).is_absolute() {
            return;
        }
        *s = lexical_join(base, Path::new(s.as_str()))
            .to_string_lossy()
            .into_owned();
    };

    resolve(&mut cfg.corpus);
    if let Some(replay) = cfg.replay.as_mut() {
        resolve(replay);
    }
    for scripts in cfg.scripts.values_mut() {
        for p in [&mut scripts.setup, &mut scripts.teardown].into_iter().flatten() {
            resolve(p);
        }
    }
}

/// Joins without touching the filesystem; `.` is dropped and `..` pops.
fn lexical_join(base: &Path, rel: &Path) -> PathBuf {
    base.join(rel)
        .components()
        .fold(PathBuf::new(), |mut out, c| {
            match c {
                Component::CurDir => {}
                Component::ParentDir => {
                    if !out.pop() {
                        out.push("..");
                    }
                }
                other => out.push(other.as_os_str()),
            }
            out
        })
}

pub const SAMPLE_CONFIG: &str = r#"configVersion: 1
corpus: queries.sql
replay: plans.jsonl
fidelity: loose
filter: true
label: without indexes
engines: [postgresql, mysql]
"#;

pub const SAMPLE_CORPUS: &str = r#"-- Category: Where
-- Description: tautological predicate
-- Version: correct
SELECT a FROM t
-- Version: redundancy
SELECT a FROM t WHERE 1=1
-- end

-- Category: Distinct
-- Description: DISTINCT over a primary key
-- Version: correct
SELECT id FROM t
-- Version: redundancy
SELECT DISTINCT id FROM t
-- Version: mysql correct
SELECT id FROM t
-- Version: mysql redundancy
SELECT DISTINCT id FROM t USE INDEX (PRIMARY)
-- end

-- Category: Joins
-- Description: self join on key, excluded from filtered runs
-- Version: correct
SELECT a FROM t
-- Version: redundancy
SELECT t1.a FROM t t1 JOIN t t2 ON t1.id = t2.id
-- Filter: true
-- end
"#;

pub const SAMPLE_PLANS: &str = r#"{"engine": "postgresql", "query": "SELECT a FROM t", "plan": {"lines": ["Seq Scan on t  (cost=0.00..35.50 rows=2550 width=4)"]}}
{"engine": "postgresql", "query": "SELECT a FROM t WHERE 1=1", "plan": {"lines": ["Seq Scan on t  (cost=0.00..35.50 rows=2550 width=4)"]}}
{"engine": "postgresql", "query": "SELECT id FROM t", "plan": {"lines": ["Seq Scan on t  (cost=0.00..35.50 rows=2550 width=4)"]}}
{"engine": "postgresql", "query": "SELECT DISTINCT id FROM t", "plan": {"lines": ["HashAggregate  (cost=41.88..43.88 rows=200 width=4)", "  Group Key: id", "  ->  Seq Scan on t  (cost=0.00..35.50 rows=2550 width=4)"]}}
{"engine": "mysql", "query": "SELECT a FROM t", "plan": {"table": [{"select_type": "SIMPLE", "table": "t", "type": "ALL", "key": null, "ref": null, "rows": "10", "filtered": "100.00", "Extra": null}]}}
{"engine": "mysql", "query": "SELECT a FROM t WHERE 1=1", "plan": {"table": [{"select_type": "SIMPLE", "table": "t", "type": "ALL", "key": null, "ref": null, "rows": "10", "filtered": "100.00", "Extra": null}]}}
{"engine": "mysql", "query": "SELECT id FROM t", "plan": {"table": [{"select_type": "SIMPLE", "table": "t", "type": "index", "key": "PRIMARY", "ref": null, "rows": "10", "filtered": "100.00", "Extra": "Using index"}]}}
{"engine": "mysql", "query": "SELECT DISTINCT id FROM t USE INDEX (PRIMARY)", "plan": {"table": [{"select_type": "SIMPLE", "table": "t", "type": "index", "key": "PRIMARY", "ref": null, "rows": "10", "filtered": "100.00", "Extra": "Using index"}]}}
"#;

/// Writes a sample config next to a matching corpus and replay file.
pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    std::fs::write(path, SAMPLE_CONFIG)
        .map_err(|e| ConfigError(format!("failed to write sample config: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() -> anyhow::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "corpus: queries.sql")?;

        let cfg = load_config(tmp.path(), true)?;
        assert_eq!(cfg.version, 0);
        assert_eq!(cfg.fidelity, Fidelity::Loose);
        assert!(cfg.filter);
        assert_eq!(cfg.engines, EngineId::RUN_ORDER.to_vec());
        let dir = tmp.path().parent().unwrap();
        assert_eq!(
            Path::new(&cfg.corpus),
            dir.join("queries.sql").as_path()
        );
        Ok(())
    }

    #[test]
    fn test_sample_config_parses() -> anyhow::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        write!(tmp, "{}", SAMPLE_CONFIG)?;
        let cfg = load_config(tmp.path(), true)?;
        assert_eq!(cfg.version, 1);
        assert_eq!(cfg.engines, vec![EngineId::PostgreSql, EngineId::MySql]);
        assert_eq!(cfg.label.as_deref(), Some("without indexes"));
        assert!(cfg.replay.as_deref().unwrap().ends_with("plans.jsonl"));
        Ok(())
    }

    #[test]
    fn test_scripts_resolve_relative_paths() -> anyhow::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(
            tmp,
            "corpus: q.sql\nfidelity: strict\nscripts:\n  mysql:\n    setup: create_indexes_mysql.sql\n    teardown: delete_indexes_mysql.sql"
        )?;
        let cfg = load_config(tmp.path(), true)?;
        assert_eq!(cfg.run_settings().fidelity, Fidelity::Strict);
        let scripts = cfg.scripts_for(EngineId::MySql).unwrap();
        assert!(Path::new(scripts.setup.as_deref().unwrap()).is_absolute());
        assert!(cfg.scripts_for(EngineId::Oracle).is_none());
        Ok(())
    }

    #[test]
    fn test_lexical_join() {
        assert_eq!(
            lexical_join(Path::new("/work/bench"), Path::new("../resources/./q.sql")),
            PathBuf::from("/work/resources/q.sql")
        );
        assert_eq!(
            lexical_join(Path::new(""), Path::new("../q.sql")),
            PathBuf::from("../q.sql")
        );
    }

    #[test]
    fn test_unknown_fields_strict_vs_lenient() -> anyhow::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "corpus: q.sql\nparallel: 4\nx-note: fine")?;

        let err = load_config(tmp.path(), true).unwrap_err();
        assert!(err.0.contains("parallel"));
        assert!(!err.0.contains("x-note"));

        let cfg = load_config(tmp.path(), false)?;
        assert_eq!(cfg.corpus.is_empty(), false);
        Ok(())
    }

    #[test]
    fn test_rejects_bad_version_and_duplicate_engines() -> anyhow::Result<()> {
        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "configVersion: 7\ncorpus: q.sql")?;
        assert!(load_config(tmp.path(), false)
            .unwrap_err()
            .0
            .contains("unsupported config version 7"));

        let mut tmp = NamedTempFile::new()?;
        writeln!(tmp, "corpus: q.sql\nengines: [oracle, oracle]")?;
        assert!(load_config(tmp.path(), false)
            .unwrap_err()
            .0
            .contains("listed twice"));
        Ok(())
    }
}
