use crate::fingerprint::{normalize_query, sha256_hex, PlanKey};
use crate::model::{EngineId, Fidelity, RawPlan};
use crate::providers::{PlanProducer, ScriptRunner};
use async_trait::async_trait;
use serde::Deserialize;
use sha2::Digest;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufRead;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Deserialize)]
struct ReplayEntry {
    engine: EngineId,
    #[serde(default)]
    fidelity: Option<Fidelity>,
    query: String,
    plan: RawPlan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClosestQuery {
    pub query: String,
    pub similarity: f64,
}

/// Serves plan outputs recorded from live engines, one JSON object per line:
///
/// ```text
/// {"engine": "postgresql", "query": "SELECT a FROM t", "plan": {"lines": ["Seq Scan on t  (cost=0.00..1.01 rows=1 width=4)"]}}
/// ```
///
/// An entry with a `fidelity` field only serves that level and wins over
/// an entry without one.
#[derive(Clone)]
pub struct ReplayProducer {
    plans: Arc<HashMap<PlanKey, RawPlan>>,
    queries: Arc<Vec<(EngineId, String)>>,
    fingerprint: String,
    scripts: Arc<Mutex<Vec<(EngineId, String)>>>,
}

impl ReplayProducer {
    pub fn from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let file = File::open(path.as_ref()).map_err(|e| {
            anyhow::anyhow!(
                "failed to open replay file '{}': {}",
                path.as_ref().display(),
                e
            )
        })?;
        let reader = std::io::BufReader::new(file);

        let mut plans = HashMap::new();
        let mut queries = Vec::new();
        let mut hasher = sha2::Sha256::new();

        for (i, line_res) in reader.lines().enumerate() {
            let line = line_res?;
            if line.trim().is_empty() {
                continue;
            }

            let entry: ReplayEntry = serde_json::from_str(&line)
                .map_err(|e| anyhow::anyhow!("line {}: parse error: {}", i + 1, e))?;

            let key = PlanKey::new(entry.engine, entry.fidelity, &entry.query);
            if plans.contains_key(&key) {
                return Err(anyhow::anyhow!(
                    "line {}: duplicate {} plan for query: {}",
                    i + 1,
                    entry.engine,
                    normalize_query(&entry.query)
                ));
            }

            hasher.update(line.as_bytes());
            queries.push((entry.engine, normalize_query(&entry.query)));
            plans.insert(key, entry.plan);
        }

        let fingerprint = hex::encode(hasher.finalize());
        tracing::debug!(
            event = "redbench.replay.loaded",
            path = %path.as_ref().display(),
            entries = plans.len(),
            fingerprint = %fingerprint
        );

        Ok(Self {
            plans: Arc::new(plans),
            queries: Arc::new(queries),
            fingerprint,
            scripts: Arc::new(Mutex::new(Vec::new())),
        })
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }

    pub fn lookup(&self, engine: EngineId, query: &str, fidelity: Fidelity) -> Option<&RawPlan> {
        let key = PlanKey::new(engine, Some(fidelity), query);
        self.plans
            .get(&key)
            .or_else(|| self.plans.get(&key.generic()))
    }

    pub fn closest_query(&self, engine: EngineId, query: &str) -> Option<ClosestQuery> {
        let wanted = normalize_query(query);
        self.queries
            .iter()
            .filter(|(e, _)| *e == engine)
            .map(|(_, q)| ClosestQuery {
                query: q.clone(),
                similarity: strsim::normalized_levenshtein(&wanted, q),
            })
            .filter(|c| c.similarity >= 0.5)
            .max_by(|a, b| a.similarity.total_cmp(&b.similarity))
    }

    /// Scripts requested through [`ScriptRunner`], in call order.
    pub async fn requested_scripts(&self) -> Vec<(EngineId, String)> {
        self.scripts.lock().await.clone()
    }
}

#[async_trait]
impl PlanProducer for ReplayProducer {
    async fn fetch_raw_plan(
        &self,
        engine: EngineId,
        query: &str,
        fidelity: Fidelity,
    ) -> anyhow::Result<RawPlan> {
        if let Some(plan) = self.lookup(engine, query, fidelity) {
            return Ok(plan.clone());
        }

        let mut msg = format!(
            "replay miss: no recorded {} {} plan for query '{}'",
            engine,
            fidelity,
            normalize_query(query)
        );
        if let Some(c) = self.closest_query(engine, query) {
            msg.push_str(&format!(
                " (did you mean '{}'? similarity: {:.2})",
                c.query, c.similarity
            ));
        }
        Err(anyhow::anyhow!(msg))
    }

    fn producer_name(&self) -> &'static str {
        "replay"
    }

    fn fingerprint(&self) -> Option<String> {
        Some(self.fingerprint.clone())
    }
}

#[async_trait]
impl ScriptRunner for ReplayProducer {
    async fn run_script(&self, engine: EngineId, script: &str) -> anyhow::Result<()> {
        tracing::info!(
            event = "redbench.replay.script_skipped",
            engine = %engine,
            script_sha256 = %sha256_hex(script),
            "replayed plans already reflect the recorded schema state"
        );
        self.scripts.lock().await.push((engine, script.to_string()));
        Ok(())
    }
}
