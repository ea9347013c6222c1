use crate::model::{EngineId, QueryCorpus};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Tally {
    pub passed: usize,
    pub evaluated: usize,
}

impl Tally {
    pub fn ratio(&self) -> f64 {
        if self.evaluated == 0 {
            0.0
        } else {
            self.passed as f64 / self.evaluated as f64
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryScore {
    pub name: String,
    /// Records in the category that take part under the active filter.
    pub total: usize,
    pub passed: BTreeMap<EngineId, usize>,
}

impl CategoryScore {
    pub fn passed_for(&self, engine: EngineId) -> usize {
        self.passed.get(&engine).copied().unwrap_or(0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scoreboard {
    pub engines: BTreeMap<EngineId, Tally>,
    /// In order of first appearance in the corpus.
    pub categories: Vec<CategoryScore>,
}

impl Scoreboard {
    pub fn engine(&self, engine: EngineId) -> Option<Tally> {
        self.engines.get(&engine).copied()
    }

    pub fn category(&self, name: &str) -> Option<&CategoryScore> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// True when every evaluated record passed on every engine that ran.
    pub fn all_equivalent(&self) -> bool {
        self.engines.values().all(|t| t.passed == t.evaluated)
    }
}

/// Aggregates stored verdicts; no plan is recomputed.
///
/// Only engines with at least one verdict appear in `engines`. Filtered
/// records count toward nothing while `filter_enabled` is set.
pub fn aggregate(corpus: &QueryCorpus, filter_enabled: bool) -> Scoreboard {
    let mut engines: BTreeMap<EngineId, Tally> = BTreeMap::new();
    let mut categories: Vec<CategoryScore> = Vec::new();
    let mut index: BTreeMap<&str, usize> = BTreeMap::new();

    for record in corpus {
        let slot = *index.entry(record.category.as_str()).or_insert_with(|| {
            categories.push(CategoryScore {
                name: record.category.clone(),
                total: 0,
                passed: BTreeMap::new(),
            });
            categories.len() - 1
        });

        if !record.is_active(filter_enabled) {
            continue;
        }

        let category = &mut categories[slot];
        category.total += 1;

        for (&engine, &same) in &record.verdict {
            let tally = engines.entry(engine).or_default();
            tally.evaluated += 1;
            let in_category = category.passed.entry(engine).or_default();
            if same {
                tally.passed += 1;
                *in_category += 1;
            }
        }
    }

    Scoreboard {
        engines,
        categories,
    }
}
