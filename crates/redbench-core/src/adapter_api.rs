use crate::errors::{BenchError, Result};
use crate::model::{EngineId, ExecutionPlan, Fidelity, RawPlan};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Turns one engine's raw plan output into canonical operation tokens.
pub trait PlanAdapter: Send + Sync {
    fn engine(&self) -> EngineId;

    fn normalize(&self, raw: &RawPlan, fidelity: Fidelity) -> Result<ExecutionPlan>;
}

/// Adapters keyed by the engine they normalize.
#[derive(Clone, Default)]
pub struct AdapterSet {
    adapters: BTreeMap<EngineId, Arc<dyn PlanAdapter>>,
}

impl AdapterSet {
    pub fn new(adapters: impl IntoIterator<Item = Arc<dyn PlanAdapter>>) -> Self {
        let mut set = Self::default();
        for a in adapters {
            set.insert(a);
        }
        set
    }

    /// Registers an adapter, replacing any previous one for the same engine.
    pub fn insert(&mut self, adapter: Arc<dyn PlanAdapter>) {
        self.adapters.insert(adapter.engine(), adapter);
    }

    pub fn get(&self, engine: EngineId) -> Option<&Arc<dyn PlanAdapter>> {
        self.adapters.get(&engine)
    }

    pub fn engines(&self) -> impl Iterator<Item = EngineId> + '_ {
        self.adapters.keys().copied()
    }

    pub fn normalize(
        &self,
        engine: EngineId,
        raw: &RawPlan,
        fidelity: Fidelity,
    ) -> Result<ExecutionPlan> {
        let adapter = self.get(engine).ok_or_else(|| {
            BenchError::Config(crate::errors::ConfigError(format!(
                "no plan adapter registered for {}",
                engine
            )))
        })?;
        adapter.normalize(raw, fidelity)
    }
}

impl std::fmt::Debug for AdapterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.adapters.keys()).finish()
    }
}
