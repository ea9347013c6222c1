use crate::model::{EngineId, Fidelity, RawPlan};
use async_trait::async_trait;

pub mod replay;

/// Obtains raw plan output for one query from one engine.
///
/// Implementations own connections, credentials and session state (plan
/// output toggles, schema qualification). Calls are awaited one at a time.
#[async_trait]
pub trait PlanProducer: Send + Sync {
    async fn fetch_raw_plan(
        &self,
        engine: EngineId,
        query: &str,
        fidelity: Fidelity,
    ) -> anyhow::Result<RawPlan>;

    fn producer_name(&self) -> &'static str;

    fn fingerprint(&self) -> Option<String> {
        None
    }
}

/// Runs a setup or teardown script against one engine inside a transaction.
/// A failing script must be rolled back before the error is returned.
#[async_trait]
pub trait ScriptRunner: Send + Sync {
    async fn run_script(&self, engine: EngineId, script: &str) -> anyhow::Result<()>;
}
