use crate::model::{EngineId, Fidelity};
use sha2::{Digest, Sha256};

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

/// Collapses all whitespace runs to a single space and trims the ends, so
/// line breaks and indentation from the corpus do not affect lookups.
pub fn normalize_query(query: &str) -> String {
    query.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn query_hex(query: &str) -> String {
    sha256_hex(&normalize_query(query))
}

/// Lookup key for a recorded plan. `fidelity == None` matches either level.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PlanKey {
    pub engine: EngineId,
    pub fidelity: Option<Fidelity>,
    pub query_hex: String,
}

impl PlanKey {
    pub fn new(engine: EngineId, fidelity: Option<Fidelity>, query: &str) -> Self {
        Self {
            engine,
            fidelity,
            query_hex: query_hex(query),
        }
    }

    pub fn generic(&self) -> Self {
        Self {
            fidelity: None,
            ..self.clone()
        }
    }
}
