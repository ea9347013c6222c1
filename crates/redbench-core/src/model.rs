use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EngineId {
    SqlServer,
    Oracle,
    MySql,
    PostgreSql,
}

impl EngineId {
    pub const ALL: [EngineId; 4] = [
        EngineId::SqlServer,
        EngineId::Oracle,
        EngineId::MySql,
        EngineId::PostgreSql,
    ];

    /// Order the original benchmark runs engines in.
    pub const RUN_ORDER: [EngineId; 4] = [
        EngineId::SqlServer,
        EngineId::MySql,
        EngineId::PostgreSql,
        EngineId::Oracle,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            EngineId::SqlServer => "sqlserver",
            EngineId::Oracle => "oracle",
            EngineId::MySql => "mysql",
            EngineId::PostgreSql => "postgresql",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            EngineId::SqlServer => "Microsoft SQL Server",
            EngineId::Oracle => "Oracle",
            EngineId::MySql => "MySQL",
            EngineId::PostgreSql => "PostgreSQL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlserver" | "mssql" => Some(EngineId::SqlServer),
            "oracle" => Some(EngineId::Oracle),
            "mysql" => Some(EngineId::MySql),
            "postgresql" | "postgres" | "postgre" => Some(EngineId::PostgreSql),
            _ => None,
        }
    }
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "lowercase")]
pub enum Fidelity {
    #[default]
    Loose,
    Strict,
}

impl Fidelity {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "loose" => Some(Fidelity::Loose),
            "strict" => Some(Fidelity::Strict),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Fidelity::Loose => "loose",
            Fidelity::Strict => "strict",
        }
    }
}

impl fmt::Display for Fidelity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A correct query and its redundantly expressed counterpart.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryPair {
    pub correct: String,
    pub redundant: String,
}

impl QueryPair {
    pub fn new(correct: impl Into<String>, redundant: impl Into<String>) -> Self {
        Self {
            correct: correct.into(),
            redundant: redundant.into(),
        }
    }
}

/// Normalized plan: one opaque token per physical operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct ExecutionPlan {
    operations: Vec<String>,
}

impl ExecutionPlan {
    /// Builds a plan, dropping tokens that are empty after trimming.
    pub fn new<I, S>(operations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            operations: operations
                .into_iter()
                .map(Into::into)
                .filter(|op| !op.trim().is_empty())
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn operations(&self) -> &[String] {
        &self.operations
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl From<Vec<String>> for ExecutionPlan {
    fn from(operations: Vec<String>) -> Self {
        Self::new(operations)
    }
}

impl From<ExecutionPlan> for Vec<String> {
    fn from(plan: ExecutionPlan) -> Self {
        plan.operations
    }
}

impl<S: Into<String>> FromIterator<S> for ExecutionPlan {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        ExecutionPlan::new(iter)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlanPair {
    pub correct: ExecutionPlan,
    pub redundant: ExecutionPlan,
}

/// One benchmark test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRecord {
    pub category: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default)]
    pub filter_excluded: bool,
    pub default_queries: QueryPair,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub engine_queries: BTreeMap<EngineId, QueryPair>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub plans: BTreeMap<EngineId, PlanPair>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub verdict: BTreeMap<EngineId, bool>,
}

impl QueryRecord {
    pub fn new(
        category: impl Into<String>,
        description: impl Into<String>,
        default_queries: QueryPair,
    ) -> Self {
        Self {
            category: category.into(),
            description: description.into(),
            source: None,
            reference: None,
            filter_excluded: false,
            default_queries,
            engine_queries: BTreeMap::new(),
            plans: BTreeMap::new(),
            verdict: BTreeMap::new(),
        }
    }

    pub fn with_source_and_reference(
        mut self,
        source: impl Into<String>,
        reference: impl Into<String>,
    ) -> Self {
        self.source = Some(source.into());
        self.reference = Some(reference.into());
        self
    }

    pub fn with_engine_queries(mut self, engine: EngineId, queries: QueryPair) -> Self {
        self.engine_queries.insert(engine, queries);
        self
    }

    pub fn excluded(mut self, excluded: bool) -> Self {
        self.filter_excluded = excluded;
        self
    }

    pub fn correct_query(&self) -> &str {
        &self.default_queries.correct
    }

    pub fn redundant_query(&self) -> &str {
        &self.default_queries.redundant
    }

    /// Query pair the given engine runs: its override if present, else the default pair.
    pub fn queries_for(&self, engine: EngineId) -> &QueryPair {
        self.engine_queries
            .get(&engine)
            .unwrap_or(&self.default_queries)
    }

    pub fn correct_query_for(&self, engine: EngineId) -> &str {
        &self.queries_for(engine).correct
    }

    pub fn redundant_query_for(&self, engine: EngineId) -> &str {
        &self.queries_for(engine).redundant
    }

    pub fn is_evaluated(&self, engine: EngineId) -> bool {
        self.verdict.contains_key(&engine)
    }

    pub fn record_result(&mut self, engine: EngineId, plans: PlanPair, equivalent: bool) {
        self.plans.insert(engine, plans);
        self.verdict.insert(engine, equivalent);
    }

    pub fn reset_results(&mut self) {
        self.plans.clear();
        self.verdict.clear();
    }

    /// Whether the record takes part in a run with the given filter setting.
    pub fn is_active(&self, filter_enabled: bool) -> bool {
        !(filter_enabled && self.filter_excluded)
    }
}

/// Ordered test corpus; order is the source order of the definition document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryCorpus {
    records: Vec<QueryRecord>,
}

impl QueryCorpus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record: QueryRecord) {
        self.records.push(record);
    }

    pub fn get(&self, index: usize) -> Option<&QueryRecord> {
        self.records.get(index)
    }

    pub fn records(&self) -> &[QueryRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [QueryRecord] {
        &mut self.records
    }

    pub fn iter(&self) -> std::slice::Iter<'_, QueryRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn filtered_count(&self) -> usize {
        self.records.iter().filter(|r| r.filter_excluded).count()
    }

    pub fn reset_results(&mut self) {
        for r in &mut self.records {
            r.reset_results();
        }
    }
}

impl From<Vec<QueryRecord>> for QueryCorpus {
    fn from(records: Vec<QueryRecord>) -> Self {
        Self { records }
    }
}

impl<'a> IntoIterator for &'a QueryCorpus {
    type Item = &'a QueryRecord;
    type IntoIter = std::slice::Iter<'a, QueryRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// One output row of a tabular plan. Column lookup ignores case.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PlanRow {
    columns: BTreeMap<String, Option<String>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Cell {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Cell {
    fn into_text(self) -> String {
        match self {
            Cell::Text(s) => s,
            Cell::Int(i) => i.to_string(),
            Cell::Float(f) => f.to_string(),
            Cell::Bool(b) => b.to_string(),
        }
    }
}

// Recorded rows may carry numbers (`"rows": 10`); cells are kept as text.
impl<'de> Deserialize<'de> for PlanRow {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = BTreeMap::<String, Option<Cell>>::deserialize(deserializer)?;
        Ok(Self {
            columns: raw
                .into_iter()
                .map(|(k, v)| (k, v.map(Cell::into_text)))
                .collect(),
        })
    }
}

impl PlanRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: Option<&str>) -> Self {
        self.columns.insert(column.into(), value.map(String::from));
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Option<String>) {
        self.columns.insert(column.into(), value);
    }

    /// Non-null value of a column; absent columns and SQL NULL both yield `None`.
    pub fn get(&self, column: &str) -> Option<&str> {
        if let Some(v) = self.columns.get(column) {
            return v.as_deref();
        }
        self.columns
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(column))
            .and_then(|(_, v)| v.as_deref())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = Option<&str>> {
        self.columns.values().map(|v| v.as_deref())
    }
}

/// Plan output exactly as an engine produced it, before normalization.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RawPlan {
    /// Tree-structured markup (e.g. showplan XML).
    Document(String),
    /// Tabular explain output, one row per plan step.
    Table(Vec<PlanRow>),
    /// Plain text lines.
    Lines(Vec<String>),
}

impl RawPlan {
    pub fn shape(&self) -> &'static str {
        match self {
            RawPlan::Document(_) => "document",
            RawPlan::Table(_) => "table",
            RawPlan::Lines(_) => "lines",
        }
    }
}
