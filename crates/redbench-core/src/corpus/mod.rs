//! Reader for the annotated test-definition format.
//!
//! A document is a sequence of records, each terminated by `-- end`:
//!
//! ```text
//! -- Category: Joins
//! -- Description: tautological filter
//! -- Version: correct
//! SELECT a FROM t
//! -- Version: redundancy
//! SELECT a FROM t WHERE 1=1
//! -- Version: oracle redundancy
//! SELECT a FROM t WHERE 1=1 AND ROWNUM > 0
//! -- Version: oracle correct
//! SELECT a FROM t
//! -- Filter: true
//! -- end
//! ```
//!
//! `Category` carries over to following records until it is set again;
//! every other field is cleared by `-- end`.

pub mod bucket;

use crate::errors::{BenchError, Result};
use crate::model::{EngineId, QueryCorpus, QueryPair, QueryRecord};
use bucket::{Side, VersionBucket};
use std::collections::BTreeMap;
use std::path::Path;

pub const DIRECTIVE_PREFIX: &str = "-- ";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Directive<'a> {
    Category(&'a str),
    Source(&'a str),
    Reference(&'a str),
    Description(&'a str),
    Version(&'a str),
    Filter(&'a str),
    End,
}

fn parse_directive(line: &str) -> Option<Directive<'_>> {
    let rest = line.strip_prefix(DIRECTIVE_PREFIX)?;
    if rest.trim().eq_ignore_ascii_case("end") {
        return Some(Directive::End);
    }

    let (key, value) = rest.split_once(':')?;
    let value = value.trim();
    match key.trim().to_ascii_lowercase().as_str() {
        "category" => Some(Directive::Category(value)),
        "source" => Some(Directive::Source(value)),
        "reference" => Some(Directive::Reference(value)),
        "description" => Some(Directive::Description(value)),
        "version" => Some(Directive::Version(value)),
        "filter" => Some(Directive::Filter(value)),
        _ => None,
    }
}

#[derive(Debug, Default)]
struct PairBuf {
    correct: String,
    redundant: String,
}

impl PairBuf {
    fn side_mut(&mut self, side: Side) -> &mut String {
        match side {
            Side::Correct => &mut self.correct,
            Side::Redundant => &mut self.redundant,
        }
    }

    fn into_complete(self) -> Option<QueryPair> {
        if self.correct.is_empty() || self.redundant.is_empty() {
            return None;
        }
        Some(QueryPair::new(self.correct, self.redundant))
    }
}

/// Record under construction between two `-- end` directives.
#[derive(Debug, Default)]
struct PendingRecord {
    source: String,
    reference: String,
    description: String,
    version: Option<VersionBucket>,
    filter: bool,
    defaults: PairBuf,
    engines: BTreeMap<EngineId, PairBuf>,
    touched: bool,
}

impl PendingRecord {
    fn append(&mut self, line: &str) {
        let Some(bucket) = self.version else {
            return;
        };
        let buf = match bucket.engine {
            None => &mut self.defaults,
            Some(engine) => self.engines.entry(engine).or_default(),
        };
        let target = buf.side_mut(bucket.side);
        target.push_str(line);
        target.push('\n');
        self.touched = true;
    }

    fn finish(self, category: &str, line: usize) -> Result<QueryRecord> {
        let defaults = self.defaults.into_complete().ok_or_else(|| {
            BenchError::malformed_corpus(
                line,
                "record has no default correct/redundancy query text",
            )
        })?;

        let mut record = QueryRecord::new(category, self.description, defaults).excluded(self.filter);

        if !self.source.is_empty() && !self.reference.is_empty() {
            record = record.with_source_and_reference(self.source, self.reference);
        }

        for (engine, buf) in self.engines {
            if let Some(pair) = buf.into_complete() {
                record = record.with_engine_queries(engine, pair);
            } else {
                tracing::debug!(
                    event = "redbench.corpus.partial_override_dropped",
                    engine = %engine,
                    line,
                    "ignoring incomplete {} override",
                    engine
                );
            }
        }

        Ok(record)
    }
}

/// Parses a full test-definition document.
pub fn parse_corpus(text: &str) -> Result<QueryCorpus> {
    let mut corpus = QueryCorpus::new();
    let mut category = String::new();
    let mut pending = PendingRecord::default();

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.strip_suffix('\r').unwrap_or(raw);

        match parse_directive(line) {
            Some(Directive::End) => {
                let done = std::mem::take(&mut pending);
                corpus.push(done.finish(&category, line_no)?);
            }
            Some(Directive::Category(v)) => category = v.to_string(),
            Some(Directive::Source(v)) => pending.source = v.to_string(),
            Some(Directive::Reference(v)) => pending.reference = v.to_string(),
            Some(Directive::Description(v)) => pending.description = v.to_string(),
            Some(Directive::Filter(v)) => pending.filter = v.eq_ignore_ascii_case("true"),
            Some(Directive::Version(v)) => {
                pending.version = VersionBucket::parse(v);
                if pending.version.is_none() {
                    tracing::debug!(
                        event = "redbench.corpus.unknown_version",
                        line = line_no,
                        token = v,
                        "unknown version token, dropping content until next Version directive"
                    );
                }
            }
            None if line.trim().is_empty() => {}
            None => pending.append(line),
        }
    }

    if pending.touched {
        tracing::warn!(
            event = "redbench.corpus.unterminated_record",
            records = corpus.len(),
            "query text after the last '-- end' was discarded"
        );
    }

    Ok(corpus)
}

/// Reads and parses a corpus document from disk.
pub fn load_corpus(path: &Path) -> Result<QueryCorpus> {
    if !path.exists() {
        return Err(BenchError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let text = std::fs::read_to_string(path)?;
    let corpus = parse_corpus(&text)?;
    tracing::info!(
        event = "redbench.corpus.loaded",
        path = %path.display(),
        records = corpus.len(),
        filtered = corpus.filtered_count()
    );
    Ok(corpus)
}
