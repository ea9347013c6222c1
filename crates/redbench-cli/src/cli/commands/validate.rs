use super::exit_codes;
use crate::cli::args::ValidateArgs;
use redbench_core::corpus::load_corpus;
use redbench_core::model::{EngineId, QueryCorpus};
use serde_json::json;
use std::collections::BTreeMap;

pub async fn run(args: ValidateArgs) -> anyhow::Result<i32> {
    let corpus = match load_corpus(&args.corpus) {
        Ok(c) => c,
        Err(e) => {
            if args.format == "json" {
                let output = json!({
                    "schema_version": 1,
                    "ok": false,
                    "corpus": args.corpus,
                    "error": e.to_string(),
                });
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                eprintln!("error: {}", e);
            }
            return Ok(exit_codes::CONFIG_ERROR);
        }
    };

    let summary = CorpusSummary::of(&corpus);
    if args.format == "json" {
        let output = json!({
            "schema_version": 1,
            "ok": true,
            "corpus": args.corpus,
            "records": summary.records,
            "filtered": summary.filtered,
            "categories": summary
                .categories
                .iter()
                .map(|(name, n)| json!({ "name": name, "records": n }))
                .collect::<Vec<_>>(),
            "overrides": summary.overrides,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("corpus: {}", args.corpus.display());
        println!("records: {} (filtered: {})", summary.records, summary.filtered);
        println!("categories:");
        for (name, n) in &summary.categories {
            println!("  {}: {}", name, n);
        }
        if !summary.overrides.is_empty() {
            println!("engine-specific queries:");
            for (engine, n) in &summary.overrides {
                println!("  {}: {}", engine, n);
            }
        }
    }
    Ok(exit_codes::OK)
}

struct CorpusSummary {
    records: usize,
    filtered: usize,
    /// In order of first appearance.
    categories: Vec<(String, usize)>,
    overrides: BTreeMap<EngineId, usize>,
}

impl CorpusSummary {
    fn of(corpus: &QueryCorpus) -> Self {
        let mut categories: Vec<(String, usize)> = Vec::new();
        let mut overrides = BTreeMap::new();
        for r in corpus {
            match categories.iter_mut().find(|(name, _)| *name == r.category) {
                Some((_, n)) => *n += 1,
                None => categories.push((r.category.clone(), 1)),
            }
            for e in r.engine_queries.keys() {
                *overrides.entry(*e).or_insert(0) += 1;
            }
        }
        Self {
            records: corpus.len(),
            filtered: corpus.filtered_count(),
            categories,
            overrides,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use redbench_core::config::SAMPLE_CORPUS;
    use redbench_core::corpus::parse_corpus;

    #[test]
    fn test_summary_of_sample_corpus() {
        let corpus = parse_corpus(SAMPLE_CORPUS).unwrap();
        let s = CorpusSummary::of(&corpus);
        assert_eq!(s.records, 3);
        assert_eq!(s.filtered, 1);
        assert_eq!(
            s.categories,
            vec![
                ("Where".to_string(), 1),
                ("Distinct".to_string(), 1),
                ("Joins".to_string(), 1)
            ]
        );
        assert_eq!(s.overrides.get(&EngineId::MySql), Some(&1));
    }
}
