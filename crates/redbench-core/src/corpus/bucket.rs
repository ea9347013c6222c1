use crate::model::EngineId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Correct,
    Redundant,
}

/// Accumulation target selected by a `Version:` directive.
///
/// `engine == None` is the default (engine-independent) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionBucket {
    pub engine: Option<EngineId>,
    pub side: Side,
}

impl VersionBucket {
    /// Parses tokens such as `correct`, `redundancy`, `oracle correct`,
    /// `postgre redundancy`. `error` is accepted as a legacy spelling of
    /// `redundancy`. Returns `None` for anything outside the ten buckets.
    pub fn parse(token: &str) -> Option<Self> {
        let lowered = token.to_lowercase();
        let words: Vec<&str> = lowered.split_whitespace().collect();

        let (engine, side) = match words.as_slice() {
            [side] => (None, *side),
            [engine, side] => (Some(parse_engine(engine)?), *side),
            _ => return None,
        };

        let side = match side {
            "correct" => Side::Correct,
            "redundancy" | "error" => Side::Redundant,
            _ => return None,
        };

        Some(Self { engine, side })
    }
}

// Only the engine spellings the corpus format defines.
fn parse_engine(word: &str) -> Option<EngineId> {
    match word {
        "sqlserver" => Some(EngineId::SqlServer),
        "oracle" => Some(EngineId::Oracle),
        "postgre" => Some(EngineId::PostgreSql),
        "mysql" => Some(EngineId::MySql),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_ten_buckets() {
        let engines = [
            ("", None),
            ("sqlserver ", Some(EngineId::SqlServer)),
            ("oracle ", Some(EngineId::Oracle)),
            ("postgre ", Some(EngineId::PostgreSql)),
            ("mysql ", Some(EngineId::MySql)),
        ];
        for (prefix, engine) in engines {
            assert_eq!(
                VersionBucket::parse(&format!("{prefix}correct")),
                Some(VersionBucket {
                    engine,
                    side: Side::Correct
                })
            );
            assert_eq!(
                VersionBucket::parse(&format!("{prefix}redundancy")),
                Some(VersionBucket {
                    engine,
                    side: Side::Redundant
                })
            );
        }
    }

    #[test]
    fn test_case_and_spacing_insensitive() {
        assert_eq!(
            VersionBucket::parse("  Oracle   CORRECT "),
            Some(VersionBucket {
                engine: Some(EngineId::Oracle),
                side: Side::Correct
            })
        );
        assert_eq!(
            VersionBucket::parse("MySQL Error").map(|b| b.side),
            Some(Side::Redundant)
        );
    }

    #[test]
    fn test_unknown_tokens() {
        assert_eq!(VersionBucket::parse("db2 correct"), None);
        assert_eq!(VersionBucket::parse("postgresql correct"), None);
        assert_eq!(VersionBucket::parse("oracle"), None);
        assert_eq!(VersionBucket::parse(""), None);
        assert_eq!(VersionBucket::parse("oracle correct extra"), None);
    }
}
