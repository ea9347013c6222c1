use crate::model::ExecutionPlan;

/// Order-insensitive plan equivalence: both plans hold the same multiset of
/// operation tokens, duplicates included.
pub fn equivalent(a: &ExecutionPlan, b: &ExecutionPlan) -> bool {
    if a.len() != b.len() {
        return false;
    }
    sorted_ops(a) == sorted_ops(b)
}

fn sorted_ops(plan: &ExecutionPlan) -> Vec<&str> {
    let mut ops: Vec<&str> = plan.operations().iter().map(String::as_str).collect();
    ops.sort_unstable();
    ops
}

/// Tokens that occur more often in `a` than in `b`, with their surplus count.
/// Used by reports to show why two plans differ.
pub fn surplus<'a>(a: &'a ExecutionPlan, b: &ExecutionPlan) -> Vec<(&'a str, usize)> {
    let mut counts: std::collections::BTreeMap<&str, isize> = std::collections::BTreeMap::new();
    for op in a.operations() {
        *counts.entry(op.as_str()).or_default() += 1;
    }
    for op in b.operations() {
        if let Some(c) = counts.get_mut(op.as_str()) {
            *c -= 1;
        }
    }
    counts
        .into_iter()
        .filter(|(_, c)| *c > 0)
        .map(|(op, c)| (op, c as usize))
        .collect()
}
