use super::aggregate::AggregationGroup;
use serde::Serialize;

/// How many entries a ranked summary chart shows.
pub const TOP_N: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedEntry {
    pub name: String,
    pub total: f64,
}

impl RankedEntry {
    pub fn new(name: impl Into<String>, total: f64) -> Self {
        Self {
            name: name.into(),
            total,
        }
    }
}

/// Sort descending by total and keep the first `limit`.
///
/// The sort is stable: equal totals stay in their incoming order.
pub fn rank_entries(mut entries: Vec<RankedEntry>, limit: usize) -> Vec<RankedEntry> {
    entries.sort_by(|a, b| b.total.total_cmp(&a.total));
    entries.truncate(limit);
    entries
}

/// Rank an aggregation group for display, keeping at most `TOP_N` entries.
pub fn top_n(group: AggregationGroup) -> Vec<RankedEntry> {
    let entries = group
        .into_iter()
        .map(|(name, total)| RankedEntry { name, total })
        .collect();
    rank_entries(entries, TOP_N)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_n_bound_and_order() {
        let mut group = AggregationGroup::new();
        for i in 0..10 {
            group.insert(format!("H{i}"), (i * 10 + 5) as f64);
        }
        let ranked = top_n(group);
        assert_eq!(ranked.len(), TOP_N);
        assert_eq!(ranked[0], RankedEntry::new("H9", 95.0));
        assert!(ranked.windows(2).all(|w| w[0].total > w[1].total));
        assert!(!ranked.iter().any(|e| e.name == "H0" || e.name == "H1"));
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut group = AggregationGroup::new();
        group.insert("first".into(), 5.0);
        group.insert("big".into(), 9.0);
        group.insert("second".into(), 5.0);
        let names: Vec<_> = top_n(group).into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["big", "first", "second"]);
    }

    #[test]
    fn test_fewer_than_limit() {
        let ranked = rank_entries(vec![RankedEntry::new("A", 1.0)], TOP_N);
        assert_eq!(ranked, vec![RankedEntry::new("A", 1.0)]);
        assert!(top_n(AggregationGroup::new()).is_empty());
    }
}
