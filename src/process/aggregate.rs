use super::columns::resolve_template;
use super::rank::RankedEntry;
use super::utils::coerce_number;
use super::RawTable;
use indexmap::IndexMap;

/// Running totals per category, in first-seen order.
pub type AggregationGroup = IndexMap<String, f64>;

/// Sum `value` per `category` over every row.
///
/// Rows with a blank category or a coerced value ≤ 0 are skipped, so no
/// category with a non-positive total ever appears. An absent column yields an
/// empty group.
pub fn group_sum(
    table: &RawTable,
    category: Option<usize>,
    value: Option<usize>,
) -> AggregationGroup {
    let mut group = AggregationGroup::new();
    if category.is_none() || value.is_none() {
        return group;
    }

    for row in &table.rows {
        let key = table.cell(row, category).trim();
        let v = coerce_number(table.cell(row, value));
        if key.is_empty() || v <= 0.0 {
            continue;
        }
        *group.entry(key.to_string()).or_insert(0.0) += v;
    }
    group
}

/// Sum one column over all rows.
pub fn column_sum(table: &RawTable, col: Option<usize>) -> f64 {
    match col {
        Some(_) => table
            .rows
            .iter()
            .map(|row| coerce_number(table.cell(row, col)))
            .sum(),
        None => 0.0,
    }
}

/// For each label, sum the column named by `template` filled with that label.
///
/// The output always has one value per label. Missing columns give 0 and zero
/// sums are kept.
pub fn sum_by_labels(table: &RawTable, template: &str, labels: &[String]) -> Vec<f64> {
    labels
        .iter()
        .map(|label| column_sum(table, resolve_template(&table.headers, template, label)))
        .collect()
}

/// One entry per row: the name in column 0 (or `fallback_name` when blank)
/// and the sum of every later cell. Rows whose sum is not positive are dropped.
///
/// Rows are not merged by name; each row stands on its own.
pub fn row_totals(table: &RawTable, fallback_name: &str) -> Vec<RankedEntry> {
    table
        .rows
        .iter()
        .filter_map(|row| {
            let name = match row.first().map(String::as_str) {
                Some(n) if !n.is_empty() => n,
                _ => fallback_name,
            };
            let total: f64 = row.iter().skip(1).map(|c| coerce_number(c)).sum();
            (total > 0.0).then(|| RankedEntry::new(name, total))
        })
        .collect()
}
