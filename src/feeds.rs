// src/feeds.rs
//! One loader per dashboard chart. Each turns a fetched CSV into chart-ready
//! series and reports failure as a `LoadError` for the caller to degrade on.

use crate::error::{LoadError, LoadResult};
use crate::fetch::Fetcher;
use crate::process::{
    aggregate::{group_sum, row_totals, sum_by_labels},
    columns::resolve_column,
    load_csv,
    rank::{rank_entries, top_n, RankedEntry, TOP_N},
    RawTable,
};
use indexmap::IndexMap;
use serde::Serialize;
use tracing::{info, instrument};

pub const BIRTHS_TEMPLATE: &str = "births ({year})";
pub const DEATHS_TEMPLATE: &str = "deaths ({year})";
pub const HOSPITAL_COLUMN: &str = "hospitals";
pub const VISITORS_COLUMN: &str = "number of visitors";
pub const UNKNOWN_HOSPITAL: &str = "Unknown Hospital";
pub const GENERAL_SPECIALTY: &str = "General";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub values: Vec<f64>,
}

/// Labels plus one or more value series of the same length.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartSeries {
    pub fn from_ranked(label: &str, entries: &[RankedEntry]) -> Self {
        Self {
            labels: entries.iter().map(|e| e.name.clone()).collect(),
            datasets: vec![Dataset {
                label: label.to_string(),
                values: entries.iter().map(|e| e.total).collect(),
            }],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Yearly birth and death totals. Every year appears, with 0 when its column is missing.
pub fn birth_death_series(table: &RawTable, years: &[String]) -> ChartSeries {
    ChartSeries {
        labels: years.to_vec(),
        datasets: vec![
            Dataset {
                label: "Births".into(),
                values: sum_by_labels(table, BIRTHS_TEMPLATE, years),
            },
            Dataset {
                label: "Deaths".into(),
                values: sum_by_labels(table, DEATHS_TEMPLATE, years),
            },
        ],
    }
}

/// Top hospitals by summed visitor count.
pub fn visitor_ranking(table: &RawTable) -> Option<Vec<RankedEntry>> {
    let hosp = resolve_column(&table.headers, HOSPITAL_COLUMN)?;
    let val = resolve_column(&table.headers, VISITORS_COLUMN)?;
    Some(top_n(group_sum(table, Some(hosp), Some(val))))
}

/// Top hospitals by bed count, where a hospital's count is the sum of every
/// cell after its name.
pub fn bed_ranking(table: &RawTable) -> Vec<RankedEntry> {
    rank_entries(row_totals(table, UNKNOWN_HOSPITAL), TOP_N)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialtyKind {
    Cardiology,
    Oncology,
    Dermatology,
    Trauma,
    Neurology,
    InternalMedicine,
    Surgery,
    Pediatrics,
    Other,
}

impl SpecialtyKind {
    /// Classify a free-text specialty by keyword, first match wins.
    pub fn classify(specialty: &str) -> Self {
        let s = specialty.to_lowercase();
        const RULES: &[(&str, SpecialtyKind)] = &[
            ("cardio", SpecialtyKind::Cardiology),
            ("onco", SpecialtyKind::Oncology),
            ("derma", SpecialtyKind::Dermatology),
            ("trauma", SpecialtyKind::Trauma),
            ("neuro", SpecialtyKind::Neurology),
            ("internal", SpecialtyKind::InternalMedicine),
            ("surgery", SpecialtyKind::Surgery),
            ("pediatric", SpecialtyKind::Pediatrics),
        ];
        RULES
            .iter()
            .find(|(kw, _)| s.contains(kw))
            .map(|(_, kind)| *kind)
            .unwrap_or(SpecialtyKind::Other)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecialtyEntry {
    pub hospital: String,
    pub specialty: String,
    pub kind: SpecialtyKind,
}

/// One entry per row: hospital in column 0, specialty in column 1.
pub fn specialty_entries(table: &RawTable) -> Vec<SpecialtyEntry> {
    table
        .rows
        .iter()
        .map(|row| {
            let hospital = non_empty(row.first()).unwrap_or(UNKNOWN_HOSPITAL);
            let specialty = non_empty(row.get(1)).unwrap_or(GENERAL_SPECIALTY);
            SpecialtyEntry {
                hospital: hospital.to_string(),
                specialty: specialty.to_string(),
                kind: SpecialtyKind::classify(specialty),
            }
        })
        .collect()
}

/// Specialties listed under each hospital, both in first-seen order, without repeats.
pub fn specialties_by_hospital(entries: &[SpecialtyEntry]) -> IndexMap<String, Vec<String>> {
    let mut out: IndexMap<String, Vec<String>> = IndexMap::new();
    for e in entries {
        let list = out.entry(e.hospital.clone()).or_default();
        if !list.contains(&e.specialty) {
            list.push(e.specialty.clone());
        }
    }
    out
}

fn non_empty(cell: Option<&String>) -> Option<&str> {
    cell.map(String::as_str).filter(|s| !s.is_empty())
}

#[instrument(level = "info", skip(fetcher, years))]
pub async fn load_birth_deaths(
    fetcher: &Fetcher,
    path: &str,
    years: &[String],
) -> LoadResult<ChartSeries> {
    let table = load_csv(fetcher, path).await?;
    let series = birth_death_series(&table, years);
    info!(rows = table.rows.len(), "birth/death series ready");
    Ok(series)
}

#[instrument(level = "info", skip(fetcher))]
pub async fn load_visitors(fetcher: &Fetcher, path: &str) -> LoadResult<Vec<RankedEntry>> {
    let table = load_csv(fetcher, path).await?;
    let ranked = visitor_ranking(&table).ok_or_else(|| LoadError::MissingColumn {
        path: path.to_string(),
        column: missing_of(&table, &[HOSPITAL_COLUMN, VISITORS_COLUMN]),
    })?;
    info!(hospitals = ranked.len(), "visitor ranking ready");
    Ok(ranked)
}

#[instrument(level = "info", skip(fetcher))]
pub async fn load_beds(fetcher: &Fetcher, path: &str) -> LoadResult<Vec<RankedEntry>> {
    let table = load_csv(fetcher, path).await?;
    let ranked = bed_ranking(&table);
    info!(hospitals = ranked.len(), "bed ranking ready");
    Ok(ranked)
}

#[instrument(level = "info", skip(fetcher))]
pub async fn load_specialties(fetcher: &Fetcher, path: &str) -> LoadResult<Vec<SpecialtyEntry>> {
    let table = load_csv(fetcher, path).await?;
    let entries = specialty_entries(&table);
    info!(entries = entries.len(), "specialties ready");
    Ok(entries)
}

fn missing_of(table: &RawTable, required: &[&str]) -> String {
    required
        .iter()
        .filter(|c| resolve_column(&table.headers, c).is_none())
        .copied()
        .collect::<Vec<_>>()
        .join(", ")
}
