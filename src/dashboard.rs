// src/dashboard.rs
//! Loads every feed of the dashboard at once and owns the results.

use crate::config::DashboardConfig;
use crate::error::LoadResult;
use crate::feeds::{self, ChartSeries, SpecialtyEntry};
use crate::fetch::Fetcher;
use crate::layers::{
    filter::{Bounds, LayerFilter},
    load_layers, visible_bounds, LayerLoadReport, LayerStore, LayerView,
};
use crate::process::rank::RankedEntry;
use anyhow::Result;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::Serialize;
use std::io::Write;
use tokio::time::Instant;
use tracing::{error, info, instrument};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedFailure {
    pub feed: String,
    pub error: String,
}

/// Chart data from one load cycle. A feed that failed leaves its series empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Charts {
    pub birth_death: ChartSeries,
    pub visitors: ChartSeries,
    pub beds: ChartSeries,
    pub specialties: Vec<SpecialtyEntry>,
    pub specialties_by_hospital: IndexMap<String, Vec<String>>,
}

/// Everything one refresh produced.
#[derive(Debug, Clone, Default)]
pub struct DashboardData {
    pub charts: Charts,
    pub layers: LayerStore,
    pub layer_report: LayerLoadReport,
    pub failures: Vec<FeedFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    pub generated_at: DateTime<Utc>,
    pub charts: Charts,
    pub governorates: Vec<String>,
    pub layers: Vec<LayerView>,
    pub bounds: Option<Bounds>,
    pub layer_report: LayerLoadReport,
    pub failures: Vec<FeedFailure>,
}

pub struct Dashboard {
    config: DashboardConfig,
    fetcher: Fetcher,
}

impl Dashboard {
    pub fn new(config: DashboardConfig) -> LoadResult<Self> {
        let fetcher = Fetcher::new(config.data_source()?, config.timeout())?;
        Ok(Self { config, fetcher })
    }

    /// Run every chart feed and the layer load concurrently. Failures are
    /// logged and recorded per feed; they never stop the other feeds.
    #[instrument(level = "info", skip(self), fields(source = %self.fetcher.source()))]
    pub async fn load(&self) -> DashboardData {
        let start = Instant::now();
        let cfg = &self.config;
        let f = &self.fetcher;

        let (birth_death, visitors, beds, specialties, (layers, layer_report)) = tokio::join!(
            feeds::load_birth_deaths(f, &cfg.feeds.birth_death, &cfg.years),
            feeds::load_visitors(f, &cfg.feeds.visitors),
            feeds::load_beds(f, &cfg.feeds.beds),
            feeds::load_specialties(f, &cfg.feeds.specialties),
            load_layers(f, &cfg.layer_dir, &cfg.layers),
        );

        let mut failures = Vec::new();
        let birth_death = degrade("birth_death", birth_death, &mut failures);
        let visitors: Vec<RankedEntry> = degrade("visitors", visitors, &mut failures);
        let beds: Vec<RankedEntry> = degrade("beds", beds, &mut failures);
        let specialties: Vec<SpecialtyEntry> = degrade("specialties", specialties, &mut failures);

        let charts = Charts {
            birth_death,
            visitors: ChartSeries::from_ranked("Visitors", &visitors),
            beds: ChartSeries::from_ranked("Beds", &beds),
            specialties_by_hospital: feeds::specialties_by_hospital(&specialties),
            specialties,
        };

        info!(
            elapsed = ?start.elapsed(),
            failed_feeds = failures.len(),
            layers = layers.len(),
            "dashboard loaded"
        );
        DashboardData {
            charts,
            layers,
            layer_report,
            failures,
        }
    }
}

/// Keep a feed's value, or log the failure and fall back to an empty value.
fn degrade<T: Default>(feed: &str, result: LoadResult<T>, failures: &mut Vec<FeedFailure>) -> T {
    match result {
        Ok(v) => v,
        Err(e) => {
            error!(feed, error = %e, "feed failed; leaving it empty");
            failures.push(FeedFailure {
                feed: feed.to_string(),
                error: e.to_string(),
            });
            T::default()
        }
    }
}

impl DashboardData {
    pub fn snapshot(&self, filter: &LayerFilter) -> Snapshot {
        let layers = self.layers.apply(filter);
        Snapshot {
            generated_at: Utc::now(),
            charts: self.charts.clone(),
            governorates: self.layers.governorates(),
            bounds: visible_bounds(&layers),
            layers,
            layer_report: self.layer_report.clone(),
            failures: self.failures.clone(),
        }
    }
}

impl Snapshot {
    pub fn write_json<W: Write>(&self, out: W) -> Result<()> {
        serde_json::to_writer_pretty(out, self)?;
        Ok(())
    }

    /// Chart series as long-format CSV: `chart,label,dataset,value`.
    pub fn write_csv<W: Write>(&self, out: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(["chart", "label", "dataset", "value"])?;
        let charts = [
            ("birth_death", &self.charts.birth_death),
            ("visitors", &self.charts.visitors),
            ("beds", &self.charts.beds),
        ];
        for (name, series) in charts {
            for ds in &series.datasets {
                for (label, value) in series.labels.iter().zip(&ds.values) {
                    let value = value.to_string();
                    wtr.write_record([name, label.as_str(), ds.label.as_str(), value.as_str()])?;
                }
            }
        }
        wtr.flush()?;
        Ok(())
    }
}
