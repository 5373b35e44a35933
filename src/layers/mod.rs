// src/layers/mod.rs
pub mod filter;
pub mod geojson;
pub mod popup;

use crate::error::LoadResult;
use crate::fetch::Fetcher;
use filter::{bounds_of, detect_governorate, Bounds, LayerFilter};
use futures::future::join_all;
use geojson::FeatureCollection;
use indexmap::IndexMap;
use popup::Popup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{error, info, instrument, warn};

/// One facility category drawn as its own map layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerMeta {
    pub key: String,
    pub file: String,
    pub color: String,
}

impl LayerMeta {
    fn new(key: &str, file: &str, color: &str) -> Self {
        Self {
            key: key.into(),
            file: file.into(),
            color: color.into(),
        }
    }
}

pub fn default_layers() -> Vec<LayerMeta> {
    vec![
        LayerMeta::new("Blood Banks", "Blood Banks.geojson", "#ff6b6b"),
        LayerMeta::new("Clinics", "Clinic.geojson", "#f59e0b"),
        LayerMeta::new("Diagnostic Center", "Diagnostic Center.geojson", "#22d3ee"),
        LayerMeta::new("Health Centers", "Health Centers.geojson", "#34d399"),
        LayerMeta::new("Health Complex", "Health Complex.geojson", "#a78bfa"),
        LayerMeta::new("Hospital Locations", "Hospital Locations.geojson", "#60a5fa"),
        LayerMeta::new("Pharmacies", "Pharmacies.geojson", "#eab308"),
    ]
}

#[derive(Debug, Clone)]
struct LayerEntry {
    meta: LayerMeta,
    original: FeatureCollection,
}

/// The unfiltered feature collections of every loaded layer, in layer-table
/// order. Filters are always computed from these, so a reset never refetches.
#[derive(Debug, Clone, Default)]
pub struct LayerStore {
    layers: IndexMap<String, LayerEntry>,
}

/// A layer as it should be drawn under a given filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerView {
    pub key: String,
    pub color: String,
    pub visible: bool,
    pub feature_count: usize,
    pub data: FeatureCollection,
    /// Popup HTML for each feature in `data`, same order.
    pub popups: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayerLoadReport {
    pub loaded: usize,
    pub empty: usize,
    pub failed: usize,
}

impl LayerStore {
    pub fn insert(&mut self, meta: LayerMeta, original: FeatureCollection) {
        self.layers
            .insert(meta.key.clone(), LayerEntry { meta, original });
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn original(&self, key: &str) -> Option<&FeatureCollection> {
        self.layers.get(key).map(|e| &e.original)
    }

    pub fn metas(&self) -> impl Iterator<Item = &LayerMeta> {
        self.layers.values().map(|e| &e.meta)
    }

    /// Distinct governorates across every layer, sorted.
    pub fn governorates(&self) -> Vec<String> {
        self.layers
            .values()
            .flat_map(|e| e.original.features.iter())
            .filter_map(detect_governorate)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn apply(&self, filter: &LayerFilter) -> Vec<LayerView> {
        self.layers
            .values()
            .map(|e| {
                let data = filter.apply(&e.original);
                let popups = data
                    .features
                    .iter()
                    .map(|f| Popup::for_feature(f, &e.meta.key).to_html())
                    .collect();
                LayerView {
                    key: e.meta.key.clone(),
                    color: e.meta.color.clone(),
                    visible: filter.shows_layer(&e.meta.key),
                    feature_count: data.features.len(),
                    data,
                    popups,
                }
            })
            .collect()
    }

    pub fn reset(&self) -> Vec<LayerView> {
        self.apply(&LayerFilter::default())
    }
}

/// Bounding box of the visible layers in `views`.
pub fn visible_bounds(views: &[LayerView]) -> Option<Bounds> {
    bounds_of(views.iter().filter(|v| v.visible).map(|v| &v.data))
}

async fn load_layer(
    fetcher: &Fetcher,
    dir: &str,
    meta: &LayerMeta,
) -> LoadResult<FeatureCollection> {
    let path = if dir.is_empty() {
        meta.file.clone()
    } else {
        format!("{}/{}", dir.trim_end_matches('/'), meta.file)
    };
    fetcher.fetch_json(&path).await
}

/// Fetch every layer concurrently. A layer that fails or has no features is
/// logged and left out; the others still load.
#[instrument(level = "info", skip(fetcher, metas), fields(layers = metas.len()))]
pub async fn load_layers(
    fetcher: &Fetcher,
    dir: &str,
    metas: &[LayerMeta],
) -> (LayerStore, LayerLoadReport) {
    let results = join_all(metas.iter().map(|m| load_layer(fetcher, dir, m))).await;

    let mut store = LayerStore::default();
    let mut report = LayerLoadReport::default();
    for (meta, result) in metas.iter().zip(results) {
        match result {
            Ok(fc) if fc.features.is_empty() => {
                warn!(layer = %meta.key, file = %meta.file, "no features");
                report.empty += 1;
            }
            Ok(fc) => {
                info!(layer = %meta.key, features = fc.features.len(), "layer loaded");
                store.insert(meta.clone(), fc);
                report.loaded += 1;
            }
            Err(e) => {
                error!(layer = %meta.key, error = %e, "layer failed");
                report.failed += 1;
            }
        }
    }

    info!(
        loaded = report.loaded,
        empty = report.empty,
        failed = report.failed,
        "layer loading complete"
    );
    if report.loaded == 0 && !metas.is_empty() {
        error!("no layers were loaded");
    }
    (store, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use tempfile::tempdir;

    fn point(gov: &str, lon: f64, lat: f64) -> serde_json::Value {
        json!({
            "type": "Feature",
            "properties": {"name": format!("{gov} site"), "governorate": gov},
            "geometry": {"type": "Point", "coordinates": [lon, lat]}
        })
    }

    fn write_layer(dir: &std::path::Path, file: &str, features: Vec<serde_json::Value>) {
        let fc = json!({"type": "FeatureCollection", "features": features});
        std::fs::write(dir.join(file), fc.to_string()).unwrap();
    }

    #[tokio::test]
    async fn test_load_layers_isolates_failures() {
        let tmp = tempdir().unwrap();
        let data = tmp.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        write_layer(
            &data,
            "Clinic.geojson",
            vec![point("Muscat", 58.4, 23.6), point("Dhofar", 54.1, 17.0)],
        );
        write_layer(&data, "Pharmacies.geojson", vec![point("Muscat", 58.5, 23.5)]);
        write_layer(&data, "Blood Banks.geojson", vec![]);
        std::fs::write(data.join("Health Complex.geojson"), "<html>").unwrap();

        let fetcher = Fetcher::new(
            tmp.path().to_str().unwrap().parse().unwrap(),
            Duration::from_secs(5),
        )
        .unwrap();
        let (store, report) = load_layers(&fetcher, "data", &default_layers()).await;

        assert_eq!(
            report,
            LayerLoadReport {
                loaded: 2,
                empty: 1,
                failed: 4
            }
        );
        assert_eq!(
            store.metas().map(|m| m.key.as_str()).collect::<Vec<_>>(),
            vec!["Clinics", "Pharmacies"]
        );
        assert_eq!(store.governorates(), vec!["Dhofar", "Muscat"]);
    }

    #[test]
    fn test_filter_then_reset_restores_originals() {
        let mut store = LayerStore::default();
        let fc: FeatureCollection = serde_json::from_value(json!({
            "type": "FeatureCollection",
            "features": [point("Muscat", 58.4, 23.6), point("Dhofar", 54.1, 17.0)]
        }))
        .unwrap();
        store.insert(default_layers()[1].clone(), fc.clone());
        store.insert(default_layers()[6].clone(), fc.clone());

        let views = store.apply(&LayerFilter::new(Some("Dhofar".into()), Some("Clinics".into())));
        assert_eq!(views.len(), 2);
        assert!(views[0].visible);
        assert!(!views[1].visible);
        assert_eq!(views[0].feature_count, 1);
        assert_eq!(views[0].popups.len(), 1);
        assert!(views[0].popups[0].contains("Dhofar site"));
        let b = visible_bounds(&views).unwrap();
        assert_eq!((b.west, b.north), (54.1, 17.0));

        let views = store.reset();
        assert!(views.iter().all(|v| v.visible && v.data == fc));
        assert_eq!(store.original("Clinics"), Some(&fc));
    }
}
