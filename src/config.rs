use crate::error::{LoadError, LoadResult};
use crate::fetch::DataSource;
use crate::layers::{default_layers, LayerMeta};
use serde::{Deserialize, Serialize};
use std::{path::Path, time::Duration};

/// Relative paths of the CSV feeds behind each chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedPaths {
    pub birth_death: String,
    pub visitors: String,
    pub beds: String,
    pub specialties: String,
}

impl Default for FeedPaths {
    fn default() -> Self {
        Self {
            birth_death: "data/Birth Death.csv".into(),
            visitors: "data/Vistor.csv".into(),
            beds: "data/Bed.csv".into(),
            specialties: "data/Specialties.csv".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    /// Base URL of the static file server, or a local directory.
    pub source: String,
    pub timeout_secs: u64,
    /// Year labels for the birth/death chart.
    pub years: Vec<String>,
    pub feeds: FeedPaths,
    /// Directory (relative to `source`) holding the GeoJSON layers.
    pub layer_dir: String,
    pub layers: Vec<LayerMeta>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            source: ".".into(),
            timeout_secs: 30,
            years: vec!["2022".into(), "2023".into(), "2024".into()],
            feeds: FeedPaths::default(),
            layer_dir: "data".into(),
            layers: default_layers(),
        }
    }
}

impl DashboardConfig {
    pub fn from_yaml_str(s: &str) -> LoadResult<Self> {
        serde_yaml::from_str(s).map_err(|e| LoadError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> LoadResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| LoadError::Config(format!("reading {}: {e}", path.display())))?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml(&self) -> LoadResult<String> {
        serde_yaml::to_string(self).map_err(|e| LoadError::Config(e.to_string()))
    }

    pub fn data_source(&self) -> LoadResult<DataSource> {
        self.source.parse()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
