use super::geojson::{value_text, Feature, FeatureCollection};
use serde::Serialize;
use serde_json::Value;

/// Property keys checked, in order, before falling back to a key scan.
const GOVERNORATE_KEYS: &[&str] = &[
    "governorate",
    "Governorate",
    "muhafazah",
    "Muhafazah",
    "region",
    "Region",
    "REGION",
    "GOVERNORATE",
    "Gov",
    "GOV",
    "Governorate_Name",
    "GOV_NAME",
    "gov_name",
    "name_en_gov",
];

const GOVERNORATE_HINTS: &[&str] = &["govern", "muhaf", "region"];

/// The governorate a facility belongs to, or `None` when no property names one.
pub fn detect_governorate(feature: &Feature) -> Option<String> {
    let props = feature.properties.as_ref()?;
    if let Some(found) = GOVERNORATE_KEYS
        .iter()
        .find_map(|k| props.get(*k).and_then(value_text))
    {
        return Some(found);
    }
    props.iter().find_map(|(k, v)| {
        let lk = k.to_lowercase();
        if GOVERNORATE_HINTS.iter().any(|h| lk.contains(h)) {
            value_text(v)
        } else {
            None
        }
    })
}

/// The two facets of the facility map. `None` on either facet means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerFilter {
    pub governorate: Option<String>,
    pub facility: Option<String>,
}

impl LayerFilter {
    pub fn new(governorate: Option<String>, facility: Option<String>) -> Self {
        let blank_to_none = |s: Option<String>| s.filter(|v| !v.trim().is_empty());
        Self {
            governorate: blank_to_none(governorate),
            facility: blank_to_none(facility),
        }
    }

    pub fn shows_layer(&self, key: &str) -> bool {
        self.facility.as_deref().map_or(true, |f| f == key)
    }

    pub fn keeps(&self, feature: &Feature) -> bool {
        match &self.governorate {
            None => true,
            Some(gov) => detect_governorate(feature).as_deref() == Some(gov.as_str()),
        }
    }

    /// Features of `base` that pass the governorate facet.
    pub fn apply(&self, base: &FeatureCollection) -> FeatureCollection {
        match self.governorate {
            None => base.clone(),
            Some(_) => FeatureCollection::new(
                base.features
                    .iter()
                    .filter(|f| self.keeps(f))
                    .cloned()
                    .collect(),
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl Bounds {
    fn point(lon: f64, lat: f64) -> Self {
        Self {
            west: lon,
            south: lat,
            east: lon,
            north: lat,
        }
    }

    fn extend(&mut self, lon: f64, lat: f64) {
        self.west = self.west.min(lon);
        self.east = self.east.max(lon);
        self.south = self.south.min(lat);
        self.north = self.north.max(lat);
    }
}

/// Grow `bounds` by every position inside a GeoJSON `coordinates` value,
/// whatever its nesting depth.
pub fn extend_bounds(bounds: &mut Option<Bounds>, coords: &Value) {
    let Some(items) = coords.as_array() else {
        return;
    };
    match items.first() {
        Some(Value::Number(_)) => {
            if let (Some(lon), Some(lat)) = (
                items.first().and_then(Value::as_f64),
                items.get(1).and_then(Value::as_f64),
            ) {
                let next = match *bounds {
                    Some(mut b) => {
                        b.extend(lon, lat);
                        b
                    }
                    None => Bounds::point(lon, lat),
                };
                *bounds = Some(next);
            }
        }
        _ => items.iter().for_each(|c| extend_bounds(bounds, c)),
    }
}

/// Bounding box over the geometries of `collections`; `None` if there is none.
pub fn bounds_of<'a>(
    collections: impl IntoIterator<Item = &'a FeatureCollection>,
) -> Option<Bounds> {
    let mut bounds = None;
    for fc in collections {
        for g in fc.features.iter().filter_map(|f| f.geometry.as_ref()) {
            extend_bounds(&mut bounds, &g.coordinates);
        }
    }
    bounds
}
