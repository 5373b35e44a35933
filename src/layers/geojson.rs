use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn feature_collection_type() -> String {
    "FeatureCollection".to_string()
}

fn feature_type() -> String {
    "Feature".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        Self {
            kind: feature_collection_type(),
            features,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl Feature {
    /// Display text of property `key`, if present and not blank.
    pub fn prop(&self, key: &str) -> Option<String> {
        self.properties.as_ref()?.get(key).and_then(value_text)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

/// Trimmed display text for a property value. Null, `false`, zero and blank
/// strings count as absent.
pub fn value_text(v: &Value) -> Option<String> {
    let text = match v {
        Value::Null | Value::Bool(false) => return None,
        Value::Number(n) if n.as_f64() == Some(0.0) => return None,
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}
