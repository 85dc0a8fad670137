//! Loosely typed property bags passed from descriptors to renderers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A JSON object of component properties.
///
/// Overlays are shallow: a key present on the right side replaces the whole
/// value on the left side, nested objects are not merged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Props(Map<String, Value>);

impl Props {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builds props from a JSON value. Anything but an object yields empty props.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self(map),
            _ => Self::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(Value::as_u64)
    }

    pub fn f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn strings(&self, key: &str) -> Vec<String> {
        self.get(key)
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Copies every field of `other` over `self`.
    pub fn overlay(&mut self, other: Props) {
        for (key, value) in other.0 {
            self.0.insert(key, value);
        }
    }

    pub fn overlaid(mut self, other: Props) -> Self {
        self.overlay(other);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for Props {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl FromIterator<(String, Value)> for Props {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn overlay_replaces_whole_fields() {
        let base = Props::from_value(json!({
            "open": false,
            "visibleChild": "thumbnails",
            "style": {"width": 10, "height": 2}
        }));
        let patch = Props::from_value(json!({"open": true, "style": {"width": 20}}));

        let merged = base.overlaid(patch);
        assert_eq!(merged.bool("open"), Some(true));
        assert_eq!(merged.str("visibleChild"), Some("thumbnails"));
        assert_eq!(merged.get("style"), Some(&json!({"width": 20})));
    }

    #[test]
    fn non_objects_become_empty_props() {
        assert!(Props::from_value(json!([1, 2, 3])).is_empty());
        assert!(Props::from_value(Value::Null).is_empty());
    }

    #[test]
    fn typed_getters_ignore_mismatched_values() {
        let props = Props::new()
            .with("label", "Zoom")
            .with("count", 3)
            .with("children", json!(["a", 1, "b"]));
        assert_eq!(props.str("label"), Some("Zoom"));
        assert_eq!(props.bool("label"), None);
        assert_eq!(props.u64("count"), Some(3));
        assert_eq!(props.strings("children"), vec!["a", "b"]);
        assert!(props.strings("missing").is_empty());
    }
}
