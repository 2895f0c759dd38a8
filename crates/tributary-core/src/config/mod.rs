use serde_json::{Map, Value, json};

/// JSON-valued chart configuration addressed by dotted paths (`sankey.nodeWidth`).
///
/// Sites layer their overrides on top of [`FlowConfig::defaults`] with
/// [`FlowConfig::deep_merge`]; typed option structs read the merged value.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowConfig(Value);

impl Default for FlowConfig {
    fn default() -> Self {
        Self::defaults()
    }
}

impl FlowConfig {
    pub fn empty_object() -> Self {
        Self(Value::Object(Map::new()))
    }

    /// Built-in defaults for every recognized `sankey.*` key.
    pub fn defaults() -> Self {
        Self(json!({
            "sankey": {
                "width": 600.0,
                "height": 400.0,
                "nodeWidth": 15.0,
                "nodePadding": 10.0,
                "nodeAlignment": "justify",
                "iterations": 6,
                "linkColor": "gradient",
                "showValues": true,
                "interval": "asGiven",
                "palette": "category10",
            }
        }))
    }

    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        Ok(Self(serde_json::from_str(text)?))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn get(&self, dotted_path: &str) -> Option<&Value> {
        dotted_path
            .split('.')
            .try_fold(&self.0, |cur, key| cur.as_object()?.get(key))
    }

    pub fn get_str(&self, dotted_path: &str) -> Option<&str> {
        self.get(dotted_path)?.as_str()
    }

    pub fn get_bool(&self, dotted_path: &str) -> Option<bool> {
        self.get(dotted_path)?.as_bool()
    }

    pub fn get_f64(&self, dotted_path: &str) -> Option<f64> {
        self.get(dotted_path)?.as_f64()
    }

    /// Sets a leaf, replacing any non-object value met along the path.
    pub fn set_value(&mut self, dotted_path: &str, value: Value) {
        set_path(&mut self.0, dotted_path, value);
    }

    /// Objects merge key by key; any other incoming value replaces the current one.
    pub fn deep_merge(&mut self, overrides: &Value) {
        merge_into(&mut self.0, overrides);
    }
}

fn set_path(target: &mut Value, path: &str, value: Value) {
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    let Value::Object(map) = target else {
        return;
    };
    match path.split_once('.') {
        None => {
            map.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let child = map.entry(head).or_insert(Value::Null);
            set_path(child, rest, value);
        }
    }
}

fn merge_into(target: &mut Value, overrides: &Value) {
    if let (Some(dst), Some(src)) = (target.as_object_mut(), overrides.as_object()) {
        for (key, incoming) in src {
            if let Some(existing) = dst.get_mut(key) {
                merge_into(existing, incoming);
            } else {
                dst.insert(key.clone(), incoming.clone());
            }
        }
        return;
    }
    *target = overrides.clone();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_expose_sankey_keys() {
        let cfg = FlowConfig::defaults();
        assert_eq!(cfg.get_f64("sankey.nodeWidth"), Some(15.0));
        assert_eq!(cfg.get_str("sankey.linkColor"), Some("gradient"));
        assert_eq!(cfg.get_bool("sankey.showValues"), Some(true));
        assert_eq!(cfg.get_str("sankey.missing"), None);
    }

    #[test]
    fn deep_merge_overrides_leaves_and_keeps_siblings() {
        let mut cfg = FlowConfig::defaults();
        cfg.deep_merge(&json!({"sankey": {"nodeAlignment": "left", "units": "EUR"}}));
        assert_eq!(cfg.get_str("sankey.nodeAlignment"), Some("left"));
        assert_eq!(cfg.get_str("sankey.units"), Some("EUR"));
        assert_eq!(cfg.get_f64("sankey.nodePadding"), Some(10.0));
    }

    #[test]
    fn set_value_creates_intermediate_objects() {
        let mut cfg = FlowConfig::from_value(json!(42));
        cfg.set_value("sankey.height", json!(300));
        assert_eq!(cfg.get_f64("sankey.height"), Some(300.0));
    }
}
