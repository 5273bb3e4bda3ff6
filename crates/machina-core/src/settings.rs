//! Runtime settings as plugins see them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use std::collections::BTreeMap;

/// Flat, dotted-key settings map shared with every plugin.
///
/// The runtime's configuration layer flattens its `settings` section into
/// this shape, so a TOML table `[settings.greeting]` with `language = "en"`
/// is visible here as `greeting.language`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Settings(BTreeMap<String, Value>);

impl Settings {
    /// Empty settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is present.
    pub fn has(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// String value for `key`, if present and a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Sets `key`, replacing any earlier value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    /// The subset of `keys` not present here, in the order given.
    pub fn missing_keys<'k>(&self, keys: &'k [String]) -> Vec<&'k str> {
        keys.iter()
            .filter(|key| !self.has(key))
            .map(String::as_str)
            .collect()
    }

    /// Iterates entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, Value)> for Settings {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_keys_preserves_declaration_order() {
        let mut settings = Settings::new();
        settings.set("greeting.language", "en");

        let required = vec![
            "weather.api_key".to_string(),
            "greeting.language".to_string(),
            "weather.city".to_string(),
        ];
        assert_eq!(settings.missing_keys(&required), vec!["weather.api_key", "weather.city"]);
    }

    #[test]
    fn typed_accessors() {
        let mut settings = Settings::new();
        settings.set("retries", json!(3));
        settings.set("name", "machina");

        assert_eq!(settings.get_str("name"), Some("machina"));
        assert_eq!(settings.get_str("retries"), None);
        assert_eq!(settings.get("retries"), Some(&json!(3)));
        assert!(!settings.has("absent"));
    }
}
