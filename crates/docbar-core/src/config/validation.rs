//! Config validation - warns about unknown fields

use serde_json::Value;
use std::collections::{HashMap, HashSet};
use tracing::warn;

/// Validate JSON config and warn about unknown fields.
pub fn warn_unknown_fields(content: &str, config_name: &str) {
    let Ok(value) = serde_json::from_str::<Value>(content) else {
        return;
    };

    let expected = expected_config_keys();
    for path in find_unknown_keys(&value, &expected, "") {
        warn!("Unknown config field in {config_name}: {path}");
    }
}

/// Find unknown keys in JSON value compared to expected keys.
/// Returns paths like "search.unknownField" for unknown fields.
fn find_unknown_keys(value: &Value, expected: &ExpectedKeys, prefix: &str) -> Vec<String> {
    let mut unknowns = Vec::new();

    let Value::Object(obj) = value else {
        return unknowns;
    };

    for (key, child) in obj {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };

        if let Some(nested) = expected.nested.get(key.as_str()) {
            unknowns.extend(find_unknown_keys(child, nested, &path));
        } else if !expected.fields.contains(key.as_str()) {
            unknowns.push(path);
        }
    }

    unknowns
}

/// Expected keys for a config section.
/// `fields` are leaf fields, `nested` are nested objects with their own expected keys.
struct ExpectedKeys {
    fields: HashSet<&'static str>,
    nested: HashMap<&'static str, ExpectedKeys>,
}

impl ExpectedKeys {
    fn new(fields: &[&'static str]) -> Self {
        Self {
            fields: fields.iter().copied().collect(),
            nested: HashMap::new(),
        }
    }

    fn with_nested(mut self, key: &'static str, nested: ExpectedKeys) -> Self {
        self.nested.insert(key, nested);
        self
    }
}

/// Expected keys for `Config` (settings.rs)
fn expected_config_keys() -> ExpectedKeys {
    let daemon_keys = ExpectedKeys::new(&[
        "service",
        "path",
        "interface",
        "wireShape",
        "engine",
        "scope",
    ]);

    let search_keys = ExpectedKeys::new(&["maxResults", "debounceMs", "replyTimeoutMs"]);

    let display_keys = ExpectedKeys::new(&["snippetMaxChars", "tildeHome"]);

    ExpectedKeys::new(&[])
        .with_nested("daemon", daemon_keys)
        .with_nested("search", search_keys)
        .with_nested("display", display_keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unknowns_in(json: &str) -> Vec<String> {
        let value: Value = serde_json::from_str(json).unwrap();
        find_unknown_keys(&value, &expected_config_keys(), "")
    }

    #[test]
    fn test_valid_config_no_warnings() {
        let unknowns = unknowns_in(
            r#"{
                "daemon": {
                    "service": "de.berlios.Pinot",
                    "wireShape": "embedded"
                },
                "search": {
                    "maxResults": 20,
                    "debounceMs": 300
                },
                "display": {
                    "tildeHome": false
                }
            }"#,
        );

        assert!(
            unknowns.is_empty(),
            "Expected no unknowns, got: {unknowns:?}"
        );
    }

    #[test]
    fn test_unknown_top_level_field() {
        let unknowns = unknowns_in(r#"{"search": {}, "unknownSection": {}}"#);
        assert_eq!(unknowns, vec!["unknownSection"]);
    }

    #[test]
    fn test_unknown_nested_field() {
        let unknowns = unknowns_in(r#"{"daemon": {"service": "x", "typoField": 1}}"#);
        assert_eq!(unknowns, vec!["daemon.typoField"]);
    }

    #[test]
    fn test_multiple_unknown_fields() {
        let unknowns = unknowns_in(
            r#"{
                "search": {"typo1": 1, "typo2": 2},
                "badSection": {}
            }"#,
        );

        assert!(unknowns.contains(&"search.typo1".to_string()));
        assert!(unknowns.contains(&"search.typo2".to_string()));
        assert!(unknowns.contains(&"badSection".to_string()));
    }

    #[test]
    fn test_non_object_section_is_not_descended() {
        let unknowns = unknowns_in(r#"{"search": 5}"#);
        assert!(unknowns.is_empty());
    }

    #[test]
    fn test_warn_unknown_fields_does_not_panic_on_invalid_json() {
        warn_unknown_fields("not valid json", "test");
        warn_unknown_fields(r#"{"search": {}}"#, "test");
    }

    #[test]
    fn test_empty_config_no_warnings() {
        assert!(unknowns_in("{}").is_empty());
    }
}
