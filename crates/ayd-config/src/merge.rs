//! Configuration merging.
//!
//! Configuration files are merged as YAML value trees before being deserialized,
//! so a file only has to mention the keys it overrides.

use serde_yaml::{Mapping, Value};

/// Keys that only steer discovery and never reach the configuration struct.
const DISCOVERY_KEYS: &[&str] = &["root"];

/// Merges `overlay` into `base`.
///
/// Mappings merge key by key, recursively. Any other overlay value replaces the
/// base value outright, so lists are not concatenated. A null overlay leaves the
/// base untouched.
pub fn deep_merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (_, Value::Null) => {}
        (Value::Mapping(base_map), Value::Mapping(overlay_map)) => {
            for (key, value) in overlay_map {
                if key
                    .as_str()
                    .is_some_and(|k| DISCOVERY_KEYS.contains(&k))
                {
                    continue;
                }
                match base_map.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base_map.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Looks up a dotted key such as `model.temperature`.
pub fn get_path<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    key.split('.')
        .try_fold(value, |current, part| current.get(part))
}

/// Sets a dotted key, creating intermediate mappings as needed.
pub fn set_path(value: &mut Value, key: &str, new_value: Value) {
    let mut current = value;
    for part in key.split('.') {
        if !current.is_mapping() {
            *current = Value::Mapping(Mapping::new());
        }
        let Value::Mapping(map) = current else {
            return;
        };
        current = map
            .entry(Value::String(part.to_string()))
            .or_insert(Value::Null);
    }
    *current = new_value;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn test_overlay_wins_for_scalars() {
        let mut base = yaml("model:\n  name: a\n  temperature: 0.1\n");
        deep_merge(&mut base, yaml("model:\n  name: b\n"));
        assert_eq!(base, yaml("model:\n  name: b\n  temperature: 0.1\n"));
    }

    #[test]
    fn test_new_sections_are_added() {
        let mut base = yaml("model:\n  name: a\n");
        deep_merge(&mut base, yaml("retrieval:\n  top_k: 3\n"));
        assert_eq!(get_path(&base, "retrieval.top_k"), Some(&Value::from(3)));
        assert_eq!(get_path(&base, "model.name"), Some(&Value::from("a")));
    }

    #[test]
    fn test_lists_replace() {
        let mut base = yaml("ingestion:\n  exclude_patterns: [a, b]\n");
        deep_merge(&mut base, yaml("ingestion:\n  exclude_patterns: [c]\n"));
        assert_eq!(
            get_path(&base, "ingestion.exclude_patterns"),
            Some(&yaml("[c]"))
        );
    }

    #[test]
    fn test_null_overlay_is_ignored() {
        let mut base = yaml("model:\n  name: a\n");
        deep_merge(&mut base, Value::Null);
        assert_eq!(base, yaml("model:\n  name: a\n"));
    }

    #[test]
    fn test_root_key_is_dropped() {
        let mut base = yaml("model:\n  name: a\n");
        deep_merge(&mut base, yaml("root: true\n"));
        assert!(base.get("root").is_none());
    }

    #[test]
    fn test_set_path_creates_parents() {
        let mut value = Value::Null;
        set_path(&mut value, "chunking.respect_boundaries", Value::Bool(false));
        assert_eq!(
            get_path(&value, "chunking.respect_boundaries"),
            Some(&Value::Bool(false))
        );
    }

    #[test]
    fn test_get_path_missing() {
        let value = yaml("model:\n  name: a\n");
        assert!(get_path(&value, "model.nope").is_none());
        assert!(get_path(&value, "nope.name").is_none());
    }
}
