use toml::{Value, map::Map};

/// Merges imported configs in order, then lays `main` on top
pub(super) fn merge_toml_configs(imports: Vec<Value>, main: Value) -> Value {
    let mut accumulated = Value::Table(Map::new());

    for import in imports {
        accumulated = merge_two_toml_configs(accumulated, import);
    }

    merge_two_toml_configs(accumulated, main)
}

/// Deep merge where `overlay` wins. Tables merge key by key; any other
/// value in `overlay` replaces the one in `base` outright, arrays included.
fn merge_two_toml_configs(base: Value, overlay: Value) -> Value {
    match (base, overlay) {
        (Value::Table(base_table), Value::Table(overlay_table)) => {
            let mut merged_table = overlay_table;

            for (key, base_value) in base_table {
                let merged_value = match merged_table.remove(&key) {
                    None => base_value,
                    Some(overlay_value) => merge_two_toml_configs(base_value, overlay_value),
                };
                merged_table.insert(key, merged_value);
            }

            Value::Table(merged_table)
        }
        (_, overlay) => overlay,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn main_values_win_and_missing_keys_are_kept() {
        let import: Value = toml::from_str(
            r#"
            [general]
            log_level = "debug"
            [media]
            denylist = ["A.exe"]
            "#,
        )
        .unwrap();
        let main: Value = toml::from_str(
            r#"
            [general]
            log_level = "warn"
            "#,
        )
        .unwrap();

        let merged = merge_toml_configs(vec![import], main);

        assert_eq!(merged["general"]["log_level"].as_str(), Some("warn"));
        assert_eq!(merged["media"]["denylist"][0].as_str(), Some("A.exe"));
    }

    #[test]
    fn later_imports_override_earlier_ones() {
        let first: Value = toml::from_str(r#"media = { denylist = ["A.exe"] }"#).unwrap();
        let second: Value = toml::from_str(r#"media = { denylist = ["B.exe"] }"#).unwrap();

        let merged = merge_toml_configs(vec![first, second], Value::Table(Map::new()));

        assert_eq!(merged["media"]["denylist"][0].as_str(), Some("B.exe"));
        assert_eq!(merged["media"]["denylist"].as_array().map(Vec::len), Some(1));
    }
}
