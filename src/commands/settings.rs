use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const SETTINGS_SCHEMA_VERSION: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite,
    Memory,
}

#[derive(Debug, Clone)]
pub struct EffectiveSettings {
    pub storage: StorageBackend,
    pub simulated_latency: Duration,
    pub seed_demo_data: bool,
    pub session_ttl_minutes: u32,
}

impl Default for EffectiveSettings {
    fn default() -> Self {
        settings_from_value(&default_settings())
    }
}

pub async fn get_settings(data_dir: String) -> Result<Value, String> {
    load_settings_from_disk(&data_dir)
}

pub async fn save_settings(data_dir: String, settings: Value) -> Result<Value, String> {
    save_settings_to_disk(&data_dir, settings)
}

pub fn load_effective_settings(data_dir: &str) -> Result<EffectiveSettings, String> {
    let settings = load_settings_from_disk(data_dir)?;
    Ok(settings_from_value(&settings))
}

fn settings_from_value(settings: &Value) -> EffectiveSettings {
    let storage = match settings.get("storage").and_then(Value::as_str) {
        Some("memory") => StorageBackend::Memory,
        _ => StorageBackend::Sqlite,
    };
    let latency_ms = settings
        .get("simulatedLatencyMs")
        .and_then(Value::as_u64)
        .unwrap_or(0)
        .min(5_000);
    let seed_demo_data = settings
        .get("seedDemoData")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    let session_ttl_minutes = settings
        .get("sessionTtlMinutes")
        .and_then(Value::as_u64)
        .unwrap_or(480)
        .clamp(5, 10_080) as u32;

    EffectiveSettings {
        storage,
        simulated_latency: Duration::from_millis(latency_ms),
        seed_demo_data,
        session_ttl_minutes,
    }
}

pub fn load_settings_from_disk(data_dir: &str) -> Result<Value, String> {
    let path = settings_path(data_dir);
    ensure_fundvote_dir(data_dir)?;

    let original = if path.exists() {
        let raw = fs::read_to_string(&path)
            .map_err(|e| format!("Failed to read settings.json: {e}"))?;
        serde_json::from_str::<Value>(&raw).unwrap_or_else(|e| {
            log::warn!("settings.json is not valid JSON ({e}); falling back to defaults");
            json!({})
        })
    } else {
        json!({})
    };

    let migrated = migrate_settings(original.clone());
    if migrated != original || !path.exists() {
        write_settings_file(&path, &migrated)?;
    }

    Ok(migrated)
}

pub fn save_settings_to_disk(data_dir: &str, settings: Value) -> Result<Value, String> {
    let path = settings_path(data_dir);
    ensure_fundvote_dir(data_dir)?;

    let mut merged = load_settings_from_disk(data_dir).unwrap_or_else(|_| default_settings());
    merge_settings(&mut merged, &settings);

    let migrated = migrate_settings(merged);
    write_settings_file(&path, &migrated)?;
    Ok(migrated)
}

fn settings_path(data_dir: &str) -> PathBuf {
    Path::new(data_dir).join(".fundvote").join("settings.json")
}

fn ensure_fundvote_dir(data_dir: &str) -> Result<(), String> {
    let dir = Path::new(data_dir).join(".fundvote");
    fs::create_dir_all(&dir).map_err(|e| format!("Failed to create .fundvote directory: {e}"))
}

fn write_settings_file(path: &Path, settings: &Value) -> Result<(), String> {
    let raw = serde_json::to_string_pretty(settings)
        .map_err(|e| format!("Failed to serialize settings: {e}"))?;
    fs::write(path, raw).map_err(|e| format!("Failed to write settings.json: {e}"))
}

fn migrate_settings(input: Value) -> Value {
    let mut out = match input {
        Value::Object(map) => Value::Object(map),
        _ => Value::Object(Map::new()),
    };

    let version = out
        .get("schema_version")
        .and_then(Value::as_i64)
        .unwrap_or(0);

    if version < 1 {
        migrate_latency_seconds(&mut out);
    }

    if version < 2 {
        // V2 introduces demo seeding and session lifetime.
        ensure_key(&mut out, "seedDemoData", json!(true));
        ensure_key(&mut out, "sessionTtlMinutes", json!(480));
    }

    deep_merge_defaults(&mut out, &default_settings());
    sanitize_settings(&mut out);
    if let Some(obj) = out.as_object_mut() {
        obj.insert("schema_version".to_string(), json!(SETTINGS_SCHEMA_VERSION));
    }

    if version < SETTINGS_SCHEMA_VERSION {
        log::info!("Migrated settings from schema {version} to {SETTINGS_SCHEMA_VERSION}");
    }

    out
}

fn default_settings() -> Value {
    json!({
        "schema_version": SETTINGS_SCHEMA_VERSION,
        "storage": "sqlite",
        "simulatedLatencyMs": 0,
        "seedDemoData": true,
        "sessionTtlMinutes": 480
    })
}

fn deep_merge_defaults(target: &mut Value, defaults: &Value) {
    let (Some(target_obj), Some(default_obj)) = (target.as_object_mut(), defaults.as_object()) else {
        return;
    };

    for (key, default_value) in default_obj {
        match target_obj.get_mut(key) {
            Some(existing) => {
                if existing.is_object() && default_value.is_object() {
                    deep_merge_defaults(existing, default_value);
                }
            }
            None => {
                target_obj.insert(key.clone(), default_value.clone());
            }
        }
    }
}

fn ensure_key(target: &mut Value, key: &str, value: Value) {
    if let Some(obj) = target.as_object_mut() {
        obj.entry(key.to_string()).or_insert(value);
    }
}

fn merge_settings(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(target_obj), Value::Object(incoming_obj)) => {
            for (key, value) in incoming_obj {
                if let Some(existing) = target_obj.get_mut(key) {
                    merge_settings(existing, value);
                } else {
                    target_obj.insert(key.clone(), value.clone());
                }
            }
        }
        (target_slot, incoming_value) => {
            *target_slot = incoming_value.clone();
        }
    }
}

/// Pre-v1 files stored the mock network delay as `latency` in seconds.
fn migrate_latency_seconds(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };
    let Some(seconds) = obj.remove("latency").and_then(|v| v.as_f64()) else {
        return;
    };
    if !obj.contains_key("simulatedLatencyMs") && seconds.is_finite() && seconds >= 0.0 {
        obj.insert(
            "simulatedLatencyMs".to_string(),
            json!((seconds * 1000.0).round() as u64),
        );
    }
}

fn sanitize_settings(settings: &mut Value) {
    let Some(obj) = settings.as_object_mut() else {
        return;
    };

    clamp_u64(obj, "simulatedLatencyMs", 0, 5_000, 0);
    clamp_u64(obj, "sessionTtlMinutes", 5, 10_080, 480);
    sanitize_enum(obj, "storage", &["sqlite", "memory"], "sqlite");
    ensure_bool(obj, "seedDemoData", true);
}

fn clamp_u64(map: &mut Map<String, Value>, key: &str, min: u64, max: u64, default: u64) {
    let raw = map.get(key).and_then(Value::as_u64).unwrap_or(default);
    map.insert(key.to_string(), json!(raw.clamp(min, max)));
}

fn sanitize_enum(map: &mut Map<String, Value>, key: &str, allowed: &[&str], default: &str) {
    let valid = map
        .get(key)
        .and_then(Value::as_str)
        .filter(|value| allowed.contains(value))
        .unwrap_or(default);
    map.insert(key.to_string(), json!(valid));
}

fn ensure_bool(map: &mut Map<String, Value>, key: &str, default: bool) {
    let value = map.get(key).and_then(Value::as_bool).unwrap_or(default);
    map.insert(key.to_string(), json!(value));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrates_legacy_latency_seconds() {
        let migrated = migrate_settings(json!({ "latency": 0.8, "storage": "memory" }));

        assert_eq!(migrated["simulatedLatencyMs"], json!(800));
        assert!(migrated.get("latency").is_none());
        assert_eq!(migrated["storage"], json!("memory"));
        assert_eq!(migrated["seedDemoData"], json!(true));
        assert_eq!(migrated["schema_version"], json!(SETTINGS_SCHEMA_VERSION));
    }

    #[test]
    fn sanitizes_out_of_range_and_unknown_values() {
        let migrated = migrate_settings(json!({
            "schema_version": 2,
            "storage": "postgres",
            "simulatedLatencyMs": 60000,
            "sessionTtlMinutes": 1,
            "seedDemoData": "yes"
        }));

        assert_eq!(migrated["storage"], json!("sqlite"));
        assert_eq!(migrated["simulatedLatencyMs"], json!(5000));
        assert_eq!(migrated["sessionTtlMinutes"], json!(5));
        assert_eq!(migrated["seedDemoData"], json!(true));
    }

    #[test]
    fn merges_partial_settings_without_losing_existing_values() {
        let mut existing = default_settings();
        merge_settings(&mut existing, &json!({ "simulatedLatencyMs": 250 }));
        let migrated = migrate_settings(existing);

        assert_eq!(migrated["simulatedLatencyMs"], json!(250));
        assert_eq!(migrated["sessionTtlMinutes"], json!(480));
        assert_eq!(migrated["storage"], json!("sqlite"));

        let effective = settings_from_value(&migrated);
        assert_eq!(effective.simulated_latency, Duration::from_millis(250));
        assert_eq!(effective.storage, StorageBackend::Sqlite);
    }
}
