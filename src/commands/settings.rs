use crate::db::Database;
use std::collections::BTreeMap;

pub const API_KEY: &str = "api_key";
pub const BASE_URL: &str = "base_url";
pub const MODEL: &str = "model";

const SETTING_KEYS: &[&str] = &[API_KEY, BASE_URL, MODEL];

pub fn get_settings(db: &Database) -> Result<BTreeMap<String, String>, String> {
    let mut map = BTreeMap::new();
    for key in SETTING_KEYS {
        if let Some(value) = db.get_setting(key).map_err(|e| e.to_string())? {
            if *key == API_KEY {
                map.insert(key.to_string(), mask_secret(&value));
            } else {
                map.insert(key.to_string(), value);
            }
        }
    }
    Ok(map)
}

pub fn set_setting(db: &Database, key: &str, value: &str) -> Result<(), String> {
    check_key(key)?;
    if value.trim().is_empty() {
        return Err(format!("Value for {} must not be empty", key));
    }
    db.set_setting(key, value.trim()).map_err(|e| e.to_string())?;
    tracing::info!(key, "setting updated");
    Ok(())
}

pub fn delete_setting(db: &Database, key: &str) -> Result<bool, String> {
    check_key(key)?;
    db.delete_setting(key).map_err(|e| e.to_string())
}

fn check_key(key: &str) -> Result<(), String> {
    if SETTING_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(format!(
            "Unknown setting key: {} (expected one of: {})",
            key,
            SETTING_KEYS.join(", ")
        ))
    }
}

/// Mask API keys for display.
fn mask_secret(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "*".repeat(chars.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("sk-or-v1-0123456789abcdef"), "sk-o...cdef");
        assert_eq!(mask_secret("short"), "*****");
    }

    #[test]
    fn test_listing_masks_api_key_only() {
        let db = Database::in_memory().unwrap();
        set_setting(&db, API_KEY, "sk-or-v1-0123456789abcdef").unwrap();
        set_setting(&db, MODEL, "  google/gemini-pro ").unwrap();

        let settings = get_settings(&db).unwrap();
        assert_eq!(settings.get(API_KEY).map(String::as_str), Some("sk-o...cdef"));
        assert_eq!(settings.get(MODEL).map(String::as_str), Some("google/gemini-pro"));
        assert!(!settings.contains_key(BASE_URL));
    }

    #[test]
    fn test_rejects_unknown_key_and_blank_value() {
        let db = Database::in_memory().unwrap();
        assert!(set_setting(&db, "theme", "dark").unwrap_err().contains("Unknown setting key"));
        assert!(set_setting(&db, MODEL, "   ").is_err());
        assert!(delete_setting(&db, "theme").is_err());
        assert!(!delete_setting(&db, MODEL).unwrap());
    }
}
