//! Best-effort JSON persistence for the bot's small on-disk collections.
//!
//! Every collection (role sets, waypoints, the pending-promotion marker) is a
//! single JSON file that is rewritten whole on each mutation. In-memory state
//! is the source of truth: a missing or unreadable file degrades to an empty
//! collection, and a failed write is logged and swallowed.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::warn;

/// Load a JSON value from `path`, falling back to the type's default.
/// The caller never sees an error; parse and read failures are logged.
pub fn load_or_default<T: DeserializeOwned + Default>(path: &Path, what: &str) -> T {
    if !path.exists() {
        return T::default();
    }
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(value) => value,
            Err(e) => {
                warn!(file = %path.display(), error = %e, "failed to parse {}, starting empty", what);
                T::default()
            }
        },
        Err(e) => {
            warn!(file = %path.display(), error = %e, "failed to read {}, starting empty", what);
            T::default()
        }
    }
}

/// Overwrite `path` with the JSON serialization of `value`. Write failures
/// are logged and swallowed; the in-memory collection stays authoritative.
pub fn save<T: Serialize>(path: &Path, value: &T, what: &str) {
    match serde_json::to_string_pretty(value) {
        Ok(data) => {
            if let Err(e) = fs::write(path, data) {
                warn!(file = %path.display(), error = %e, "failed to save {}", what);
            }
        }
        Err(e) => {
            warn!(file = %path.display(), error = %e, "failed to serialize {}", what);
        }
    }
}

/// Delete a marker file. A file that is already gone is not an error.
pub fn remove(path: &Path, what: &str) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!(file = %path.display(), error = %e, "failed to remove {}", what);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet};
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let loaded: HashSet<String> = load_or_default(&dir.path().join("absent.json"), "test set");
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_round_trip_set() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ids.json");
        let mut ids = HashSet::new();
        ids.insert("user_1".to_string());
        ids.insert("user_2".to_string());

        save(&path, &ids, "test set");
        let loaded: HashSet<String> = load_or_default(&path, "test set");
        assert_eq!(loaded, ids);
    }

    #[test]
    fn test_round_trip_empty_map() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.json");
        let empty: HashMap<String, f64> = HashMap::new();

        save(&path, &empty, "test map");
        let loaded: HashMap<String, f64> = load_or_default(&path, "test map");
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_corrupt_file_degrades_to_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "not valid json {[}").unwrap();

        let loaded: HashMap<String, String> = load_or_default(&path, "test map");
        assert!(loaded.is_empty());
    }

    #[test]
    fn test_save_overwrites_whole_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ids.json");

        let mut ids = HashSet::new();
        ids.insert("a".to_string());
        ids.insert("b".to_string());
        save(&path, &ids, "test set");

        ids.remove("a");
        save(&path, &ids, "test set");

        let loaded: HashSet<String> = load_or_default(&path, "test set");
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains("b"));
    }

    #[test]
    fn test_remove_missing_is_silent() {
        let dir = tempdir().unwrap();
        remove(&dir.path().join("never-existed.json"), "marker");
    }
}
