use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

/// Bot configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Identifier of the room the bot joins
    pub room_id: String,

    /// Base URL of the room platform API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Directory holding the persisted JSON collections
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Greet users on join and wave them off on leave
    #[serde(default = "default_greet")]
    pub greet_on_join: bool,

    /// Seconds the event long-poll is allowed to wait server-side
    #[serde(default = "default_poll_wait")]
    pub event_poll_wait_secs: u64,

    /// Seconds between housekeeping log lines
    #[serde(default = "default_housekeeping")]
    pub housekeeping_interval_secs: u64,
}

fn default_api_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_greet() -> bool {
    true
}

fn default_poll_wait() -> u64 {
    30
}

fn default_housekeeping() -> u64 {
    60
}

impl Config {
    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        info!(room_id = %config.room_id, api_url = %config.api_url, "configuration loaded");
        Ok(config)
    }

    /// Create default configuration for a room
    pub fn default_for_room(room_id: String) -> Self {
        Self {
            room_id,
            api_url: default_api_url(),
            data_dir: default_data_dir(),
            greet_on_join: true,
            event_poll_wait_secs: default_poll_wait(),
            housekeeping_interval_secs: default_housekeeping(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_for_room() {
        let config = Config::default_for_room("room_42".to_string());
        assert_eq!(config.room_id, "room_42");
        assert_eq!(config.data_dir, PathBuf::from("."));
        assert!(config.greet_on_join);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str(r#"room_id = "room_7""#).unwrap();
        assert_eq!(config.room_id, "room_7");
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.event_poll_wait_secs, 30);
    }

    #[test]
    fn test_parse_full_toml() {
        let config: Config = toml::from_str(
            r#"
            room_id = "room_7"
            api_url = "https://rooms.example.net/api"
            data_dir = "/var/lib/roombot"
            greet_on_join = false
            event_poll_wait_secs = 10
            housekeeping_interval_secs = 120
            "#,
        )
        .unwrap();
        assert_eq!(config.api_url, "https://rooms.example.net/api");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/roombot"));
        assert!(!config.greet_on_join);
        assert_eq!(config.housekeeping_interval_secs, 120);
    }
}
