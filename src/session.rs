//! Room session collaborator surface.
//!
//! `RoomSession` is the seam between the bot and the hosting platform: chat,
//! whispers, emotes, teleports, outfit mutation, and the web item catalog.
//! The production implementation is `api::RoomApiClient`; tests substitute an
//! in-memory fake.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::waypoints::Position;

/// A user as reported by the room roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Stable platform-assigned account identifier. The only key used for
    /// role membership; display names are mutable.
    pub id: String,
    pub username: String,
}

/// Where a user stands in the room: a literal coordinate, or a seat/anchor
/// slot that carries no coordinate of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Placement {
    Point(Position),
    Anchor { anchor_id: String },
}

/// A clothing item as worn or held in inventory. The category is encoded in
/// the id prefix (`shirt-n_basic2018` → `shirt`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutfitItem {
    pub id: String,
    #[serde(default)]
    pub active_palette: u32,
}

impl OutfitItem {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            active_palette: 0,
        }
    }

    pub fn category(&self) -> &str {
        self.id.split('-').next().unwrap_or("")
    }
}

/// An item as returned by the web catalog search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListedItem {
    pub item_id: String,
    pub item_name: String,
    pub category: String,
    #[serde(default)]
    pub rarity: String,
    #[serde(default)]
    pub is_purchasable: bool,
}

/// Result of attempting to buy an item for the bot account.
#[derive(Debug, Clone, PartialEq)]
pub enum BuyOutcome {
    Success,
    Rejected(String),
}

/// An event delivered by the room to the bot, one at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoomEvent {
    Chat { user: User, message: String },
    Join { user: User, position: Placement },
    Leave { user: User },
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },
    #[error("unexpected response: {0}")]
    Decode(String),
    #[error("web api key not configured")]
    WebApiDisabled,
}

/// Operations the hosting room platform exposes to the bot.
#[async_trait]
pub trait RoomSession: Send + Sync {
    /// Say something in the public room chat.
    async fn send_chat(&self, text: &str) -> Result<(), SessionError>;

    /// Whisper to a single user.
    async fn send_whisper(&self, user_id: &str, text: &str) -> Result<(), SessionError>;

    /// Perform an emote, on the bot itself when `target` is `None`.
    async fn send_emote(&self, emote_id: &str, target: Option<&str>) -> Result<(), SessionError>;

    /// Move a user to a literal position.
    async fn teleport(&self, user_id: &str, position: &Position) -> Result<(), SessionError>;

    /// Everyone currently in the room, with where they stand.
    async fn room_users(&self) -> Result<Vec<(User, Placement)>, SessionError>;

    /// The bot account's inventory.
    async fn inventory(&self) -> Result<Vec<OutfitItem>, SessionError>;

    /// What the bot is currently wearing.
    async fn outfit(&self) -> Result<Vec<OutfitItem>, SessionError>;

    /// Replace the bot's outfit wholesale.
    async fn set_outfit(&self, items: Vec<OutfitItem>) -> Result<(), SessionError>;

    /// Search the web item catalog by display name.
    async fn search_items(&self, name: &str) -> Result<Vec<ListedItem>, SessionError>;

    /// Buy an item for the bot account.
    async fn buy_item(&self, item_id: &str) -> Result<BuyOutcome, SessionError>;

    /// Remove a user from the room.
    async fn kick(&self, user_id: &str) -> Result<(), SessionError>;

    /// Whether the web item catalog (search/purchase) is usable.
    fn web_api_ready(&self) -> bool;

    /// Install the web-API key at runtime.
    fn set_web_api_key(&self, key: String);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::waypoints::Facing;

    #[test]
    fn test_chat_event_round_trip() {
        let event = RoomEvent::Chat {
            user: User {
                id: "u1".to_string(),
                username: "alice".to_string(),
            },
            message: "/help".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""event":"chat""#));
        let back: RoomEvent = serde_json::from_str(&json).unwrap();
        match back {
            RoomEvent::Chat { user, message } => {
                assert_eq!(user.id, "u1");
                assert_eq!(message, "/help");
            }
            other => panic!("wrong event: {:?}", other),
        }
    }

    #[test]
    fn test_placement_point_from_json() {
        let placement: Placement =
            serde_json::from_str(r#"{"x": 1.0, "y": 0.0, "z": -2.5, "facing": "left"}"#).unwrap();
        match placement {
            Placement::Point(p) => {
                assert_eq!(p.x, 1.0);
                assert_eq!(p.facing, Facing::Left);
            }
            Placement::Anchor { .. } => panic!("expected a literal point"),
        }
    }

    #[test]
    fn test_placement_anchor_from_json() {
        let placement: Placement =
            serde_json::from_str(r#"{"anchor_id": "seat-12"}"#).unwrap();
        assert_eq!(
            placement,
            Placement::Anchor {
                anchor_id: "seat-12".to_string()
            }
        );
    }

    #[test]
    fn test_placement_point_default_facing() {
        let placement: Placement = serde_json::from_str(r#"{"x": 0.0, "y": 0.0, "z": 0.0}"#).unwrap();
        match placement {
            Placement::Point(p) => assert_eq!(p.facing, Facing::Front),
            Placement::Anchor { .. } => panic!("expected a literal point"),
        }
    }

    #[test]
    fn test_outfit_item_category() {
        let item = OutfitItem::new("shirt-n_basic2018tee");
        assert_eq!(item.category(), "shirt");
        assert_eq!(item.active_palette, 0);

        let odd = OutfitItem::new("noprefix");
        assert_eq!(odd.category(), "noprefix");
    }

    #[test]
    fn test_join_event_with_anchor() {
        let json = r#"{
            "event": "join",
            "user": {"id": "u2", "username": "bob"},
            "position": {"anchor_id": "door"}
        }"#;
        let event: RoomEvent = serde_json::from_str(json).unwrap();
        match event {
            RoomEvent::Join { user, position } => {
                assert_eq!(user.username, "bob");
                assert!(matches!(position, Placement::Anchor { .. }));
            }
            other => panic!("wrong event: {:?}", other),
        }
    }
}
