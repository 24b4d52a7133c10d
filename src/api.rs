//! HTTP implementation of the room session and the web item catalog.
//!
//! Session operations post to `rooms/{room_id}/...` with the bot token; the
//! event feed is a long-poll against `rooms/{room_id}/events`. Item search
//! and purchase go through the web API and require a separate key, which can
//! be installed at runtime via `/setapikey`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Mutex;
use std::time::Duration;
use tracing::info;

use crate::config::Config;
use crate::session::{
    BuyOutcome, ListedItem, OutfitItem, Placement, RoomEvent, RoomSession, SessionError, User,
};
use crate::waypoints::Position;

pub struct RoomApiClient {
    http: Client,
    api_url: String,
    room_id: String,
    token: String,
    poll_wait_secs: u64,
    web_api_key: Mutex<Option<String>>,
}

#[derive(Debug, Deserialize)]
struct EventBatch {
    #[serde(default)]
    events: Vec<RoomEvent>,
    cursor: u64,
}

#[derive(Debug, Deserialize)]
struct RoomUsersResponse {
    content: Vec<(User, Placement)>,
}

#[derive(Debug, Deserialize)]
struct ItemListResponse {
    #[serde(default)]
    items: Vec<OutfitItem>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<ListedItem>,
}

#[derive(Debug, Deserialize)]
struct BuyResponse {
    status: String,
}

impl RoomApiClient {
    pub fn new(config: &Config, token: String, web_api_key: Option<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.event_poll_wait_secs + 30))
            .build()
            .expect("failed to create HTTP client");
        if web_api_key.is_some() {
            info!("web api key configured, outfit features enabled");
        }
        Self {
            http,
            api_url: config.api_url.clone(),
            room_id: config.room_id.clone(),
            token,
            poll_wait_secs: config.event_poll_wait_secs,
            web_api_key: Mutex::new(web_api_key),
        }
    }

    fn room_url(&self, op: &str) -> String {
        format!("{}/rooms/{}/{}", self.api_url, self.room_id, op)
    }

    async fn post_op(&self, op: &str, body: serde_json::Value) -> Result<String, SessionError> {
        let response = self
            .http
            .post(self.room_url(op))
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(SessionError::Api {
                status: status.as_u16(),
                message: text,
            });
        }
        Ok(text)
    }

    async fn get_op(&self, op: &str, query: &[(&str, String)]) -> Result<String, SessionError> {
        let response = self
            .http
            .get(self.room_url(op))
            .bearer_auth(&self.token)
            .query(query)
            .send()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(SessionError::Api {
                status: status.as_u16(),
                message: text,
            });
        }
        Ok(text)
    }

    fn decode<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, SessionError> {
        serde_json::from_str(text).map_err(|e| SessionError::Decode(e.to_string()))
    }

    fn web_api_key(&self) -> Result<String, SessionError> {
        self.web_api_key
            .lock()
            .expect("web api key lock")
            .clone()
            .ok_or(SessionError::WebApiDisabled)
    }

    /// Long-poll the room event feed. Returns the delivered events and the
    /// cursor to resume from.
    pub async fn poll_events(&self, cursor: u64) -> Result<(Vec<RoomEvent>, u64), SessionError> {
        let text = self
            .get_op(
                "events",
                &[
                    ("cursor", cursor.to_string()),
                    ("wait", self.poll_wait_secs.to_string()),
                ],
            )
            .await?;
        let batch: EventBatch = Self::decode(&text)?;
        Ok((batch.events, batch.cursor))
    }
}

#[async_trait]
impl RoomSession for RoomApiClient {
    async fn send_chat(&self, text: &str) -> Result<(), SessionError> {
        self.post_op("chat", serde_json::json!({ "message": text }))
            .await?;
        Ok(())
    }

    async fn send_whisper(&self, user_id: &str, text: &str) -> Result<(), SessionError> {
        self.post_op(
            "whisper",
            serde_json::json!({ "user_id": user_id, "message": text }),
        )
        .await?;
        Ok(())
    }

    async fn send_emote(&self, emote_id: &str, target: Option<&str>) -> Result<(), SessionError> {
        let mut body = serde_json::json!({ "emote_id": emote_id });
        if let Some(user_id) = target {
            body["target_user_id"] = serde_json::json!(user_id);
        }
        self.post_op("emote", body).await?;
        Ok(())
    }

    async fn teleport(&self, user_id: &str, position: &Position) -> Result<(), SessionError> {
        self.post_op(
            "teleport",
            serde_json::json!({ "user_id": user_id, "destination": position }),
        )
        .await?;
        Ok(())
    }

    async fn room_users(&self) -> Result<Vec<(User, Placement)>, SessionError> {
        let text = self.get_op("users", &[]).await?;
        let response: RoomUsersResponse = Self::decode(&text)?;
        Ok(response.content)
    }

    async fn inventory(&self) -> Result<Vec<OutfitItem>, SessionError> {
        let text = self.get_op("inventory", &[]).await?;
        let response: ItemListResponse = Self::decode(&text)?;
        Ok(response.items)
    }

    async fn outfit(&self) -> Result<Vec<OutfitItem>, SessionError> {
        let text = self.get_op("outfit", &[]).await?;
        let response: ItemListResponse = Self::decode(&text)?;
        Ok(response.items)
    }

    async fn set_outfit(&self, items: Vec<OutfitItem>) -> Result<(), SessionError> {
        self.post_op("outfit", serde_json::json!({ "items": items }))
            .await?;
        Ok(())
    }

    async fn search_items(&self, name: &str) -> Result<Vec<ListedItem>, SessionError> {
        let key = self.web_api_key()?;
        let response = self
            .http
            .get(format!("{}/web/items", self.api_url))
            .header("x-api-key", key)
            .query(&[("item_name", name)])
            .send()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SessionError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(SessionError::Api {
                status: status.as_u16(),
                message: text,
            });
        }
        let parsed: SearchResponse = Self::decode(&text)?;
        Ok(parsed.items)
    }

    async fn buy_item(&self, item_id: &str) -> Result<BuyOutcome, SessionError> {
        let text = self
            .post_op("buy", serde_json::json!({ "item_id": item_id }))
            .await?;
        let response: BuyResponse = Self::decode(&text)?;
        if response.status == "success" {
            Ok(BuyOutcome::Success)
        } else {
            Ok(BuyOutcome::Rejected(response.status))
        }
    }

    async fn kick(&self, user_id: &str) -> Result<(), SessionError> {
        self.post_op("kick", serde_json::json!({ "user_id": user_id }))
            .await?;
        Ok(())
    }

    fn web_api_ready(&self) -> bool {
        self.web_api_key.lock().expect("web api key lock").is_some()
    }

    fn set_web_api_key(&self, key: String) {
        *self.web_api_key.lock().expect("web api key lock") = Some(key);
        info!("web api key installed at runtime");
    }
}
