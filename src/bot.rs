//! Bot shell: store hydration, event dispatch, and the main loop.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::api::RoomApiClient;
use crate::catalog::EmoteCatalog;
use crate::config::Config;
use crate::pending::PendingPromotion;
use crate::roles::RoleRegistry;
use crate::session::{RoomEvent, RoomSession};
use crate::waypoints::{WaypointStore, TELEPORT_FILE};

pub struct Bot {
    pub config: Config,
    pub roles: RoleRegistry,
    pub pending: PendingPromotion,
    pub waypoints: WaypointStore,
    pub emotes: EmoteCatalog,
    pub started_at: DateTime<Utc>,
    pub commands_handled: u64,
    pub commands_failed: u64,
}

impl Bot {
    /// Hydrate every persisted collection from the configured data directory.
    /// Missing or unreadable files degrade to empty collections.
    pub fn new(config: Config) -> Self {
        let data_dir = config.data_dir.clone();
        Self {
            roles: RoleRegistry::load(&data_dir),
            pending: PendingPromotion::load(&data_dir),
            waypoints: WaypointStore::load(data_dir.join(TELEPORT_FILE)),
            emotes: EmoteCatalog::new(),
            started_at: Utc::now(),
            commands_handled: 0,
            commands_failed: 0,
            config,
        }
    }

    /// Rewrite every persisted collection from memory.
    pub fn flush(&self) {
        self.roles.flush();
        self.waypoints.flush();
    }

    /// Dispatch one room event. Faults inside a handler are contained; the
    /// loop always survives to the next event.
    pub async fn handle_event(&mut self, session: &dyn RoomSession, event: RoomEvent) {
        match event {
            RoomEvent::Chat { user, message } => {
                self.observe_for_promotion(session, &user).await;
                self.handle_chat(session, &user, &message).await;
            }
            RoomEvent::Join { user, .. } => {
                self.observe_for_promotion(session, &user).await;
                if self.config.greet_on_join {
                    if let Err(e) = session
                        .send_chat(&format!(
                            "👋 Welcome, {}! Make yourself at home.",
                            user.username
                        ))
                        .await
                    {
                        warn!(error = %e, "greeting failed");
                    }
                    if let Some(emote_id) = self.emotes.get("hello") {
                        // A refused greeting emote is not worth surfacing.
                        let _ = session.send_emote(emote_id, None).await;
                    }
                }
            }
            RoomEvent::Leave { user } => {
                if self.config.greet_on_join {
                    if let Err(e) = session
                        .send_chat(&format!("👋 {} has left the room.", user.username))
                        .await
                    {
                        warn!(error = %e, "farewell failed");
                    }
                }
            }
        }
    }

    async fn observe_for_promotion(&mut self, session: &dyn RoomSession, user: &crate::session::User) {
        if let Some(announcement) = self.pending.observe(user, &mut self.roles) {
            if let Err(e) = session.send_chat(&announcement).await {
                warn!(error = %e, "failed to announce promotion");
            }
        }
    }

    /// Main loop: long-poll the room feed and dispatch events one at a time,
    /// with a periodic housekeeping line.
    pub async fn run(mut self, client: RoomApiClient) -> Result<(), Box<dyn std::error::Error>> {
        info!("bot ready, entering main loop");

        let mut housekeeping =
            tokio::time::interval(Duration::from_secs(self.config.housekeeping_interval_secs));
        housekeeping.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut cursor = 0u64;

        loop {
            tokio::select! {
                polled = client.poll_events(cursor) => match polled {
                    Ok((events, next_cursor)) => {
                        cursor = next_cursor;
                        for event in events {
                            self.handle_event(&client, event).await;
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "event poll failed, backing off");
                        tokio::time::sleep(Duration::from_secs(5)).await;
                    }
                },
                _ = housekeeping.tick() => {
                    info!(
                        commands = self.commands_handled,
                        failed = self.commands_failed,
                        waypoints = self.waypoints.len(),
                        "housekeeping"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_in(dir: &std::path::Path) -> Config {
        let mut config = Config::default_for_room("room_test".to_string());
        config.data_dir = dir.to_path_buf();
        config
    }

    #[test]
    fn test_new_starts_empty_on_fresh_dir() {
        let dir = tempdir().unwrap();
        let bot = Bot::new(config_in(dir.path()));
        assert!(bot.waypoints.is_empty());
        assert!(!bot.pending.is_armed());
        assert!(bot.roles.admins().is_empty());
        assert!(!bot.emotes.is_empty());
    }

    #[test]
    fn test_new_hydrates_seeded_roles() {
        let dir = tempdir().unwrap();
        {
            let mut seeded = Bot::new(config_in(dir.path()));
            seeded.roles.promote("boss");
        }
        let bot = Bot::new(config_in(dir.path()));
        assert!(bot.roles.is_overlord("boss"));
        assert!(bot.roles.is_admin("boss"));
    }

    #[test]
    fn test_flush_writes_all_stores() {
        let dir = tempdir().unwrap();
        let bot = Bot::new(config_in(dir.path()));
        bot.flush();
        assert!(dir.path().join(crate::roles::ADMINS_FILE).exists());
        assert!(dir.path().join(crate::roles::OVERLORDS_FILE).exists());
        assert!(dir.path().join(TELEPORT_FILE).exists());
    }
}
