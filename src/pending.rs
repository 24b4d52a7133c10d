//! One-shot deferred overlord grant.
//!
//! An operator arms the marker with a username before the bot has ever seen
//! that account. The first observed user whose display name matches is
//! promoted to overlord (and admin), the marker file is deleted, and the
//! marker disarms for good.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::roles::RoleRegistry;
use crate::session::User;
use crate::store;

pub const PENDING_FILE: &str = "pending_overlord.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct PendingFile {
    #[serde(default)]
    pending_overlord: String,
    #[serde(default)]
    note: String,
}

pub struct PendingPromotion {
    path: PathBuf,
    /// Lowercased username; `None` means disarmed.
    armed: Option<String>,
}

impl PendingPromotion {
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(PENDING_FILE);
        let file: PendingFile = store::load_or_default(&path, "pending promotion marker");
        let armed = if file.pending_overlord.is_empty() {
            None
        } else {
            info!(username = %file.pending_overlord, "pending overlord promotion armed");
            Some(file.pending_overlord.to_lowercase())
        };
        Self { path, armed }
    }

    /// Write a fresh marker for `username` (seed-roles tool).
    pub fn arm(data_dir: &Path, username: &str, note: &str) {
        store::save(
            &data_dir.join(PENDING_FILE),
            &PendingFile {
                pending_overlord: username.to_string(),
                note: note.to_string(),
            },
            "pending promotion marker",
        );
    }

    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Consume the marker if `user` matches: grant overlord+admin, delete the
    /// marker file, disarm, and return the announcement to send. Matching is
    /// case-insensitive on the display name; a user who is already an
    /// overlord leaves the marker untouched.
    pub fn observe(&mut self, user: &User, roles: &mut RoleRegistry) -> Option<String> {
        let armed = self.armed.as_deref()?;
        if user.username.to_lowercase() != armed || roles.is_overlord(&user.id) {
            return None;
        }

        roles.promote(&user.id);
        store::remove(&self.path, "pending promotion marker");
        self.armed = None;
        info!(user_id = %user.id, username = %user.username, "pending overlord promotion consumed");
        Some(format!(
            "⚡ {} has been automatically promoted to overlord status!",
            user.username
        ))
    }
}
