//! Role registry: layered admin/overlord membership with write-through
//! JSON persistence.
//!
//! Overlords are implicitly admins: granting overlord also inserts into the
//! admin set, and `is_admin` answers across both sets. Removal never cascades
//! in either direction.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::store;

pub const ADMINS_FILE: &str = "admins.json";
pub const OVERLORDS_FILE: &str = "overlords.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct AdminsFile {
    #[serde(default)]
    admins: HashSet<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct OverlordsFile {
    #[serde(default)]
    overlords: HashSet<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RoleError {
    #[error("not authorized for that tier")]
    Unauthorized,
    #[error("only overlords may touch an overlord's membership")]
    Forbidden,
    #[error("already a member of that tier")]
    AlreadyMember,
    #[error("not a member of that tier")]
    NotMember,
}

pub struct RoleRegistry {
    admins: HashSet<String>,
    overlords: HashSet<String>,
    admins_path: PathBuf,
    overlords_path: PathBuf,
}

impl RoleRegistry {
    /// Hydrate both role sets from `data_dir`. Missing or unreadable files
    /// degrade to empty sets.
    pub fn load(data_dir: &Path) -> Self {
        let admins_path = data_dir.join(ADMINS_FILE);
        let overlords_path = data_dir.join(OVERLORDS_FILE);
        let admins = store::load_or_default::<AdminsFile>(&admins_path, "admin list").admins;
        let overlords =
            store::load_or_default::<OverlordsFile>(&overlords_path, "overlord list").overlords;
        info!(
            admins = admins.len(),
            overlords = overlords.len(),
            "role sets loaded"
        );
        Self {
            admins,
            overlords,
            admins_path,
            overlords_path,
        }
    }

    /// An overlord always counts as an admin.
    pub fn is_admin(&self, id: &str) -> bool {
        self.admins.contains(id) || self.overlords.contains(id)
    }

    pub fn is_overlord(&self, id: &str) -> bool {
        self.overlords.contains(id)
    }

    pub fn add_admin(&mut self, actor: &str, target: &str) -> Result<(), RoleError> {
        if !self.is_admin(actor) {
            return Err(RoleError::Unauthorized);
        }
        if self.admins.contains(target) {
            return Err(RoleError::AlreadyMember);
        }
        self.admins.insert(target.to_string());
        self.save_admins();
        info!(actor, target, "admin added");
        Ok(())
    }

    pub fn remove_admin(&mut self, actor: &str, target: &str) -> Result<(), RoleError> {
        if !self.is_admin(actor) {
            return Err(RoleError::Unauthorized);
        }
        if self.overlords.contains(target) && !self.is_overlord(actor) {
            return Err(RoleError::Forbidden);
        }
        if !self.admins.remove(target) {
            return Err(RoleError::NotMember);
        }
        // Overlord membership is intentionally untouched; see DESIGN.md.
        self.save_admins();
        info!(actor, target, "admin removed");
        Ok(())
    }

    pub fn add_overlord(&mut self, actor: &str, target: &str) -> Result<(), RoleError> {
        if !self.is_overlord(actor) {
            return Err(RoleError::Unauthorized);
        }
        if self.overlords.contains(target) {
            return Err(RoleError::AlreadyMember);
        }
        self.overlords.insert(target.to_string());
        if self.admins.insert(target.to_string()) {
            self.save_admins();
        }
        self.save_overlords();
        info!(actor, target, "overlord added");
        Ok(())
    }

    pub fn remove_overlord(&mut self, actor: &str, target: &str) -> Result<(), RoleError> {
        if !self.is_overlord(actor) {
            return Err(RoleError::Unauthorized);
        }
        if !self.overlords.remove(target) {
            return Err(RoleError::NotMember);
        }
        // Admin membership is kept; demotion stops at the overlord tier.
        self.save_overlords();
        info!(actor, target, "overlord removed");
        Ok(())
    }

    /// Unconditional overlord+admin grant, used by the pending-promotion
    /// marker and the seed-roles tool.
    pub fn promote(&mut self, id: &str) {
        self.overlords.insert(id.to_string());
        if self.admins.insert(id.to_string()) {
            self.save_admins();
        }
        self.save_overlords();
        info!(id, "promoted to overlord");
    }

    pub fn admins(&self) -> Vec<&str> {
        self.admins.iter().map(String::as_str).collect()
    }

    pub fn overlords(&self) -> Vec<&str> {
        self.overlords.iter().map(String::as_str).collect()
    }

    /// Rewrite both backing files from memory (shutdown flush).
    pub fn flush(&self) {
        self.save_admins();
        self.save_overlords();
    }

    fn save_admins(&self) {
        store::save(
            &self.admins_path,
            &AdminsFile {
                admins: self.admins.clone(),
            },
            "admin list",
        );
    }

    fn save_overlords(&self) {
        store::save(
            &self.overlords_path,
            &OverlordsFile {
                overlords: self.overlords.clone(),
            },
            "overlord list",
        );
    }
}
