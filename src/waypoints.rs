//! Named teleport waypoints, persisted as a label → position map.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::info;

use crate::session::Placement;
use crate::store;

pub const TELEPORT_FILE: &str = "teleport_points.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    #[default]
    Front,
    Back,
    Left,
    Right,
}

/// A literal coordinate in the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub facing: Facing,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self {
            x,
            y,
            z,
            facing: Facing::Front,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WaypointError {
    /// Seats and other anchors carry no literal coordinate to store.
    #[error("anchor positions cannot be saved as waypoints")]
    AnchorPosition,
}

/// Label-keyed waypoint map. Labels are case-sensitive and mutations write
/// through to disk immediately.
pub struct WaypointStore {
    path: PathBuf,
    points: HashMap<String, Position>,
}

impl WaypointStore {
    pub fn load(path: PathBuf) -> Self {
        let points: HashMap<String, Position> = store::load_or_default(&path, "teleport points");
        if !points.is_empty() {
            info!(count = points.len(), "loaded teleport points");
        }
        Self { path, points }
    }

    /// Store (or overwrite) a waypoint at the given placement and persist.
    /// Returns the stored position for confirmation messaging.
    pub fn set(&mut self, label: &str, placement: &Placement) -> Result<Position, WaypointError> {
        let position = match placement {
            Placement::Point(p) => p.clone(),
            Placement::Anchor { .. } => return Err(WaypointError::AnchorPosition),
        };
        self.points.insert(label.to_string(), position.clone());
        store::save(&self.path, &self.points, "teleport points");
        Ok(position)
    }

    pub fn get(&self, label: &str) -> Option<&Position> {
        self.points.get(label)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.points.contains_key(label)
    }

    pub fn labels(&self) -> Vec<&str> {
        self.points.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Rewrite the backing file from memory (shutdown flush).
    pub fn flush(&self) {
        store::save(&self.path, &self.points, "teleport points");
    }
}
