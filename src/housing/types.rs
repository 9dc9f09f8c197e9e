use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::housing::errors::LeaseError;

pub const PLAYER_INFO_SCHEMA_VERSION: u8 = 1;

/// Tag of the player info record holding purchased houses.
pub const PLAYER_INFO_TAG: &str = "luxury_house";

pub const SECONDS_PER_DAY: i64 = 60 * 60 * 24;

/// A teleport target: map path plus tile coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MapPoint {
    pub path: String,
    pub x: i32,
    pub y: i32,
}

impl MapPoint {
    pub fn new(path: &str, x: i32, y: i32) -> Self {
        Self {
            path: path.to_string(),
            x,
            y,
        }
    }
}

impl fmt::Display for MapPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {})", self.path, self.x, self.y)
    }
}

/// Exit used to reach the central transit hub from any house.
pub type HubWaypoint = MapPoint;

/// A tile on the current map.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Lease terms and portal layout of a purchasable house.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HouseDefinition {
    pub id: String,
    pub display_name: String,
    pub purchase_cost: i64,
    /// Occupancy fee charged per day.
    pub daily_fee: i64,
    /// How many days of fees may be banked at once.
    pub max_prepaid_days: u32,
    /// Days credited automatically when the house is bought.
    pub prepaid_days_on_purchase: u32,
    /// How far around the anchor stray items are looked for.
    pub stray_item_radius: u32,
    /// Where the player lands when entering the house.
    pub house_portal: MapPoint,
    /// Where the player lands in the house when coming back from the hub.
    pub from_hub_portal: MapPoint,
    /// Where the player goes when leaving the house map.
    pub exit_portal: MapPoint,
    /// Stray items get collected here; this square is skipped when scanning.
    pub stray_item_anchor: Position,
    /// Where a player who can't pay their lapsed fees is moved to.
    pub unpaid_fee_position: Position,
}

/// One purchased house and the moment its prepaid fees run out.
///
/// Stored as a two element array `["greyton", 1700000000]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "(String, i64)", into = "(String, i64)")]
pub struct OwnedHouseRecord {
    pub house_id: String,
    /// Unix timestamp (seconds).
    pub paid_until: i64,
}

impl From<(String, i64)> for OwnedHouseRecord {
    fn from((house_id, paid_until): (String, i64)) -> Self {
        Self {
            house_id,
            paid_until,
        }
    }
}

impl From<OwnedHouseRecord> for (String, i64) {
    fn from(record: OwnedHouseRecord) -> Self {
        (record.house_id, record.paid_until)
    }
}

/// Raw per-player record as held by the record store.
///
/// Two logically separate fields share one record: a structured text field with the
/// owned houses and a free-text scratch field with the last house visited. Writes
/// always replace both.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerInfoRecord {
    /// JSON encoded list of [`OwnedHouseRecord`].
    pub houses: String,
    pub last_house: Option<String>,
    pub updated_at: DateTime<Utc>,
    pub schema_version: u8,
}

impl PlayerInfoRecord {
    pub fn new() -> Self {
        Self {
            houses: "[]".to_string(),
            last_house: None,
            updated_at: Utc::now(),
            schema_version: PLAYER_INFO_SCHEMA_VERSION,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for PlayerInfoRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Decoded view of a player's record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerLedger {
    pub owned_houses: Vec<OwnedHouseRecord>,
    pub last_house_visited: Option<String>,
}

impl PlayerLedger {
    /// Decode both fields of a stored record. A blank house field reads as no houses.
    pub fn decode(record: &PlayerInfoRecord) -> Result<Self, LeaseError> {
        let owned_houses = if record.houses.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str(&record.houses)?
        };
        Ok(Self {
            owned_houses,
            last_house_visited: record.last_house.clone(),
        })
    }

    /// Write both fields back into `record`.
    pub fn encode_into(&self, record: &mut PlayerInfoRecord) -> Result<(), LeaseError> {
        record.houses = serde_json::to_string(&self.owned_houses)?;
        record.last_house = self.last_house_visited.clone();
        Ok(())
    }

    pub fn find(&self, house_id: &str) -> Option<&OwnedHouseRecord> {
        self.owned_houses.iter().find(|h| h.house_id == house_id)
    }

    pub fn find_mut(&mut self, house_id: &str) -> Option<&mut OwnedHouseRecord> {
        self.owned_houses.iter_mut().find(|h| h.house_id == house_id)
    }
}
