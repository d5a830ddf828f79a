//! Persisted profile shape.

use crate::{
    inventory::Inventory,
    item::{
        InventoryItem,
        ItemId,
    },
    ledger::{
        EXPERIENCE_PER_LEVEL,
        Ledger,
    },
};
use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::collections::HashSet;

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error(
        "snapshot schema version {found} is newer than supported version {supported}"
    )]
    UnsupportedVersion { found: u32, supported: u32 },
    #[error("snapshot experience {0} is out of range")]
    ExperienceOutOfRange(u32),
    #[error("snapshot lists item {0} more than once")]
    DuplicateItem(ItemId),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSnapshot {
    pub schema_version: u32,
    #[serde(flatten)]
    pub ledger: Ledger,
    #[serde(default)]
    pub last_free_case: Option<DateTime<Utc>>,
    #[serde(default)]
    pub next_item_id: u64,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
}

/// Live profile state owned by a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Profile {
    pub ledger: Ledger,
    pub inventory: Inventory,
    pub last_free_case: Option<DateTime<Utc>>,
}

impl Profile {
    pub fn fresh(starting_balance: u64) -> Self {
        Self {
            ledger: Ledger::with_balance(starting_balance),
            inventory: Inventory::new(),
            last_free_case: None,
        }
    }

    pub fn to_snapshot(&self) -> ProfileSnapshot {
        ProfileSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            ledger: self.ledger.clone(),
            last_free_case: self.last_free_case,
            next_item_id: self.inventory.next_id(),
            inventory: self.inventory.items().to_vec(),
        }
    }
}

impl TryFrom<ProfileSnapshot> for Profile {
    type Error = SnapshotError;

    fn try_from(snapshot: ProfileSnapshot) -> Result<Self, Self::Error> {
        if snapshot.schema_version > SNAPSHOT_SCHEMA_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.schema_version,
                supported: SNAPSHOT_SCHEMA_VERSION,
            });
        }
        if snapshot.ledger.exp >= EXPERIENCE_PER_LEVEL {
            return Err(SnapshotError::ExperienceOutOfRange(snapshot.ledger.exp));
        }
        let mut seen = HashSet::new();
        if let Some(duplicate) = snapshot.inventory.iter().find(|i| !seen.insert(i.id)) {
            return Err(SnapshotError::DuplicateItem(duplicate.id));
        }
        Ok(Self {
            ledger: snapshot.ledger,
            inventory: Inventory::from_parts(snapshot.inventory, snapshot.next_item_id),
            last_free_case: snapshot.last_free_case,
        })
    }
}
