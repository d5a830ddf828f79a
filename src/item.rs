use crate::rarity::Rarity;
use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt;

/// Catalog template for something a case can award.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub rarity: Rarity,
    pub value: u64,
    #[serde(default)]
    pub image: String,
}

impl Item {
    pub fn new(name: impl Into<String>, rarity: Rarity, value: u64) -> Self {
        Self {
            name: name.into(),
            rarity,
            value,
            image: String::new(),
        }
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(pub u64);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An owned copy of an [`Item`]. Ids are handed out in acquisition order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: ItemId,
    #[serde(flatten)]
    pub item: Item,
    pub acquired_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn value(&self) -> u64 {
        self.item.value
    }

    pub fn rarity(&self) -> Rarity {
        self.item.rarity
    }

    pub fn name(&self) -> &str {
        &self.item.name
    }

    pub fn is_instance_of(&self, template: &Item) -> bool {
        self.item == *template
    }
}
