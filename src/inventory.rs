use crate::{
    item::{
        InventoryItem,
        Item,
        ItemId,
    },
    rarity::Rarity,
};
use chrono::{
    DateTime,
    Utc,
};
use itertools::Itertools;
use std::collections::HashMap;

/// Items owned by one profile, stored in acquisition order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    items: Vec<InventoryItem>,
    next_id: u64,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted parts. `next_id` is raised past every stored id.
    pub fn from_parts(items: Vec<InventoryItem>, next_id: u64) -> Self {
        let floor = items.iter().map(|i| i.id.0 + 1).max().unwrap_or(0);
        Self {
            items,
            next_id: next_id.max(floor),
        }
    }

    pub fn grant(&mut self, item: Item, acquired_at: DateTime<Utc>) -> InventoryItem {
        let owned = InventoryItem {
            id: ItemId(self.next_id),
            item,
            acquired_at,
        };
        self.next_id += 1;
        self.items.push(owned.clone());
        owned
    }

    pub fn get(&self, id: ItemId) -> Option<&InventoryItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.get(id).is_some()
    }

    pub fn take(&mut self, id: ItemId) -> Option<InventoryItem> {
        let position = self.items.iter().position(|item| item.id == id)?;
        Some(self.items.remove(position))
    }

    /// Stored order, oldest first.
    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &InventoryItem> {
        self.items.iter().rev()
    }

    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn total_value(&self) -> u64 {
        self.items.iter().map(InventoryItem::value).sum()
    }

    pub fn count_by_rarity(&self) -> HashMap<Rarity, usize> {
        self.items.iter().counts_by(InventoryItem::rarity)
    }
}
