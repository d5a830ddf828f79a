//! Static case and item catalog.
//!
//! Catalog files list an item pool and the cases built from it. A case's
//! drop table is given either as explicit item names or as an inclusive value
//! range over the pool; the range form is resolved here, once, at load time.

use crate::{
    item::Item,
    rarity::Rarity,
};
use anyhow::Context;
use itertools::Itertools;
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    collections::HashSet,
    fmt,
    fs,
    ops::RangeInclusive,
    path::Path,
};

const BUILTIN_CATALOG: &str = include_str!("../data/catalog.json");

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CaseId(pub u32);

impl fmt::Display for CaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CatalogError {
    #[error("case {0} has an empty drop table")]
    EmptyDropTable(CaseId),
    #[error("case id {0} is used more than once")]
    DuplicateCaseId(CaseId),
    #[error("cases {0} and {1} are both free; only one free case is allowed")]
    MultipleFreeCases(CaseId, CaseId),
    #[error("case {case} refers to unknown item '{name}'")]
    UnknownItem { case: CaseId, name: String },
    #[error("item name '{0}' is used more than once in the item pool")]
    DuplicateItemName(String),
}

/// The non-empty list of items a case can award.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropTable {
    items: Vec<Item>,
}

impl DropTable {
    /// Returns `None` for an empty list.
    pub fn new(items: Vec<Item>) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(Self { items })
        }
    }

    /// Every pool item whose value falls inside `range`, in pool order.
    pub fn from_value_range(pool: &[Item], range: RangeInclusive<u64>) -> Option<Self> {
        let items = pool
            .iter()
            .filter(|item| range.contains(&item.value))
            .cloned()
            .collect();
        Self::new(items)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn first(&self) -> &Item {
        &self.items[0]
    }

    pub fn of_rarity(&self, rarity: Rarity) -> impl Iterator<Item = &Item> {
        self.items.iter().filter(move |item| item.rarity == rarity)
    }

    /// Tiers with no entry; rolls landing there use the fallback item.
    pub fn missing_rarities(&self) -> Vec<Rarity> {
        Rarity::ALL
            .into_iter()
            .filter(|rarity| self.of_rarity(*rarity).next().is_none())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Case {
    pub id: CaseId,
    pub name: String,
    pub price: u64,
    pub rarity: Rarity,
    pub category: String,
    pub image: String,
    pub drop_table: DropTable,
}

impl Case {
    pub fn is_free(&self) -> bool {
        self.price == 0
    }
}

#[derive(Clone, Debug)]
pub struct Catalog {
    cases: Vec<Case>,
}

impl Catalog {
    pub fn new(cases: Vec<Case>) -> Result<Self, CatalogError> {
        let mut seen = HashSet::new();
        let mut free: Option<CaseId> = None;
        for case in &cases {
            if !seen.insert(case.id) {
                return Err(CatalogError::DuplicateCaseId(case.id));
            }
            if case.is_free() {
                if let Some(previous) = free {
                    return Err(CatalogError::MultipleFreeCases(previous, case.id));
                }
                free = Some(case.id);
            }
        }
        Ok(Self { cases })
    }

    /// The catalog shipped with the crate.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_json(BUILTIN_CATALOG.as_bytes()).context("parse builtin catalog")
    }

    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)
            .with_context(|| format!("read catalog file {}", path.display()))?;
        Self::from_json(&data)
            .with_context(|| format!("parse catalog file {}", path.display()))
    }

    pub fn from_json(data: &[u8]) -> anyhow::Result<Self> {
        let file: CatalogFile =
            serde_json::from_slice(data).context("deserialize catalog JSON")?;
        Ok(file.build()?)
    }

    pub fn cases(&self) -> &[Case] {
        &self.cases
    }

    pub fn case(&self, id: CaseId) -> Option<&Case> {
        self.cases.iter().find(|case| case.id == id)
    }

    pub fn free_case(&self) -> Option<&Case> {
        self.cases.iter().find(|case| case.is_free())
    }

    /// Distinct items across all drop tables, cheapest first.
    pub fn items(&self) -> Vec<&Item> {
        self.cases
            .iter()
            .flat_map(|case| case.drop_table.items())
            .unique_by(|item| item.name.as_str())
            .sorted_by_key(|item| (item.value, item.name.as_str()))
            .collect()
    }

    pub fn item_named(&self, name: &str) -> Option<&Item> {
        self.cases
            .iter()
            .flat_map(|case| case.drop_table.items())
            .find(|item| item.name.eq_ignore_ascii_case(name))
    }
}

/// On-disk catalog shape.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CatalogFile {
    pub items: Vec<Item>,
    pub cases: Vec<CaseEntry>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CaseEntry {
    pub id: CaseId,
    pub name: String,
    pub price: u64,
    pub rarity: Rarity,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    pub drops: DropSpec,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DropSpec {
    Items { names: Vec<String> },
    ValueRange { min: u64, max: u64 },
}

impl CatalogFile {
    pub fn build(self) -> Result<Catalog, CatalogError> {
        if let Some(name) = self.items.iter().map(|item| &item.name).duplicates().next() {
            return Err(CatalogError::DuplicateItemName(name.clone()));
        }
        let cases = self
            .cases
            .into_iter()
            .map(|entry| entry.resolve(&self.items))
            .collect::<Result<Vec<_>, _>>()?;
        Catalog::new(cases)
    }
}

impl CaseEntry {
    fn resolve(self, pool: &[Item]) -> Result<Case, CatalogError> {
        let drop_table = match self.drops {
            DropSpec::Items { names } => {
                let items = names
                    .into_iter()
                    .map(|name| {
                        pool.iter().find(|item| item.name == name).cloned().ok_or(
                            CatalogError::UnknownItem {
                                case: self.id,
                                name,
                            },
                        )
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                DropTable::new(items)
            }
            DropSpec::ValueRange { min, max } => {
                DropTable::from_value_range(pool, min..=max)
            }
        }
        .ok_or(CatalogError::EmptyDropTable(self.id))?;
        Ok(Case {
            id: self.id,
            name: self.name,
            price: self.price,
            rarity: self.rarity,
            category: self.category,
            image: self.image,
            drop_table,
        })
    }
}
