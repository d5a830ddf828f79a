use crate::{
    catalog::DropTable,
    draw::DrawSource,
    item::Item,
    rarity::Rarity,
};
use tracing::warn;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RollResult {
    pub item: Item,
    /// Tier chosen by the first draw. Differs from `item.rarity` on fallback.
    pub rolled: Rarity,
    /// The drop table had nothing of the rolled tier and the first entry was
    /// awarded instead.
    pub fell_back: bool,
}

/// Roll one item: one draw for the tier, one draw for the pick inside it.
pub fn roll_one<D: DrawSource + ?Sized>(table: &DropTable, draws: &mut D) -> RollResult {
    let rolled = Rarity::from_draw(draws.unit());
    let bucket: Vec<&Item> = table.of_rarity(rolled).collect();
    if bucket.is_empty() {
        let fallback = table.first();
        warn!(
            rarity = %rolled,
            fallback = %fallback.name,
            "drop table has no item of rolled rarity"
        );
        return RollResult {
            item: fallback.clone(),
            rolled,
            fell_back: true,
        };
    }
    let item = bucket[draws.index(bucket.len())].clone();
    RollResult {
        item,
        rolled,
        fell_back: false,
    }
}

pub fn roll_many<D: DrawSource + ?Sized>(
    table: &DropTable,
    count: u32,
    draws: &mut D,
) -> Vec<RollResult> {
    (0..count).map(|_| roll_one(table, draws)).collect()
}

pub fn total_value(results: &[RollResult]) -> u64 {
    results.iter().map(|r| r.item.value).sum()
}
