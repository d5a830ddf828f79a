//! Upgrade gamble rules: which chances are offered, what a chance costs, and
//! which catalog items qualify as targets.
//!
//! The cost of an attempt is `round(source_value * (1 - chance / 100))`,
//! computed in integers with halves rounded up.

use crate::{
    error::Rejection,
    item::Item,
};
use serde::{
    Deserialize,
    Serialize,
};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpgradeRules {
    pub min_chance: u8,
    pub max_chance: u8,
    pub chance_step: u8,
    /// Targets may be worth at most this multiple of the source.
    pub max_value_multiplier: u64,
}

impl Default for UpgradeRules {
    fn default() -> Self {
        Self {
            min_chance: 10,
            max_chance: 90,
            chance_step: 5,
            max_value_multiplier: 5,
        }
    }
}

impl UpgradeRules {
    pub fn validate_chance(&self, chance: u8) -> Result<(), Rejection> {
        let step = self.chance_step.max(1);
        let offered = chance < 100
            && chance <= self.max_chance
            && chance
                .checked_sub(self.min_chance)
                .is_some_and(|offset| offset % step == 0);
        if offered {
            Ok(())
        } else {
            Err(Rejection::InvalidChance(chance))
        }
    }

    /// Every offered chance, ascending.
    pub fn chances(&self) -> Vec<u8> {
        let step = usize::from(self.chance_step.max(1));
        (self.min_chance..=self.max_chance.min(99))
            .step_by(step)
            .collect()
    }

    pub fn cost(&self, source_value: u64, chance: u8) -> u64 {
        let keep = u128::from(100 - u64::from(chance.min(100)));
        let scaled = u128::from(source_value) * keep;
        ((scaled + 50) / 100) as u64
    }

    pub fn is_success(&self, percent_draw: f64, chance: u8) -> bool {
        percent_draw < f64::from(chance)
    }

    pub fn is_eligible_target(&self, source_value: u64, target: &Item) -> bool {
        let ceiling = source_value.saturating_mul(self.max_value_multiplier);
        target.value > source_value && target.value <= ceiling
    }

    /// Eligible targets from `pool`, cheapest first.
    pub fn targets<'a>(
        &self,
        source_value: u64,
        pool: impl IntoIterator<Item = &'a Item>,
    ) -> Vec<&'a Item> {
        let mut targets: Vec<&Item> = pool
            .into_iter()
            .filter(|item| self.is_eligible_target(source_value, item))
            .collect();
        targets.sort_by_key(|item| (item.value, item.name.clone()));
        targets
    }
}
