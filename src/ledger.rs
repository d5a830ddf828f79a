use crate::error::Rejection;
use serde::{
    Deserialize,
    Serialize,
};

/// Experience granted for every item received from a case.
pub const EXPERIENCE_PER_ITEM: u32 = 5;
pub const EXPERIENCE_PER_LEVEL: u32 = 100;
pub const STARTING_LEVEL: u32 = 1;

/// Economic and progression record of one profile.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ledger {
    pub total_opened: u64,
    pub total_spent: u64,
    pub total_won: u64,
    pub balance: u64,
    pub level: u32,
    /// Always below [`EXPERIENCE_PER_LEVEL`].
    pub exp: u32,
}

impl Ledger {
    pub fn with_balance(balance: u64) -> Self {
        Self {
            total_opened: 0,
            total_spent: 0,
            total_won: 0,
            balance,
            level: STARTING_LEVEL,
            exp: 0,
        }
    }

    pub fn ensure_affordable(&self, cost: u64) -> Result<(), Rejection> {
        if self.balance < cost {
            return Err(Rejection::InsufficientFunds {
                required: cost,
                available: self.balance,
            });
        }
        Ok(())
    }

    /// Apply an opened batch. Returns the number of levels gained.
    ///
    /// Callers check [`Ledger::ensure_affordable`] first.
    pub fn record_open(&mut self, cost: u64, count: u32, awarded_value: u64) -> u32 {
        debug_assert!(self.balance >= cost);
        self.balance -= cost;
        self.total_spent += cost;
        self.total_opened += u64::from(count);
        self.total_won += awarded_value;
        self.gain_experience(count * EXPERIENCE_PER_ITEM)
    }

    /// Apply a settled upgrade. `awarded_value` is `None` when the gamble was lost.
    pub fn record_upgrade(&mut self, cost: u64, awarded_value: Option<u64>) {
        debug_assert!(self.balance >= cost);
        self.balance -= cost;
        self.total_spent += cost;
        if let Some(value) = awarded_value {
            self.total_won += value;
        }
    }

    pub fn record_sale(&mut self, value: u64) {
        self.balance += value;
    }

    pub fn gain_experience(&mut self, points: u32) -> u32 {
        let total = self.exp + points;
        let levels = total / EXPERIENCE_PER_LEVEL;
        self.level += levels;
        self.exp = total % EXPERIENCE_PER_LEVEL;
        levels
    }

    pub fn net_result(&self) -> i128 {
        i128::from(self.total_won) - i128::from(self.total_spent)
    }
}
