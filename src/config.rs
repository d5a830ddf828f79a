use crate::{
    cooldown::{
        DEFAULT_FREE_CASE_WINDOW_SECS,
        FreeCaseCooldown,
    },
    upgrade::UpgradeRules,
};
use anyhow::Context;
use chrono::TimeDelta;
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fs,
    path::Path,
    time::Duration,
};

pub const DEFAULT_STARTING_BALANCE: u64 = 5000;
pub const DEFAULT_MAX_OPEN_COUNT: u32 = 10;
pub const DEFAULT_REVEAL_DELAY_MS: u64 = 3000;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Balance of a profile that has never been saved.
    pub starting_balance: u64,
    pub max_open_count: u32,
    /// Pause between reserving an open or upgrade and settling it.
    pub reveal_delay_ms: u64,
    pub free_case_cooldown_secs: u64,
    pub upgrade: UpgradeRules,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            starting_balance: DEFAULT_STARTING_BALANCE,
            max_open_count: DEFAULT_MAX_OPEN_COUNT,
            reveal_delay_ms: DEFAULT_REVEAL_DELAY_MS,
            free_case_cooldown_secs: DEFAULT_FREE_CASE_WINDOW_SECS,
            upgrade: UpgradeRules::default(),
        }
    }
}

impl EngineConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        serde_json::from_slice(&data)
            .with_context(|| format!("parse config file {}", path.display()))
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn free_case_cooldown(&self) -> FreeCaseCooldown {
        let secs = i64::try_from(self.free_case_cooldown_secs).unwrap_or(i64::MAX);
        let window = TimeDelta::try_seconds(secs).unwrap_or(TimeDelta::MAX);
        FreeCaseCooldown::new(window)
    }

    /// Same configuration with no reveal pause.
    pub fn instant(mut self) -> Self {
        self.reveal_delay_ms = 0;
        self
    }
}
