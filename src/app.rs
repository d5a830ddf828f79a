//! Async front of the engine. Every open and upgrade is reserved, held for
//! the configured reveal delay, then settled and saved to storage.

use crate::{
    catalog::{
        CaseId,
        Catalog,
    },
    config::EngineConfig,
    cooldown::{
        Clock,
        FreeCaseStatus,
    },
    draw::DrawSource,
    error::Rejection,
    item::{
        Item,
        ItemId,
    },
    session::{
        OpenReceipt,
        OpenReveal,
        SaleReceipt,
        Session,
        Settlement,
        UpgradeReceipt,
        UpgradeReveal,
    },
    snapshot::Profile,
    storage::SnapshotStorage,
};
use anyhow::Context;
use std::time::Duration;
use tracing::{
    info,
    warn,
};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            AppError::Rejected(rejection) => Some(rejection),
            AppError::Storage(_) => None,
        }
    }
}

pub struct App<Storage, D, C> {
    session: Session<D, C>,
    storage: Storage,
}

impl<Storage: SnapshotStorage, D: DrawSource, C: Clock> App<Storage, D, C> {
    /// Restore the latest saved profile, or start a fresh one.
    pub fn load(
        catalog: Catalog,
        config: EngineConfig,
        storage: Storage,
        draws: D,
        clock: C,
    ) -> anyhow::Result<Self> {
        let session = match storage.latest_profile().context("load saved profile")? {
            Some(snapshot) => {
                info!(
                    balance = snapshot.ledger.balance,
                    items = snapshot.inventory.len(),
                    "restored profile"
                );
                Session::restore(catalog, config, snapshot, draws, clock)
                    .context("restore saved profile")?
            }
            None => {
                info!(balance = config.starting_balance, "starting fresh profile");
                Session::new(catalog, config, draws, clock)
            }
        };
        Ok(Self { session, storage })
    }

    pub fn session(&self) -> &Session<D, C> {
        &self.session
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn free_case_status(&self) -> FreeCaseStatus {
        self.session.free_case_status()
    }

    pub fn upgrade_targets(&self, source: ItemId) -> Result<Vec<&Item>, Rejection> {
        self.session.upgrade_targets(source)
    }

    pub fn upgrade_quote(&self, source: ItemId, chance: u8) -> Result<u64, Rejection> {
        self.session.upgrade_quote(source, chance)
    }

    /// Save the settled profile. A failed save puts `before` back so memory
    /// never runs ahead of storage.
    fn persist(&mut self, before: Profile) -> Result<(), AppError> {
        let saved = self
            .storage
            .save_profile(&self.session.snapshot())
            .context("save profile");
        if let Err(err) = saved {
            warn!(error = %format!("{err:#}"), "save failed, rolling back profile");
            self.session.rewind(before);
            return Err(err.into());
        }
        Ok(())
    }

    /// Settle a reservation left behind by a dropped reveal.
    fn settle_abandoned(&mut self) -> Result<Option<Settlement>, AppError> {
        let before = self.session.profile().clone();
        let Some(outcome) = self.session.settle_pending() else {
            return Ok(None);
        };
        let settlement = outcome?;
        warn!(?settlement, "settled an abandoned reveal");
        self.persist(before)?;
        Ok(Some(settlement))
    }

    pub async fn open_case(
        &mut self,
        case_id: CaseId,
        count: u32,
    ) -> Result<OpenReceipt, AppError> {
        self.open_case_revealing(case_id, count, |_| {}).await
    }

    /// Open, hand the pending rolls to `on_reveal`, wait out the reveal delay,
    /// then settle and save.
    pub async fn open_case_revealing(
        &mut self,
        case_id: CaseId,
        count: u32,
        on_reveal: impl FnOnce(&OpenReveal),
    ) -> Result<OpenReceipt, AppError> {
        self.settle_abandoned()?;
        let reveal = self.session.begin_open(case_id, count)?;
        on_reveal(&reveal);
        reveal_pause(reveal.delay).await;
        let before = self.session.profile().clone();
        let receipt = self.session.settle_open()?;
        self.persist(before)?;
        Ok(receipt)
    }

    pub async fn attempt_upgrade(
        &mut self,
        source: ItemId,
        target: &Item,
        chance: u8,
    ) -> Result<UpgradeReceipt, AppError> {
        self.attempt_upgrade_revealing(source, target, chance, |_| {})
            .await
    }

    pub async fn attempt_upgrade_revealing(
        &mut self,
        source: ItemId,
        target: &Item,
        chance: u8,
        on_reveal: impl FnOnce(&UpgradeReveal),
    ) -> Result<UpgradeReceipt, AppError> {
        self.settle_abandoned()?;
        let reveal = self.session.begin_upgrade(source, target, chance)?;
        on_reveal(&reveal);
        reveal_pause(reveal.delay).await;
        let before = self.session.profile().clone();
        let receipt = self.session.settle_upgrade()?;
        self.persist(before)?;
        Ok(receipt)
    }

    pub fn sell_item(&mut self, id: ItemId) -> Result<SaleReceipt, AppError> {
        self.settle_abandoned()?;
        let before = self.session.profile().clone();
        let receipt = self.session.sell_item(id)?;
        self.persist(before)?;
        Ok(receipt)
    }
}

async fn reveal_pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
