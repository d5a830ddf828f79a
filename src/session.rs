//! The reward engine for a single profile.
//!
//! Opens and upgrades run in two phases. `begin_*` validates the request,
//! checks funds and makes every random draw, then parks the result as the
//! in-flight operation; nothing in the profile changes yet. `settle_*`
//! applies the parked result in one step. While something is parked every
//! other mutating request is refused with [`Rejection::OperationInFlight`].

use crate::{
    catalog::{
        Case,
        CaseId,
        Catalog,
    },
    config::EngineConfig,
    cooldown::{
        Clock,
        FreeCaseCooldown,
        FreeCaseStatus,
    },
    draw::DrawSource,
    error::Rejection,
    inventory::Inventory,
    item::{
        InventoryItem,
        Item,
        ItemId,
    },
    ledger::Ledger,
    roll::{
        self,
        RollResult,
    },
    snapshot::{
        Profile,
        ProfileSnapshot,
        SnapshotError,
    },
};
use std::time::Duration;
use tracing::{
    debug,
    info,
};

/// What the presentation layer gets while an open is being revealed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenReveal {
    pub case_id: CaseId,
    pub count: u32,
    pub cost: u64,
    pub rolls: Vec<RollResult>,
    pub delay: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpenReceipt {
    pub case_id: CaseId,
    pub items: Vec<InventoryItem>,
    pub cost: u64,
    pub awarded_value: u64,
    pub levels_gained: u32,
    pub ledger: Ledger,
}

/// What the presentation layer gets while an upgrade is being revealed.
/// The outcome stays hidden until settlement.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpgradeReveal {
    pub source: InventoryItem,
    pub target: Item,
    pub chance: u8,
    pub cost: u64,
    pub delay: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UpgradeReceipt {
    pub success: bool,
    pub consumed: InventoryItem,
    pub awarded: Option<InventoryItem>,
    pub cost: u64,
    pub ledger: Ledger,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaleReceipt {
    pub item: InventoryItem,
    pub ledger: Ledger,
}

#[derive(Clone, Debug)]
enum InFlight {
    Open {
        case_id: CaseId,
        count: u32,
        cost: u64,
        free: bool,
        rolls: Vec<RollResult>,
    },
    Upgrade {
        source: ItemId,
        target: Item,
        cost: u64,
        success: bool,
    },
}

pub struct Session<D, C> {
    catalog: Catalog,
    config: EngineConfig,
    cooldown: FreeCaseCooldown,
    profile: Profile,
    draws: D,
    clock: C,
    in_flight: Option<InFlight>,
}

impl<D: DrawSource, C: Clock> Session<D, C> {
    /// A session over a profile that has never been saved.
    pub fn new(catalog: Catalog, config: EngineConfig, draws: D, clock: C) -> Self {
        let profile = Profile::fresh(config.starting_balance);
        Self::with_profile(catalog, config, profile, draws, clock)
    }

    pub fn restore(
        catalog: Catalog,
        config: EngineConfig,
        snapshot: ProfileSnapshot,
        draws: D,
        clock: C,
    ) -> Result<Self, SnapshotError> {
        let profile = Profile::try_from(snapshot)?;
        Ok(Self::with_profile(catalog, config, profile, draws, clock))
    }

    fn with_profile(
        catalog: Catalog,
        config: EngineConfig,
        profile: Profile,
        draws: D,
        clock: C,
    ) -> Self {
        let cooldown = config.free_case_cooldown();
        Self {
            catalog,
            config,
            cooldown,
            profile,
            draws,
            clock,
            in_flight: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &Ledger {
        &self.profile.ledger
    }

    pub fn inventory(&self) -> &Inventory {
        &self.profile.inventory
    }

    pub fn snapshot(&self) -> ProfileSnapshot {
        self.profile.to_snapshot()
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Put back a profile taken earlier with [`Session::profile`]. Drops any
    /// parked reservation.
    pub fn rewind(&mut self, profile: Profile) {
        self.profile = profile;
        self.in_flight = None;
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn free_case_status(&self) -> FreeCaseStatus {
        self.cooldown
            .status(self.profile.last_free_case, self.clock.now())
    }

    fn ensure_idle(&self) -> Result<(), Rejection> {
        if self.in_flight.is_some() {
            return Err(Rejection::OperationInFlight);
        }
        Ok(())
    }

    fn owned(&self, id: ItemId) -> Result<&InventoryItem, Rejection> {
        self.profile
            .inventory
            .get(id)
            .ok_or(Rejection::ItemNotOwned(id))
    }

    /// Cost and effective count of opening `count` of `case`.
    fn open_terms(&self, case: &Case, count: u32) -> Result<(u64, u32), Rejection> {
        if case.is_free() {
            self.cooldown
                .ensure_ready(self.profile.last_free_case, self.clock.now())?;
            return Ok((0, 1));
        }
        let max = self.config.max_open_count;
        if count == 0 || count > max {
            return Err(Rejection::InvalidCount {
                requested: count,
                max,
            });
        }
        Ok((case.price.saturating_mul(u64::from(count)), count))
    }

    /// Validate, charge-check and roll an open without applying it.
    pub fn begin_open(
        &mut self,
        case_id: CaseId,
        count: u32,
    ) -> Result<OpenReveal, Rejection> {
        self.ensure_idle()?;
        let case = self
            .catalog
            .case(case_id)
            .ok_or(Rejection::UnknownCase(case_id))?;
        let (cost, count) = self.open_terms(case, count)?;
        self.profile.ledger.ensure_affordable(cost)?;

        let rolls = roll::roll_many(&case.drop_table, count, &mut self.draws);
        let free = case.is_free();
        debug!(%case_id, count, cost, free, "open reserved");

        self.in_flight = Some(InFlight::Open {
            case_id,
            count,
            cost,
            free,
            rolls: rolls.clone(),
        });
        Ok(OpenReveal {
            case_id,
            count,
            cost,
            rolls,
            delay: self.config.reveal_delay(),
        })
    }

    /// Apply the reserved open: charge, credit items, progress.
    pub fn settle_open(&mut self) -> Result<OpenReceipt, Rejection> {
        let Some(InFlight::Open {
            case_id,
            count,
            cost,
            free,
            rolls,
        }) = self.in_flight.take_if(|f| matches!(f, InFlight::Open { .. }))
        else {
            return Err(Rejection::NothingInFlight);
        };

        let now = self.clock.now();
        let awarded_value = roll::total_value(&rolls);
        let levels_gained = self.profile.ledger.record_open(cost, count, awarded_value);
        let items: Vec<InventoryItem> = rolls
            .into_iter()
            .map(|r| self.profile.inventory.grant(r.item, now))
            .collect();
        if free {
            self.profile.last_free_case = Some(now);
        }

        info!(
            %case_id,
            count,
            cost,
            awarded_value,
            balance = self.profile.ledger.balance,
            "case opened"
        );
        if levels_gained > 0 {
            info!(level = self.profile.ledger.level, levels_gained, "level up");
        }

        Ok(OpenReceipt {
            case_id,
            items,
            cost,
            awarded_value,
            levels_gained,
            ledger: self.profile.ledger.clone(),
        })
    }

    /// Open and settle in one call, without a reveal pause.
    pub fn open_case(
        &mut self,
        case_id: CaseId,
        count: u32,
    ) -> Result<OpenReceipt, Rejection> {
        self.begin_open(case_id, count)?;
        self.settle_open()
    }

    pub fn sell_item(&mut self, id: ItemId) -> Result<SaleReceipt, Rejection> {
        self.ensure_idle()?;
        let item = self
            .profile
            .inventory
            .take(id)
            .ok_or(Rejection::ItemNotOwned(id))?;
        self.profile.ledger.record_sale(item.value());
        info!(
            item = %item.id,
            value = item.value(),
            balance = self.profile.ledger.balance,
            "item sold"
        );
        Ok(SaleReceipt {
            item,
            ledger: self.profile.ledger.clone(),
        })
    }

    /// Catalog items the given owned item may be upgraded into.
    pub fn upgrade_targets(&self, source: ItemId) -> Result<Vec<&Item>, Rejection> {
        let source = self.owned(source)?;
        Ok(self
            .config
            .upgrade
            .targets(source.value(), self.catalog.items()))
    }

    /// Price of an upgrade attempt at `chance` percent.
    pub fn upgrade_quote(&self, source: ItemId, chance: u8) -> Result<u64, Rejection> {
        let source = self.owned(source)?;
        self.config.upgrade.validate_chance(chance)?;
        Ok(self.config.upgrade.cost(source.value(), chance))
    }

    /// Validate, charge-check and draw an upgrade without applying it.
    pub fn begin_upgrade(
        &mut self,
        source: ItemId,
        target: &Item,
        chance: u8,
    ) -> Result<UpgradeReveal, Rejection> {
        self.ensure_idle()?;
        let source_item = self.owned(source)?.clone();
        if target.value <= source_item.value() {
            return Err(Rejection::TargetNotHigher {
                source_value: source_item.value(),
                target_value: target.value,
            });
        }
        let rules = &self.config.upgrade;
        rules.validate_chance(chance)?;
        let cost = rules.cost(source_item.value(), chance);
        self.profile.ledger.ensure_affordable(cost)?;

        let draw = self.draws.percent();
        let success = self.config.upgrade.is_success(draw, chance);
        debug!(source = %source, target = %target.name, chance, cost, "upgrade reserved");

        self.in_flight = Some(InFlight::Upgrade {
            source,
            target: target.clone(),
            cost,
            success,
        });
        Ok(UpgradeReveal {
            source: source_item,
            target: target.clone(),
            chance,
            cost,
            delay: self.config.reveal_delay(),
        })
    }

    /// Apply the reserved upgrade: the source is always consumed.
    pub fn settle_upgrade(&mut self) -> Result<UpgradeReceipt, Rejection> {
        let Some(InFlight::Upgrade {
            source,
            target,
            cost,
            success,
        }) = self
            .in_flight
            .take_if(|f| matches!(f, InFlight::Upgrade { .. }))
        else {
            return Err(Rejection::NothingInFlight);
        };

        // the gate kept every other mutation out since begin_upgrade
        let consumed = self
            .profile
            .inventory
            .take(source)
            .ok_or(Rejection::ItemNotOwned(source))?;
        let now = self.clock.now();
        let awarded = success.then(|| self.profile.inventory.grant(target, now));
        self.profile
            .ledger
            .record_upgrade(cost, awarded.as_ref().map(InventoryItem::value));

        info!(
            source = %consumed.id,
            success,
            cost,
            balance = self.profile.ledger.balance,
            "upgrade settled"
        );

        Ok(UpgradeReceipt {
            success,
            consumed,
            awarded,
            cost,
            ledger: self.profile.ledger.clone(),
        })
    }

    /// Upgrade and settle in one call, without a reveal pause.
    pub fn attempt_upgrade(
        &mut self,
        source: ItemId,
        target: &Item,
        chance: u8,
    ) -> Result<UpgradeReceipt, Rejection> {
        self.begin_upgrade(source, target, chance)?;
        self.settle_upgrade()
    }

    /// Settle whatever is parked, if anything. Used when a reveal was abandoned.
    pub fn settle_pending(&mut self) -> Option<Result<Settlement, Rejection>> {
        match self.in_flight.as_ref()? {
            InFlight::Open { .. } => Some(self.settle_open().map(Settlement::Opened)),
            InFlight::Upgrade { .. } => {
                Some(self.settle_upgrade().map(Settlement::Upgraded))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Settlement {
    Opened(OpenReceipt),
    Upgraded(UpgradeReceipt),
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use crate::{
        cooldown::ManualClock,
        draw::ScriptedDraws,
        ledger::EXPERIENCE_PER_ITEM,
        rarity::Rarity,
        test_helpers::{
            FIXTURE_CASE,
            FREE_CASE,
            fixture_catalog,
            start_time,
        },
    };
    use chrono::TimeDelta;

    fn session(
        draws: impl IntoIterator<Item = f64>,
    ) -> (Session<ScriptedDraws, ManualClock>, ManualClock) {
        let clock = ManualClock::new(start_time());
        let session = Session::new(
            fixture_catalog(),
            EngineConfig::default().instant(),
            ScriptedDraws::new(draws),
            clock.clone(),
        );
        (session, clock)
    }

    #[test]
    fn begin_open__leaves_profile_untouched_until_settled() {
        // given
        let (mut session, _) = session([0.1, 0.0]);
        let before = session.snapshot();

        // when
        let reveal = session.begin_open(FIXTURE_CASE, 1).unwrap();

        // then
        assert_eq!(reveal.rolls.len(), 1);
        assert_eq!(session.snapshot(), before);
        assert!(session.is_busy());
    }

    #[test]
    fn begin_open__rejects_while_another_is_in_flight() {
        // given
        let (mut session, _) = session([0.1, 0.0]);
        session.begin_open(FIXTURE_CASE, 1).unwrap();

        // when
        let second = session.begin_open(FIXTURE_CASE, 1);
        let sale = session.sell_item(ItemId(0));

        // then
        assert_eq!(second, Err(Rejection::OperationInFlight));
        assert_eq!(sale, Err(Rejection::OperationInFlight));
    }

    #[test]
    fn settle_open__applies_rolled_items_and_frees_the_gate() {
        // given
        let (mut session, _) = session([0.1, 0.0]);
        let reveal = session.begin_open(FIXTURE_CASE, 1).unwrap();

        // when
        let receipt = session.settle_open().unwrap();

        // then
        assert_eq!(receipt.items.len(), 1);
        assert!(receipt.items[0].is_instance_of(&reveal.rolls[0].item));
        assert_eq!(receipt.ledger.total_opened, 1);
        assert_eq!(receipt.ledger.exp, EXPERIENCE_PER_ITEM);
        assert!(!session.is_busy());
    }

    #[test]
    fn settle_open__without_reservation_is_rejected() {
        // given
        let (mut session, _) = session([0.5]);

        // when
        let result = session.settle_open();

        // then
        assert_eq!(result, Err(Rejection::NothingInFlight));
    }

    #[test]
    fn settle_upgrade__does_not_consume_a_parked_open() {
        // given
        let (mut session, _) = session([0.1, 0.0]);
        session.begin_open(FIXTURE_CASE, 1).unwrap();

        // when
        let result = session.settle_upgrade();

        // then
        assert_eq!(result, Err(Rejection::NothingInFlight));
        assert!(session.is_busy());
        assert!(session.settle_open().is_ok());
    }

    #[test]
    fn open_case__rejects_zero_and_oversized_counts() {
        // given
        let (mut session, _) = session([0.1]);
        let max = session.config().max_open_count;

        // then
        assert_eq!(
            session.open_case(FIXTURE_CASE, 0),
            Err(Rejection::InvalidCount { requested: 0, max })
        );
        assert_eq!(
            session.open_case(FIXTURE_CASE, max + 1),
            Err(Rejection::InvalidCount {
                requested: max + 1,
                max
            })
        );
    }

    #[test]
    fn open_case__free_case_counts_as_one_and_costs_nothing() {
        // given
        let (mut session, clock) = session([0.1, 0.0]);
        let balance = session.ledger().balance;

        // when
        let receipt = session.open_case(FREE_CASE, 4).unwrap();

        // then
        assert_eq!(receipt.items.len(), 1);
        assert_eq!(receipt.cost, 0);
        assert_eq!(receipt.ledger.balance, balance);
        assert_eq!(session.snapshot().last_free_case, Some(clock.now()));
    }

    #[test]
    fn open_case__free_case_cooldown_blocks_until_window_passes() {
        // given
        let (mut session, clock) = session([0.1, 0.0]);
        session.open_case(FREE_CASE, 1).unwrap();

        // when
        clock.advance(TimeDelta::seconds(299));
        let early = session.open_case(FREE_CASE, 1);
        clock.advance(TimeDelta::seconds(1));
        let on_time = session.open_case(FREE_CASE, 1);

        // then
        assert_eq!(early, Err(Rejection::CooldownActive { remaining_ms: 1_000 }));
        assert!(on_time.is_ok());
    }

    #[test]
    fn upgrade_targets__lists_catalog_items_within_multiplier() {
        // given
        let (mut session, _) = session([0.1, 0.0]);
        let item = session.open_case(FIXTURE_CASE, 1).unwrap().items[0].clone();

        // when
        let targets = session.upgrade_targets(item.id).unwrap();

        // then
        assert!(!targets.is_empty());
        let ceiling = item.value() * session.config().upgrade.max_value_multiplier;
        assert!(targets.iter().all(|t| t.value > item.value() && t.value <= ceiling));
    }

    #[test]
    fn begin_upgrade__rejects_targets_not_worth_more() {
        // given
        let (mut session, _) = session([0.1, 0.0]);
        let item = session.open_case(FIXTURE_CASE, 1).unwrap().items[0].clone();
        let same = item.item.clone();

        // when
        let result = session.begin_upgrade(item.id, &same, 50);

        // then
        assert_eq!(
            result,
            Err(Rejection::TargetNotHigher {
                source_value: item.value(),
                target_value: item.value()
            })
        );
        assert!(!session.is_busy());
    }

    #[test]
    fn upgrade_quote__prices_by_chance() {
        // given
        let (mut session, _) = session([0.1, 0.0]);
        let item = session.open_case(FIXTURE_CASE, 1).unwrap().items[0].clone();

        // when
        let cheap = session.upgrade_quote(item.id, 90).unwrap();
        let dear = session.upgrade_quote(item.id, 10).unwrap();

        // then
        assert!(cheap < dear);
        assert_eq!(session.upgrade_quote(item.id, 7), Err(Rejection::InvalidChance(7)));
    }

    #[test]
    fn settle_pending__completes_an_abandoned_upgrade() {
        // given
        let (mut session, _) = session([0.1, 0.0, 0.99]);
        let item = session.open_case(FIXTURE_CASE, 1).unwrap().items[0].clone();
        let target = Item::new("Prize", Rarity::Epic, item.value() * 2);
        session.begin_upgrade(item.id, &target, 50).unwrap();

        // when
        let settled = session.settle_pending();

        // then
        match settled {
            Some(Ok(Settlement::Upgraded(receipt))) => {
                assert!(!receipt.success);
                assert_eq!(receipt.consumed.id, item.id);
            }
            other => panic!("unexpected settlement {other:?}"),
        }
        assert!(session.settle_pending().is_none());
    }
}
