use crate::{
    catalog::{
        Case,
        CaseId,
        Catalog,
        DropTable,
    },
    config::EngineConfig,
    cooldown::ManualClock,
    draw::{
        RngDraws,
        ScriptedDraws,
    },
    item::Item,
    rarity::Rarity,
    session::Session,
    snapshot::Profile,
};
use chrono::{
    DateTime,
    Utc,
};
use rand::rngs::StdRng;

pub const FREE_CASE: CaseId = CaseId(0);
pub const FIXTURE_CASE: CaseId = CaseId(1);
/// Two legendary items worth 10 and 5000, nothing else.
pub const LEGENDARY_PAIR_CASE: CaseId = CaseId(2);
pub const FIXTURE_CASE_PRICE: u64 = 100;

pub fn start_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn fixture_items() -> Vec<Item> {
    vec![
        Item::new("Worn Pistol", Rarity::Common, 10),
        Item::new("Field Rifle", Rarity::Common, 40),
        Item::new("Polished Rifle", Rarity::Rare, 150),
        Item::new("Etched Knife", Rarity::Epic, 800),
        Item::new("Golden Sniper", Rarity::Legendary, 5000),
    ]
}

pub fn fixture_catalog() -> Catalog {
    let case = |id: CaseId, name: &str, price: u64, items: Vec<Item>| Case {
        id,
        name: name.to_string(),
        price,
        rarity: Rarity::Common,
        category: "fixture".to_string(),
        image: String::new(),
        drop_table: DropTable::new(items).expect("fixture drop table is non-empty"),
    };
    let cases = vec![
        case(FREE_CASE, "Free", 0, fixture_items()),
        case(FIXTURE_CASE, "Fixture", FIXTURE_CASE_PRICE, fixture_items()),
        case(
            LEGENDARY_PAIR_CASE,
            "Legendary Pair",
            FIXTURE_CASE_PRICE,
            vec![
                Item::new("Lucky Coin", Rarity::Legendary, 10),
                Item::new("Golden Sniper", Rarity::Legendary, 5000),
            ],
        ),
    ];
    Catalog::new(cases).expect("fixture catalog is valid")
}

pub struct TestContext {
    clock: ManualClock,
    config: EngineConfig,
}

impl TestContext {
    pub fn new() -> Self {
        Self {
            clock: ManualClock::new(start_time()),
            config: EngineConfig::default().instant(),
        }
    }

    pub fn with_balance(mut self, balance: u64) -> Self {
        self.config.starting_balance = balance;
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(&self) -> ManualClock {
        self.clock.clone()
    }

    pub fn config(&self) -> EngineConfig {
        self.config.clone()
    }

    pub fn scripted_session(
        &self,
        draws: impl IntoIterator<Item = f64>,
    ) -> Session<ScriptedDraws, ManualClock> {
        Session::new(
            fixture_catalog(),
            self.config.clone(),
            ScriptedDraws::new(draws),
            self.clock.clone(),
        )
    }

    /// Scripted session resumed from `profile` instead of a fresh one.
    pub fn resumed_session(
        &self,
        profile: &Profile,
        draws: impl IntoIterator<Item = f64>,
    ) -> Session<ScriptedDraws, ManualClock> {
        Session::restore(
            fixture_catalog(),
            self.config.clone(),
            profile.to_snapshot(),
            ScriptedDraws::new(draws),
            self.clock.clone(),
        )
        .expect("fixture profile is valid")
    }

    pub fn seeded_session(&self, seed: u64) -> Session<RngDraws<StdRng>, ManualClock> {
        Session::new(
            fixture_catalog(),
            self.config.clone(),
            RngDraws::seeded(seed),
            self.clock.clone(),
        )
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}
