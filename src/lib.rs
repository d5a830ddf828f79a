pub mod app;
pub mod catalog;
pub mod config;
pub mod cooldown;
pub mod draw;
pub mod error;
pub mod inventory;
pub mod item;
pub mod ledger;
pub mod rarity;
pub mod roll;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod upgrade;

pub mod test_helpers;

pub use app::{
    App,
    AppError,
};
pub use catalog::{
    Case,
    CaseId,
    Catalog,
    DropTable,
};
pub use config::EngineConfig;
pub use cooldown::{
    Clock,
    FreeCaseStatus,
    ManualClock,
    SystemClock,
};
pub use draw::{
    DrawSource,
    RngDraws,
    ScriptedDraws,
};
pub use error::Rejection;
pub use item::{
    InventoryItem,
    Item,
    ItemId,
};
pub use ledger::Ledger;
pub use rarity::Rarity;
pub use session::Session;
pub use snapshot::ProfileSnapshot;
pub use upgrade::UpgradeRules;
