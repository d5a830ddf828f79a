use crate::{
    catalog::CaseId,
    item::ItemId,
};

/// Why the engine refused a request. A rejected request never changes state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("insufficient funds: {required} required, {available} available")]
    InsufficientFunds { required: u64, available: u64 },
    #[error("item {0} is not in the inventory")]
    ItemNotOwned(ItemId),
    #[error("free case is cooling down for another {remaining_ms} ms")]
    CooldownActive { remaining_ms: u64 },
    #[error("another open or upgrade is still being revealed")]
    OperationInFlight,
    #[error("nothing is waiting to be settled")]
    NothingInFlight,
    #[error("unknown case {0}")]
    UnknownCase(CaseId),
    #[error("cannot open {requested} cases at once (maximum {max})")]
    InvalidCount { requested: u32, max: u32 },
    #[error("a {0}% success chance is not offered")]
    InvalidChance(u8),
    #[error(
        "upgrade target worth {target_value} does not exceed source worth {source_value}"
    )]
    TargetNotHigher {
        source_value: u64,
        target_value: u64,
    },
}
