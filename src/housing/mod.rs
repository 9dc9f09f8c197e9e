//! Luxury house leasing: the house catalog, per-player lease ledgers persisted in a
//! record store, and the trigger helpers built on top of them.

pub mod catalog;
pub mod clock;
pub mod errors;
pub mod fees;
pub mod ledger;
pub mod storage;
pub mod travel;
pub mod types;

pub use catalog::{default_houses, default_hub, HouseCatalog};
pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::LeaseError;
pub use fees::{
    buy_house, check_exit_fees, prepay_fees, CoinPurse, FeeCheck, Prepay, Purchase, Purse,
};
pub use ledger::Ledger;
pub use storage::{LeaseStore, LeaseStoreBuilder, RecordStore};
pub use travel::{depart_to_hub, leave_house, return_from_hub};
pub use types::*;
