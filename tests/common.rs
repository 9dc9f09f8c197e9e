//! Test utilities & fixtures.
//! Provides throwaway sled stores and a clock pinned to a known instant.

use luxhouse::housing::{HouseCatalog, LeaseStore, LeaseStoreBuilder, ManualClock};
use tempfile::TempDir;

/// 14 November 2023 22:13:20 UTC.
pub const T0: i64 = 1_700_000_000;

pub struct Fixture {
    pub store: LeaseStore,
    pub catalog: HouseCatalog,
    pub clock: ManualClock,
    // Dropped last so the database closes before its directory goes away.
    _dir: TempDir,
}

#[allow(dead_code)] // Not every test file needs a fresh store.
pub fn fixture() -> Fixture {
    let dir = TempDir::new().expect("tempdir");
    let store = LeaseStoreBuilder::new(dir.path()).open().expect("store");
    Fixture {
        store,
        catalog: HouseCatalog::default(),
        clock: ManualClock::new(T0),
        _dir: dir,
    }
}
