//! Per-player lease ledger.
//!
//! A [`Ledger`] is bound to one player and one house for the duration of a single
//! trigger invocation. The backing record is fetched lazily on first use. Read-only
//! operations never create a record; `purchase` does. Every mutation rewrites both
//! record fields from the loaded ledger, so a save never clobbers the other field.

use chrono::{TimeZone, Utc};
use log::{debug, info, warn};

use crate::housing::catalog::HouseCatalog;
use crate::housing::clock::Clock;
use crate::housing::errors::LeaseError;
use crate::housing::storage::RecordStore;
use crate::housing::types::{
    HouseDefinition, OwnedHouseRecord, PlayerInfoRecord, PlayerLedger, PLAYER_INFO_TAG,
    SECONDS_PER_DAY,
};

const EXPIRY_LABEL_FORMAT: &str = "%d %B %Y %H:%M:%S UTC";

enum Loaded {
    /// The store has no record for this player.
    Absent,
    Present {
        record: PlayerInfoRecord,
        ledger: PlayerLedger,
    },
}

pub struct Ledger<'a, S: RecordStore + ?Sized, C: Clock + ?Sized> {
    catalog: &'a HouseCatalog,
    store: &'a S,
    clock: &'a C,
    player: String,
    house: String,
    loaded: Option<Loaded>,
}

impl<'a, S: RecordStore + ?Sized, C: Clock + ?Sized> Ledger<'a, S, C> {
    pub fn new(
        catalog: &'a HouseCatalog,
        store: &'a S,
        clock: &'a C,
        player: &str,
        house: &str,
    ) -> Self {
        Self {
            catalog,
            store,
            clock,
            player: player.to_string(),
            house: house.to_string(),
            loaded: None,
        }
    }

    pub fn player(&self) -> &str {
        &self.player
    }

    pub fn house(&self) -> &str {
        &self.house
    }

    /// Rebind to another house. The loaded record stays valid since it is per player.
    pub fn set_house(&mut self, house: &str) {
        self.house = house.to_string();
    }

    pub fn catalog(&self) -> &'a HouseCatalog {
        self.catalog
    }

    /// Lease terms of the bound house.
    pub fn definition(&self) -> Result<&'a HouseDefinition, LeaseError> {
        self.catalog.get_definition(&self.house)
    }

    fn ensure_loaded(&mut self) -> Result<(), LeaseError> {
        if self.loaded.is_some() {
            return Ok(());
        }
        let loaded = match self.store.get_record(&self.player, PLAYER_INFO_TAG)? {
            Some(record) => {
                let ledger = PlayerLedger::decode(&record)?;
                debug!(
                    "loaded {} houses for {}",
                    ledger.owned_houses.len(),
                    self.player
                );
                Loaded::Present { record, ledger }
            }
            None => {
                debug!("no {} record for {}", PLAYER_INFO_TAG, self.player);
                Loaded::Absent
            }
        };
        self.loaded = Some(loaded);
        Ok(())
    }

    /// Load, creating the record if the player has none yet.
    fn ensure_record(&mut self) -> Result<(), LeaseError> {
        self.ensure_loaded()?;
        if matches!(self.loaded, Some(Loaded::Absent)) {
            let record = self.store.create_record(&self.player, PLAYER_INFO_TAG)?;
            let ledger = PlayerLedger::decode(&record)?;
            self.loaded = Some(Loaded::Present { record, ledger });
        }
        Ok(())
    }

    fn ledger(&mut self) -> Result<Option<&PlayerLedger>, LeaseError> {
        self.ensure_loaded()?;
        Ok(match &self.loaded {
            Some(Loaded::Present { ledger, .. }) => Some(ledger),
            _ => None,
        })
    }

    fn ledger_mut(&mut self) -> Option<&mut PlayerLedger> {
        match &mut self.loaded {
            Some(Loaded::Present { ledger, .. }) => Some(ledger),
            _ => None,
        }
    }

    fn entry(&mut self) -> Result<Option<&OwnedHouseRecord>, LeaseError> {
        let house = self.house.clone();
        Ok(self.ledger()?.and_then(|ledger| ledger.find(&house)))
    }

    fn save(&mut self) -> Result<(), LeaseError> {
        let Some(Loaded::Present { record, ledger }) = &mut self.loaded else {
            return Ok(());
        };
        ledger.encode_into(record)?;
        self.store.put_record(&self.player, PLAYER_INFO_TAG, record)
    }

    /// Record the purchase of the bound house, crediting its prepaid days.
    ///
    /// Returns `false` without writing anything when the player already owns it.
    pub fn purchase(&mut self) -> Result<bool, LeaseError> {
        let prepaid_days = self.definition()?.prepaid_days_on_purchase;
        self.ensure_record()?;
        if self.entry()?.is_some() {
            warn!(
                "{} already owns {}; purchase ignored",
                self.player, self.house
            );
            return Ok(false);
        }
        let paid_until = self.clock.now() + i64::from(prepaid_days) * SECONDS_PER_DAY;
        let house_id = self.house.clone();
        if let Some(ledger) = self.ledger_mut() {
            ledger.owned_houses.push(OwnedHouseRecord {
                house_id,
                paid_until,
            });
        }
        self.save()?;
        info!(
            "{} purchased {} (fees paid until {})",
            self.player, self.house, paid_until
        );
        Ok(true)
    }

    pub fn has_house(&mut self) -> Result<bool, LeaseError> {
        Ok(self.entry()?.is_some())
    }

    /// `None` when the player does not own the house. Expired once `paid_until` is in
    /// the past; the lease still holds during the `paid_until` second itself.
    pub fn is_fee_expired(&mut self) -> Result<Option<bool>, LeaseError> {
        let now = self.clock.now();
        Ok(self.entry()?.map(|h| h.paid_until < now))
    }

    /// Extend the lease by `days`. Not capped by `max_prepaid_days`; callers cap.
    ///
    /// Returns `false` (and writes nothing) when the house is not owned.
    pub fn pay_fees(&mut self, days: u32) -> Result<bool, LeaseError> {
        self.ensure_loaded()?;
        let house = self.house.clone();
        let Some(entry) = self.ledger_mut().and_then(|l| l.find_mut(&house)) else {
            debug!("{} does not own {}; fee payment skipped", self.player, house);
            return Ok(false);
        };
        entry.paid_until += i64::from(days) * SECONDS_PER_DAY;
        let paid_until = entry.paid_until;
        self.save()?;
        info!(
            "{} paid {} days of fees for {} (now paid until {})",
            self.player, days, house, paid_until
        );
        Ok(true)
    }

    /// Fee for `days` days of the bound house. Pure; ownership is irrelevant.
    pub fn fee_cost_for_days(&self, days: u32) -> Result<i64, LeaseError> {
        Ok(self.definition()?.daily_fee * i64::from(days))
    }

    pub fn paid_until(&mut self) -> Result<Option<i64>, LeaseError> {
        Ok(self.entry()?.map(|h| h.paid_until))
    }

    /// Seconds of prepaid fees left. Negative once lapsed.
    pub fn seconds_remaining(&mut self) -> Result<Option<i64>, LeaseError> {
        let now = self.clock.now();
        Ok(self.entry()?.map(|h| h.paid_until - now))
    }

    /// Whole days of prepaid fees left, rounded down. Negative once lapsed.
    pub fn days_remaining(&mut self) -> Result<Option<i64>, LeaseError> {
        let now = self.clock.now();
        Ok(self
            .entry()?
            .map(|h| (h.paid_until - now).div_euclid(SECONDS_PER_DAY)))
    }

    /// Expiry of the prepaid fees, e.g. `24 November 2023 22:13:20 UTC`.
    pub fn expiry_date_label(&mut self) -> Result<Option<String>, LeaseError> {
        let Some(paid_until) = self.paid_until()? else {
            return Ok(None);
        };
        let date = Utc
            .timestamp_opt(paid_until, 0)
            .single()
            .ok_or(LeaseError::InvalidTimestamp(paid_until))?;
        Ok(Some(date.format(EXPIRY_LABEL_FORMAT).to_string()))
    }

    /// Houses the player owns, in purchase order.
    pub fn owned_houses(&mut self) -> Result<&[OwnedHouseRecord], LeaseError> {
        Ok(self
            .ledger()?
            .map(|l| l.owned_houses.as_slice())
            .unwrap_or(&[]))
    }

    pub fn last_house_visited(&mut self) -> Result<Option<String>, LeaseError> {
        Ok(self.ledger()?.and_then(|l| l.last_house_visited.clone()))
    }

    /// Remember the house the player just left.
    ///
    /// Owned houses are preserved. Returns `false` when the player has no record, in
    /// which case nothing is created.
    pub fn set_last_house_visited(&mut self, value: &str) -> Result<bool, LeaseError> {
        self.ensure_loaded()?;
        let Some(ledger) = self.ledger_mut() else {
            debug!("no record for {}; last house not stored", self.player);
            return Ok(false);
        };
        ledger.last_house_visited = Some(value.to_string());
        self.save()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::housing::clock::ManualClock;
    use crate::housing::storage::{LeaseStore, LeaseStoreBuilder};
    use tempfile::TempDir;

    const T0: i64 = 1_700_000_000;

    fn setup() -> (TempDir, LeaseStore, HouseCatalog, ManualClock) {
        let dir = TempDir::new().expect("tempdir");
        let store = LeaseStoreBuilder::new(dir.path()).open().expect("store");
        (dir, store, HouseCatalog::default(), ManualClock::new(T0))
    }

    struct OfflineStore;

    impl RecordStore for OfflineStore {
        fn get_record(
            &self,
            _: &str,
            _: &str,
        ) -> Result<Option<PlayerInfoRecord>, LeaseError> {
            Err(LeaseError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "store offline",
            )))
        }

        fn create_record(&self, _: &str, _: &str) -> Result<PlayerInfoRecord, LeaseError> {
            Err(LeaseError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "store offline",
            )))
        }

        fn put_record(&self, _: &str, _: &str, _: &PlayerInfoRecord) -> Result<(), LeaseError> {
            Err(LeaseError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "store offline",
            )))
        }
    }

    #[test]
    fn queries_on_absent_record_create_nothing() {
        let (_dir, store, catalog, clock) = setup();
        let mut ledger = Ledger::new(&catalog, &store, &clock, "alice", "greyton");
        assert!(!ledger.has_house().expect("has"));
        assert_eq!(ledger.is_fee_expired().expect("expired"), None);
        assert_eq!(ledger.days_remaining().expect("days"), None);
        assert_eq!(ledger.expiry_date_label().expect("label"), None);
        assert_eq!(ledger.last_house_visited().expect("last"), None);
        assert!(!ledger.pay_fees(5).expect("pay"));
        assert!(!ledger.set_last_house_visited("greyton").expect("set"));
        assert!(store
            .get_record("alice", PLAYER_INFO_TAG)
            .expect("get")
            .is_none());
    }

    #[test]
    fn purchase_credits_prepaid_days() {
        let (_dir, store, catalog, clock) = setup();
        let mut ledger = Ledger::new(&catalog, &store, &clock, "alice", "greyton");
        assert!(ledger.purchase().expect("purchase"));
        assert!(ledger.has_house().expect("has"));
        assert_eq!(ledger.days_remaining().expect("days"), Some(10));
        assert_eq!(ledger.paid_until().expect("paid"), Some(T0 + 10 * SECONDS_PER_DAY));
        assert_eq!(ledger.is_fee_expired().expect("expired"), Some(false));
        assert_eq!(
            ledger.expiry_date_label().expect("label").as_deref(),
            Some("24 November 2023 22:13:20 UTC")
        );
    }

    #[test]
    fn second_purchase_is_ignored() {
        let (_dir, store, catalog, clock) = setup();
        let mut ledger = Ledger::new(&catalog, &store, &clock, "alice", "greyton");
        assert!(ledger.purchase().expect("purchase"));
        clock.advance(3 * SECONDS_PER_DAY);
        assert!(!ledger.purchase().expect("second purchase"));
        assert_eq!(ledger.owned_houses().expect("owned").len(), 1);
        assert_eq!(ledger.days_remaining().expect("days"), Some(7));
    }

    #[test]
    fn purchase_of_unknown_house_fails() {
        let (_dir, store, catalog, clock) = setup();
        let mut ledger = Ledger::new(&catalog, &store, &clock, "alice", "atlantis");
        assert!(matches!(ledger.purchase(), Err(LeaseError::NotFound(_))));
        assert!(store
            .get_record("alice", PLAYER_INFO_TAG)
            .expect("get")
            .is_none());
    }

    #[test]
    fn pay_fees_extends_by_whole_days() {
        let (_dir, store, catalog, clock) = setup();
        let mut ledger = Ledger::new(&catalog, &store, &clock, "alice", "greyton");
        ledger.purchase().expect("purchase");
        for days in [0u32, 1, 3, 45] {
            let before = ledger.days_remaining().expect("days").expect("owned");
            assert!(ledger.pay_fees(days).expect("pay"));
            let after = ledger.days_remaining().expect("days").expect("owned");
            assert_eq!(after - before, i64::from(days));
        }
    }

    #[test]
    fn pay_fees_is_not_capped() {
        let (_dir, store, catalog, clock) = setup();
        let mut ledger = Ledger::new(&catalog, &store, &clock, "alice", "greyton");
        ledger.purchase().expect("purchase");
        ledger.pay_fees(500).expect("pay");
        assert_eq!(ledger.days_remaining().expect("days"), Some(510));
    }

    #[test]
    fn lease_holds_through_paid_until() {
        let (_dir, store, catalog, clock) = setup();
        let mut ledger = Ledger::new(&catalog, &store, &clock, "alice", "greyton");
        ledger.purchase().expect("purchase");
        let paid_until = ledger.paid_until().expect("paid").expect("owned");
        clock.set(paid_until - 1);
        assert_eq!(ledger.is_fee_expired().expect("expired"), Some(false));
        assert_eq!(ledger.days_remaining().expect("days"), Some(0));
        clock.set(paid_until);
        assert_eq!(ledger.is_fee_expired().expect("expired"), Some(false));
        assert_eq!(ledger.days_remaining().expect("days"), Some(0));
        assert_eq!(ledger.seconds_remaining().expect("secs"), Some(0));
        clock.set(paid_until + 1);
        assert_eq!(ledger.is_fee_expired().expect("expired"), Some(true));
        assert_eq!(ledger.days_remaining().expect("days"), Some(-1));
    }

    #[test]
    fn lapsed_days_round_down() {
        let (_dir, store, catalog, clock) = setup();
        let mut ledger = Ledger::new(&catalog, &store, &clock, "alice", "greyton");
        ledger.purchase().expect("purchase");
        clock.advance(12 * SECONDS_PER_DAY + 60);
        assert_eq!(ledger.days_remaining().expect("days"), Some(-3));
    }

    #[test]
    fn fee_cost_ignores_ownership() {
        let (_dir, store, catalog, clock) = setup();
        let ledger = Ledger::new(&catalog, &store, &clock, "nobody", "greyton");
        assert_eq!(ledger.fee_cost_for_days(3).expect("cost"), 22_500);
        assert_eq!(ledger.fee_cost_for_days(0).expect("cost"), 0);
        let unknown = Ledger::new(&catalog, &store, &clock, "nobody", "atlantis");
        assert!(matches!(
            unknown.fee_cost_for_days(1),
            Err(LeaseError::NotFound(_))
        ));
    }

    #[test]
    fn last_house_survives_fee_payment() {
        let (_dir, store, catalog, clock) = setup();
        {
            let mut ledger = Ledger::new(&catalog, &store, &clock, "alice", "greyton");
            ledger.purchase().expect("purchase");
            assert!(ledger.set_last_house_visited("greyton").expect("set"));
        }
        {
            let mut ledger = Ledger::new(&catalog, &store, &clock, "alice", "greyton");
            assert!(ledger.pay_fees(2).expect("pay"));
        }
        let mut ledger = Ledger::new(&catalog, &store, &clock, "alice", "greyton");
        assert_eq!(
            ledger.last_house_visited().expect("last").as_deref(),
            Some("greyton")
        );
        assert_eq!(ledger.days_remaining().expect("days"), Some(12));
    }

    #[test]
    fn set_house_rebinds_without_reload() {
        let (_dir, store, catalog, clock) = setup();
        let mut ledger = Ledger::new(&catalog, &store, &clock, "alice", "greyton");
        ledger.purchase().expect("purchase");
        ledger.set_house("brynknot");
        assert_eq!(ledger.house(), "brynknot");
        assert!(!ledger.has_house().expect("has"));
        assert_eq!(ledger.days_remaining().expect("days"), None);
        ledger.set_house("greyton");
        assert!(ledger.has_house().expect("has"));
    }

    #[test]
    fn store_failures_propagate() {
        let catalog = HouseCatalog::default();
        let clock = ManualClock::new(T0);
        let store = OfflineStore;
        let mut ledger = Ledger::new(&catalog, &store, &clock, "alice", "greyton");
        assert!(matches!(ledger.has_house(), Err(LeaseError::Io(_))));
        assert!(matches!(ledger.purchase(), Err(LeaseError::Io(_))));
    }
}
