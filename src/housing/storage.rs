use std::path::{Path, PathBuf};

use log::debug;
use sled::IVec;

use crate::housing::errors::LeaseError;
use crate::housing::types::{PlayerInfoRecord, PLAYER_INFO_SCHEMA_VERSION};

const TREE_PLAYER_INFO: &str = "player_info";

/// Per-player, per-tag record store the ledger persists through.
///
/// Every call is a single attempt; failures propagate to the caller unchanged.
pub trait RecordStore {
    /// Fetch the record for `player` under `tag`, if one exists.
    fn get_record(&self, player: &str, tag: &str) -> Result<Option<PlayerInfoRecord>, LeaseError>;

    /// Create and store an empty record for `player` under `tag`.
    fn create_record(&self, player: &str, tag: &str) -> Result<PlayerInfoRecord, LeaseError>;

    /// Replace the stored record as one atomic update.
    fn put_record(
        &self,
        player: &str,
        tag: &str,
        record: &PlayerInfoRecord,
    ) -> Result<(), LeaseError>;
}

/// Helper builder so tests can easily create throwaway stores with custom paths.
pub struct LeaseStoreBuilder {
    path: PathBuf,
}

impl LeaseStoreBuilder {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn open(self) -> Result<LeaseStore, LeaseError> {
        LeaseStore::open(self.path)
    }
}

/// Sled-backed player info records.
pub struct LeaseStore {
    _db: sled::Db,
    records: sled::Tree,
}

impl LeaseStore {
    /// Open (or create) the store rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LeaseError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        let records = db.open_tree(TREE_PLAYER_INFO)?;
        Ok(Self { _db: db, records })
    }

    fn record_key(player: &str, tag: &str) -> Vec<u8> {
        format!("player_info:{}:{}", player.to_ascii_lowercase(), tag).into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, LeaseError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, LeaseError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }

    /// List the players holding a record under `tag`.
    pub fn list_players(&self, tag: &str) -> Result<Vec<String>, LeaseError> {
        let suffix = format!(":{}", tag);
        let mut ids = Vec::new();
        for entry in self.records.scan_prefix(b"player_info:") {
            let (key, _) = entry?;
            let text = String::from_utf8_lossy(&key);
            if let Some(rest) = text.strip_prefix("player_info:") {
                if let Some(player) = rest.strip_suffix(suffix.as_str()) {
                    ids.push(player.to_string());
                }
            }
        }
        Ok(ids)
    }
}

impl RecordStore for LeaseStore {
    fn get_record(&self, player: &str, tag: &str) -> Result<Option<PlayerInfoRecord>, LeaseError> {
        let key = Self::record_key(player, tag);
        let Some(bytes) = self.records.get(&key)? else {
            return Ok(None);
        };
        let record: PlayerInfoRecord = Self::deserialize(bytes)?;
        if record.schema_version != PLAYER_INFO_SCHEMA_VERSION {
            return Err(LeaseError::SchemaMismatch {
                entity: "player_info",
                expected: PLAYER_INFO_SCHEMA_VERSION,
                found: record.schema_version,
            });
        }
        Ok(Some(record))
    }

    fn create_record(&self, player: &str, tag: &str) -> Result<PlayerInfoRecord, LeaseError> {
        debug!("creating {} record for {}", tag, player);
        let record = PlayerInfoRecord::new();
        self.put_record(player, tag, &record)?;
        Ok(record)
    }

    fn put_record(
        &self,
        player: &str,
        tag: &str,
        record: &PlayerInfoRecord,
    ) -> Result<(), LeaseError> {
        let mut record = record.clone();
        record.schema_version = PLAYER_INFO_SCHEMA_VERSION;
        record.touch();
        let key = Self::record_key(player, tag);
        let bytes = Self::serialize(&record)?;
        self.records.insert(key, bytes)?;
        self.records.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::housing::types::PLAYER_INFO_TAG;
    use tempfile::TempDir;

    #[test]
    fn store_round_trip_record() {
        let dir = TempDir::new().expect("tempdir");
        let store = LeaseStoreBuilder::new(dir.path()).open().expect("store");
        let mut record = PlayerInfoRecord::new();
        record.houses = r#"[["greyton",10]]"#.to_string();
        record.last_house = Some("greyton".to_string());
        store
            .put_record("Alice", PLAYER_INFO_TAG, &record)
            .expect("put");
        let fetched = store
            .get_record("alice", PLAYER_INFO_TAG)
            .expect("get")
            .expect("present");
        assert_eq!(fetched.houses, record.houses);
        assert_eq!(fetched.last_house, record.last_house);
        assert_eq!(fetched.schema_version, PLAYER_INFO_SCHEMA_VERSION);
    }

    #[test]
    fn missing_record_is_none() {
        let dir = TempDir::new().expect("tempdir");
        let store = LeaseStoreBuilder::new(dir.path()).open().expect("store");
        assert!(store
            .get_record("nobody", PLAYER_INFO_TAG)
            .expect("get")
            .is_none());
        assert!(store.list_players(PLAYER_INFO_TAG).expect("list").is_empty());
    }

    #[test]
    fn create_record_persists_empty_ledger() {
        let dir = TempDir::new().expect("tempdir");
        let store = LeaseStoreBuilder::new(dir.path()).open().expect("store");
        let created = store.create_record("bob", PLAYER_INFO_TAG).expect("create");
        assert_eq!(created.houses, "[]");
        let fetched = store.get_record("bob", PLAYER_INFO_TAG).expect("get");
        assert!(fetched.is_some());
        assert_eq!(
            store.list_players(PLAYER_INFO_TAG).expect("list"),
            vec!["bob".to_string()]
        );
        assert!(store.list_players("other_tag").expect("list").is_empty());
    }

    #[test]
    fn records_survive_reopen() {
        let dir = TempDir::new().expect("tempdir");
        {
            let store = LeaseStoreBuilder::new(dir.path()).open().expect("store");
            store.create_record("carol", PLAYER_INFO_TAG).expect("create");
        }
        let store = LeaseStore::open(dir.path()).expect("reopen");
        assert!(store
            .get_record("carol", PLAYER_INFO_TAG)
            .expect("get")
            .is_some());
    }

    #[test]
    fn schema_mismatch_is_reported() {
        let dir = TempDir::new().expect("tempdir");
        let store = LeaseStoreBuilder::new(dir.path()).open().expect("store");
        let mut record = PlayerInfoRecord::new();
        record.schema_version = 9;
        let bytes = bincode::serialize(&record).expect("encode");
        store
            .records
            .insert(LeaseStore::record_key("dave", PLAYER_INFO_TAG), bytes)
            .expect("raw insert");
        assert!(matches!(
            store.get_record("dave", PLAYER_INFO_TAG),
            Err(LeaseError::SchemaMismatch { found: 9, .. })
        ));
    }
}
