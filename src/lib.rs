//! # Luxhouse - luxury house leasing for game world map triggers
//!
//! Players buy houses from a fixed catalog and keep them by paying a daily occupancy
//! fee in advance. Map triggers (entrances, guarded exits, the hub portal) bind a
//! [`housing::Ledger`] to the activating player and one house, ask it a question or
//! tell it about a payment, and act on the answer.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use luxhouse::config::Config;
//! use luxhouse::housing::{check_exit_fees, CoinPurse, FeeCheck, Ledger, LeaseStore, SystemClock};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml").await?;
//!     let catalog = config.catalog()?;
//!     let store = LeaseStore::open(config.store_path())?;
//!
//!     let mut ledger = Ledger::new(&catalog, &store, &SystemClock, "alice", "greyton");
//!     let mut purse = CoinPurse::new(10_000);
//!     if let FeeCheck::Unpaid { relocate_to, .. } = check_exit_fees(&mut ledger, &mut purse)? {
//!         println!("move alice to {}", relocate_to);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - TOML configuration: storage, logging, hub and house catalog
//! - [`housing`] - catalog, record store, ledger and trigger helpers

pub mod config;
pub mod housing;
