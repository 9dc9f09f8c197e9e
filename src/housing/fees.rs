//! Trigger flows that move money for a house: buying it, prepaying fees, and the
//! guarded exit that collects a lapsed daily fee.
//!
//! The purse is the host's currency capability. These helpers only report what the
//! host must do next (message, relocate); they never teleport anyone themselves.

use log::{info, warn};

use crate::housing::clock::Clock;
use crate::housing::errors::LeaseError;
use crate::housing::ledger::Ledger;
use crate::housing::storage::RecordStore;
use crate::housing::types::{Position, SECONDS_PER_DAY};

/// Currency the activating player can spend.
pub trait Purse {
    /// Debit `amount`. Returns `false` and leaves the balance alone when short.
    fn pay_amount(&mut self, amount: i64) -> bool;

    /// Give back an amount taken by `pay_amount` when the ledger write failed.
    fn refund(&mut self, amount: i64);

    fn balance(&self) -> i64;
}

/// Return the money when recording a paid-for change fails.
fn refund_on_error<T>(
    purse: &mut dyn Purse,
    cost: i64,
    result: Result<T, LeaseError>,
) -> Result<T, LeaseError> {
    if let Err(err) = &result {
        warn!("refunding {} after failed ledger write: {}", cost, err);
        purse.refund(cost);
    }
    result
}

/// Plain balance purse for tools and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoinPurse {
    balance: i64,
}

impl CoinPurse {
    pub fn new(balance: i64) -> Self {
        Self { balance }
    }
}

impl Purse for CoinPurse {
    fn pay_amount(&mut self, amount: i64) -> bool {
        if amount < 0 || amount > self.balance {
            return false;
        }
        self.balance -= amount;
        true
    }

    fn refund(&mut self, amount: i64) {
        self.balance += amount.max(0);
    }

    fn balance(&self) -> i64 {
        self.balance
    }
}

/// Outcome of the fee check run when a player uses a guarded house exit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeeCheck {
    /// Not the player's house; the host does nothing.
    NotOwned,
    /// Fees are prepaid.
    Current,
    /// Fees had lapsed and one more day was charged.
    Charged { cost: i64 },
    /// Fees had lapsed and the player could not pay; move them out.
    Unpaid { cost: i64, relocate_to: Position },
}

/// Collect one day of lapsed fees, or tell the host where to move the player.
pub fn check_exit_fees<S, C>(
    ledger: &mut Ledger<'_, S, C>,
    purse: &mut dyn Purse,
) -> Result<FeeCheck, LeaseError>
where
    S: RecordStore + ?Sized,
    C: Clock + ?Sized,
{
    match ledger.is_fee_expired()? {
        None => Ok(FeeCheck::NotOwned),
        Some(false) => Ok(FeeCheck::Current),
        Some(true) => {
            let cost = ledger.fee_cost_for_days(1)?;
            if purse.pay_amount(cost) {
                refund_on_error(purse, cost, ledger.pay_fees(1))?;
                info!(
                    "{} paid {} for a day of fees on {}",
                    ledger.player(),
                    cost,
                    ledger.house()
                );
                Ok(FeeCheck::Charged { cost })
            } else {
                let relocate_to = ledger.definition()?.unpaid_fee_position;
                warn!(
                    "{} cannot pay {} in lapsed fees on {}; relocating to {}",
                    ledger.player(),
                    cost,
                    ledger.house(),
                    relocate_to
                );
                Ok(FeeCheck::Unpaid { cost, relocate_to })
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Purchase {
    AlreadyOwned,
    /// Nothing was charged or written.
    InsufficientFunds { cost: i64 },
    Bought { cost: i64, paid_until: i64 },
}

/// Charge the purchase price and record the house.
///
/// The price is refunded when the purchase cannot be stored.
pub fn buy_house<S, C>(
    ledger: &mut Ledger<'_, S, C>,
    purse: &mut dyn Purse,
) -> Result<Purchase, LeaseError>
where
    S: RecordStore + ?Sized,
    C: Clock + ?Sized,
{
    let cost = ledger.definition()?.purchase_cost;
    if ledger.has_house()? {
        return Ok(Purchase::AlreadyOwned);
    }
    if !purse.pay_amount(cost) {
        return Ok(Purchase::InsufficientFunds { cost });
    }
    refund_on_error(purse, cost, ledger.purchase())?;
    let paid_until = ledger
        .paid_until()?
        .ok_or_else(|| LeaseError::NotFound(format!("owned house: {}", ledger.house())))?;
    Ok(Purchase::Bought { cost, paid_until })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prepay {
    NotOwned,
    /// The house already has `max_prepaid_days` banked.
    CapReached { max_days: u32 },
    InsufficientFunds { days: u32, cost: i64 },
    Paid { days: u32, cost: i64 },
}

/// Prepay up to `requested` days, capped so no more than `max_prepaid_days` are banked.
///
/// Part of a day already banked counts against the cap, so the allowance is whole days
/// of the remaining headroom.
pub fn prepay_fees<S, C>(
    ledger: &mut Ledger<'_, S, C>,
    purse: &mut dyn Purse,
    requested: u32,
) -> Result<Prepay, LeaseError>
where
    S: RecordStore + ?Sized,
    C: Clock + ?Sized,
{
    let max_days = ledger.definition()?.max_prepaid_days;
    let Some(remaining) = ledger.seconds_remaining()? else {
        return Ok(Prepay::NotOwned);
    };
    let headroom = i64::from(max_days) * SECONDS_PER_DAY - remaining.max(0);
    let allowed = u32::try_from(headroom.div_euclid(SECONDS_PER_DAY).max(0)).unwrap_or(0);
    let days = requested.min(allowed);
    if days == 0 {
        return Ok(Prepay::CapReached { max_days });
    }
    let cost = ledger.fee_cost_for_days(days)?;
    if !purse.pay_amount(cost) {
        return Ok(Prepay::InsufficientFunds { days, cost });
    }
    refund_on_error(purse, cost, ledger.pay_fees(days))?;
    Ok(Prepay::Paid { days, cost })
}
