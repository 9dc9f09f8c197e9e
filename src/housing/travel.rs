//! Hub travel: remembering which house a player left so the hub can send them back.

use log::debug;

use crate::housing::clock::Clock;
use crate::housing::errors::LeaseError;
use crate::housing::ledger::Ledger;
use crate::housing::storage::RecordStore;
use crate::housing::types::MapPoint;

/// Leave the bound house for the hub. Returns the hub waypoint.
///
/// The house is remembered only when the player already has a record.
pub fn depart_to_hub<S, C>(ledger: &mut Ledger<'_, S, C>) -> Result<MapPoint, LeaseError>
where
    S: RecordStore + ?Sized,
    C: Clock + ?Sized,
{
    let house = ledger.house().to_string();
    ledger.set_last_house_visited(&house)?;
    Ok(ledger.catalog().hub_waypoint().clone())
}

/// Portal back into the house the player last left, if they still own it.
///
/// On success the ledger is rebound to that house.
pub fn return_from_hub<S, C>(ledger: &mut Ledger<'_, S, C>) -> Result<Option<MapPoint>, LeaseError>
where
    S: RecordStore + ?Sized,
    C: Clock + ?Sized,
{
    let Some(last) = ledger.last_house_visited()? else {
        return Ok(None);
    };
    let Ok(definition) = ledger.catalog().get_definition(&last) else {
        debug!("{} last left unknown house {}", ledger.player(), last);
        return Ok(None);
    };
    let previous = ledger.house().to_string();
    ledger.set_house(&last);
    if !ledger.has_house()? {
        ledger.set_house(&previous);
        return Ok(None);
    }
    Ok(Some(definition.from_hub_portal.clone()))
}

/// Where the player goes when walking out of the bound house.
pub fn leave_house<S, C>(ledger: &Ledger<'_, S, C>) -> Result<MapPoint, LeaseError>
where
    S: RecordStore + ?Sized,
    C: Clock + ?Sized,
{
    Ok(ledger.definition()?.exit_portal.clone())
}
