//! Read-only registry of purchasable houses and the hub waypoint.
//!
//! Built once from configuration at startup and handed to every ledger by reference.

use std::collections::HashMap;

use crate::housing::errors::LeaseError;
use crate::housing::types::{HouseDefinition, HubWaypoint, MapPoint, Position};

const GREYTON_HOUSE_MAP: &str = "/shattered_islands/strakewood_island/greyton/house/luxury_house";

/// The houses shipped with the world.
pub fn default_houses() -> Vec<HouseDefinition> {
    vec![HouseDefinition {
        id: "greyton".to_string(),
        display_name: "Greyton Luxury House".to_string(),
        purchase_cost: 1_500_000,
        daily_fee: 7_500,
        max_prepaid_days: 120,
        prepaid_days_on_purchase: 10,
        stray_item_radius: 4,
        house_portal: MapPoint::new(GREYTON_HOUSE_MAP, 11, 26),
        from_hub_portal: MapPoint::new(GREYTON_HOUSE_MAP, 45, 26),
        exit_portal: MapPoint::new("/shattered_islands/world_1111", 14, 15),
        stray_item_anchor: Position::new(11, 23),
        unpaid_fee_position: Position::new(11, 24),
    }]
}

/// Everlink, the transit hub reachable from every house.
pub fn default_hub() -> HubWaypoint {
    MapPoint::new("/shattered_islands/everlink/everlink_0102", 6, 7)
}

#[derive(Debug, Clone)]
pub struct HouseCatalog {
    houses: HashMap<String, HouseDefinition>,
    hub: HubWaypoint,
}

impl HouseCatalog {
    /// Build a catalog, rejecting duplicate ids and inconsistent prepaid terms.
    pub fn new(houses: Vec<HouseDefinition>, hub: HubWaypoint) -> Result<Self, LeaseError> {
        let mut map = HashMap::with_capacity(houses.len());
        for house in houses {
            if house.id.trim().is_empty() {
                return Err(LeaseError::InvalidCatalog("house id is empty".to_string()));
            }
            if house.prepaid_days_on_purchase > house.max_prepaid_days {
                return Err(LeaseError::InvalidCatalog(format!(
                    "{}: prepaid_days_on_purchase ({}) exceeds max_prepaid_days ({})",
                    house.id, house.prepaid_days_on_purchase, house.max_prepaid_days
                )));
            }
            if house.daily_fee < 0 || house.purchase_cost < 0 {
                return Err(LeaseError::InvalidCatalog(format!(
                    "{}: costs must not be negative",
                    house.id
                )));
            }
            let id = house.id.clone();
            if map.insert(id.clone(), house).is_some() {
                return Err(LeaseError::InvalidCatalog(format!("duplicate house id: {}", id)));
            }
        }
        Ok(Self { houses: map, hub })
    }

    pub fn get_definition(&self, house_id: &str) -> Result<&HouseDefinition, LeaseError> {
        self.houses
            .get(house_id)
            .ok_or_else(|| LeaseError::NotFound(format!("house: {}", house_id)))
    }

    pub fn hub_waypoint(&self) -> &HubWaypoint {
        &self.hub
    }

    pub fn contains(&self, house_id: &str) -> bool {
        self.houses.contains_key(house_id)
    }

    /// All definitions, ordered by id.
    pub fn definitions(&self) -> Vec<&HouseDefinition> {
        let mut defs: Vec<_> = self.houses.values().collect();
        defs.sort_by(|a, b| a.id.cmp(&b.id));
        defs
    }
}

impl Default for HouseCatalog {
    fn default() -> Self {
        let mut houses = HashMap::new();
        for house in default_houses() {
            houses.insert(house.id.clone(), house);
        }
        Self {
            houses,
            hub: default_hub(),
        }
    }
}
