use serde::{Deserialize, Serialize};

use crate::geo::DistanceSource;
use crate::pricing::StoreLocation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleType {
    Motorcycle,
    Sedan,
    Mpv,
    PickupTruck,
    StorePickup,
}

impl VehicleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleType::Motorcycle => "motorcycle",
            VehicleType::Sedan => "sedan",
            VehicleType::Mpv => "mpv",
            VehicleType::PickupTruck => "pickup_truck",
            VehicleType::StorePickup => "store_pickup",
        }
    }
}

impl std::fmt::Display for VehicleType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time fare estimate for one vehicle to one address. Never stored
/// on its own; placement copies the fare onto the order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryQuote {
    pub vehicle_type: VehicleType,
    pub label: String,
    pub distance_km: f64,
    pub base_fare: u64,
    pub distance_charge: u64,
    pub zone_multiplier: f64,
    pub zone_key: String,
    pub total_fare: u64,
    pub estimated_minutes: u32,
    pub is_pickup: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryOptions {
    pub quotes: Vec<DeliveryQuote>,
    pub recommended: DeliveryQuote,
    pub pickup_option: DeliveryQuote,
    pub zone_key: String,
    pub zone_name: String,
    pub distance_source: DistanceSource,
    pub accurate: bool,
    pub store: StoreLocation,
}

impl DeliveryOptions {
    pub fn quote_for(&self, vehicle_type: VehicleType) -> Option<&DeliveryQuote> {
        if vehicle_type == VehicleType::StorePickup {
            return Some(&self.pickup_option);
        }
        self.quotes
            .iter()
            .find(|quote| quote.vehicle_type == vehicle_type)
    }
}
