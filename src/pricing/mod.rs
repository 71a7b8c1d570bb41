//! Static rate configuration: vehicle profiles, pricing zones and the store
//! location. Loaded once at startup, validated, then shared read-only behind
//! an `Arc`.

pub mod fare;
pub mod zone;

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::address::GeoPoint;
use crate::models::quote::VehicleType;

#[derive(Debug, Error)]
pub enum PricingError {
    #[error("failed to read pricing table {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse pricing table: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid pricing table: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleProfile {
    pub vehicle_type: VehicleType,
    pub label: String,
    pub base_fare: f64,
    pub base_distance_km: f64,
    pub per_km_rate_beyond_base: f64,
    pub max_weight_kg: f64,
    pub avg_minutes_per_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub key: String,
    pub display_name: String,
    pub multiplier: f64,
    /// Lower-case substrings; the first zone whose keyword appears wins.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Distance used when the destination carries no coordinates.
    pub flat_distance_km: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreLocation {
    pub name: String,
    pub address: String,
    pub city: String,
    pub province: String,
    pub location: GeoPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTable {
    /// Declaration order doubles as the final tie-breaker between quotes.
    pub vehicles: Vec<VehicleProfile>,
    /// Evaluated top-down, nearest region first.
    pub zones: Vec<Zone>,
    pub fallback_zone: Zone,
    pub store: StoreLocation,
}

impl PricingTable {
    pub fn load(path: Option<&str>) -> Result<Self, PricingError> {
        let table = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        table.validate()?;
        Ok(table)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PricingError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| PricingError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, PricingError> {
        Ok(serde_json::from_str(raw)?)
    }

    pub fn validate(&self) -> Result<(), PricingError> {
        if self.vehicles.is_empty() {
            return Err(PricingError::Invalid(
                "at least one vehicle profile is required".to_string(),
            ));
        }

        let mut seen_vehicles = HashSet::new();
        for vehicle in &self.vehicles {
            if vehicle.vehicle_type == VehicleType::StorePickup {
                return Err(PricingError::Invalid(
                    "store_pickup cannot be a delivery vehicle".to_string(),
                ));
            }
            if !seen_vehicles.insert(vehicle.vehicle_type) {
                return Err(PricingError::Invalid(format!(
                    "duplicate vehicle profile {}",
                    vehicle.vehicle_type
                )));
            }
            let non_negative = [
                ("base_fare", vehicle.base_fare),
                ("base_distance_km", vehicle.base_distance_km),
                ("per_km_rate_beyond_base", vehicle.per_km_rate_beyond_base),
                ("max_weight_kg", vehicle.max_weight_kg),
                ("avg_minutes_per_km", vehicle.avg_minutes_per_km),
            ];
            for (field, value) in non_negative {
                if !value.is_finite() || value < 0.0 {
                    return Err(PricingError::Invalid(format!(
                        "{}.{field} must be >= 0",
                        vehicle.vehicle_type
                    )));
                }
            }
        }

        let mut seen_zones = HashSet::new();
        for zone in self.zones.iter().chain(std::iter::once(&self.fallback_zone)) {
            if !seen_zones.insert(zone.key.as_str()) {
                return Err(PricingError::Invalid(format!("duplicate zone {}", zone.key)));
            }
            if !zone.multiplier.is_finite() || zone.multiplier < 1.0 {
                return Err(PricingError::Invalid(format!(
                    "zone {} multiplier must be >= 1.0",
                    zone.key
                )));
            }
            if !zone.flat_distance_km.is_finite() || zone.flat_distance_km < 0.0 {
                return Err(PricingError::Invalid(format!(
                    "zone {} flat distance must be >= 0",
                    zone.key
                )));
            }
            if zone.multiplier > self.fallback_zone.multiplier {
                return Err(PricingError::Invalid(format!(
                    "zone {} multiplier exceeds fallback zone {}",
                    zone.key, self.fallback_zone.key
                )));
            }
        }

        for zone in &self.zones {
            if zone.keywords.iter().any(|keyword| keyword.trim().is_empty()) {
                return Err(PricingError::Invalid(format!(
                    "zone {} has an empty keyword",
                    zone.key
                )));
            }
        }

        if !self.store.location.is_valid() {
            return Err(PricingError::Invalid(
                "store location coordinates are out of range".to_string(),
            ));
        }

        Ok(())
    }

    pub fn vehicle(&self, vehicle_type: VehicleType) -> Option<&VehicleProfile> {
        self.vehicles
            .iter()
            .find(|vehicle| vehicle.vehicle_type == vehicle_type)
    }
}

fn vehicle(
    vehicle_type: VehicleType,
    label: &str,
    base_fare: f64,
    base_distance_km: f64,
    per_km_rate_beyond_base: f64,
    max_weight_kg: f64,
    avg_minutes_per_km: f64,
) -> VehicleProfile {
    VehicleProfile {
        vehicle_type,
        label: label.to_string(),
        base_fare,
        base_distance_km,
        per_km_rate_beyond_base,
        max_weight_kg,
        avg_minutes_per_km,
    }
}

fn zone(key: &str, display_name: &str, multiplier: f64, flat: f64, keywords: &[&str]) -> Zone {
    Zone {
        key: key.to_string(),
        display_name: display_name.to_string(),
        multiplier,
        keywords: keywords.iter().map(|keyword| keyword.to_string()).collect(),
        flat_distance_km: flat,
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            vehicles: vec![
                vehicle(VehicleType::Motorcycle, "Motorcycle", 70.0, 4.0, 14.0, 20.0, 2.0),
                vehicle(VehicleType::Sedan, "Sedan", 120.0, 4.0, 20.0, 200.0, 2.5),
                vehicle(VehicleType::Mpv, "MPV", 220.0, 4.0, 24.0, 300.0, 2.6),
                vehicle(VehicleType::PickupTruck, "Pickup Truck", 300.0, 4.0, 28.0, 1000.0, 3.0),
            ],
            zones: vec![
                zone(
                    "cavite",
                    "Cavite",
                    1.0,
                    8.0,
                    &[
                        "cavite",
                        "imus",
                        "bacoor",
                        "dasmarinas",
                        "dasmariñas",
                        "general trias",
                        "gen. trias",
                        "kawit",
                        "noveleta",
                        "silang",
                        "tagaytay",
                        "trece martires",
                        "tanza",
                        "carmona",
                    ],
                ),
                zone(
                    "metro_manila",
                    "Metro Manila",
                    1.2,
                    35.0,
                    &[
                        "metro manila",
                        "ncr",
                        "manila",
                        "makati",
                        "taguig",
                        "pasay",
                        "paranaque",
                        "parañaque",
                        "las pinas",
                        "las piñas",
                        "muntinlupa",
                        "quezon city",
                        "pasig",
                        "mandaluyong",
                        "san juan",
                        "marikina",
                        "caloocan",
                        "malabon",
                        "navotas",
                        "valenzuela",
                        "pateros",
                    ],
                ),
                zone(
                    "laguna",
                    "Laguna",
                    1.25,
                    40.0,
                    &[
                        "laguna",
                        "santa rosa",
                        "sta. rosa",
                        "binan",
                        "biñan",
                        "san pedro",
                        "cabuyao",
                        "calamba",
                        "los banos",
                        "los baños",
                    ],
                ),
                zone(
                    "rizal",
                    "Rizal",
                    1.3,
                    45.0,
                    &["rizal", "antipolo", "cainta", "taytay", "binangonan"],
                ),
                zone(
                    "batangas",
                    "Batangas",
                    1.3,
                    50.0,
                    &["batangas", "lipa", "tanauan", "nasugbu"],
                ),
                zone(
                    "bulacan",
                    "Bulacan",
                    1.35,
                    55.0,
                    &[
                        "bulacan",
                        "malolos",
                        "meycauayan",
                        "marilao",
                        "bocaue",
                        "san jose del monte",
                    ],
                ),
            ],
            fallback_zone: zone("provincial", "Provincial", 1.5, 60.0, &[]),
            store: StoreLocation {
                name: "Main Store".to_string(),
                address: "Aguinaldo Highway".to_string(),
                city: "Imus".to_string(),
                province: "Cavite".to_string(),
                location: GeoPoint {
                    lat: 14.4297,
                    lng: 120.9367,
                },
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_is_valid() {
        let table = PricingTable::default();
        assert!(table.validate().is_ok());
        assert_eq!(table.vehicles.len(), 4);
        assert_eq!(table.fallback_zone.key, "provincial");
    }

    #[test]
    fn fallback_zone_has_highest_multiplier() {
        let table = PricingTable::default();
        assert!(
            table
                .zones
                .iter()
                .all(|zone| zone.multiplier <= table.fallback_zone.multiplier)
        );
    }

    #[test]
    fn rejects_negative_rates() {
        let mut table = PricingTable::default();
        table.vehicles[0].per_km_rate_beyond_base = -1.0;
        assert!(matches!(table.validate(), Err(PricingError::Invalid(_))));
    }

    #[test]
    fn rejects_multiplier_below_one() {
        let mut table = PricingTable::default();
        table.zones[1].multiplier = 0.9;
        assert!(matches!(table.validate(), Err(PricingError::Invalid(_))));
    }

    #[test]
    fn rejects_zone_above_fallback() {
        let mut table = PricingTable::default();
        table.zones[0].multiplier = 2.0;
        assert!(matches!(table.validate(), Err(PricingError::Invalid(_))));
    }

    #[test]
    fn rejects_empty_vehicle_table() {
        let mut table = PricingTable::default();
        table.vehicles.clear();
        assert!(matches!(table.validate(), Err(PricingError::Invalid(_))));
    }

    #[test]
    fn rejects_duplicate_vehicle() {
        let mut table = PricingTable::default();
        let duplicate = table.vehicles[0].clone();
        table.vehicles.push(duplicate);
        assert!(matches!(table.validate(), Err(PricingError::Invalid(_))));
    }

    #[test]
    fn table_roundtrips_through_json_file_format() {
        let table = PricingTable::default();
        let raw = serde_json::to_string(&table).unwrap();
        let parsed = PricingTable::from_json(&raw).unwrap();
        assert_eq!(parsed, table);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = PricingTable::load(Some("/nonexistent/pricing.json")).unwrap_err();
        assert!(matches!(err, PricingError::Io { .. }));
    }
}
