use crate::pricing::VehicleProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FareBreakdown {
    pub base_fare: u64,
    /// Distance charge with the multiplier applied, rounded on its own.
    pub distance_charge: u64,
    pub total: u64,
}

/// Kilometres beyond the vehicle's base distance are billed per started km.
/// The zone multiplier is applied to the unrounded sum of base fare and
/// distance charge, and the result is rounded once, half away from zero.
pub fn quote(distance_km: f64, vehicle: &VehicleProfile, zone_multiplier: f64) -> FareBreakdown {
    let distance_km = if distance_km.is_finite() {
        distance_km.max(0.0)
    } else {
        0.0
    };
    let extra_km = (distance_km - vehicle.base_distance_km).max(0.0);
    let raw_distance_charge = extra_km.ceil() * vehicle.per_km_rate_beyond_base;

    FareBreakdown {
        base_fare: to_currency(vehicle.base_fare),
        distance_charge: to_currency(raw_distance_charge * zone_multiplier),
        total: to_currency((vehicle.base_fare + raw_distance_charge) * zone_multiplier),
    }
}

/// Routed duration wins when present.
pub fn estimated_minutes(distance_km: f64, vehicle: &VehicleProfile, routed: Option<u32>) -> u32 {
    match routed {
        Some(minutes) => minutes,
        None => {
            let minutes = (distance_km.max(0.0) * vehicle.avg_minutes_per_km).round();
            if minutes.is_finite() {
                minutes.min(f64::from(u32::MAX)) as u32
            } else {
                0
            }
        }
    }
}

fn to_currency(amount: f64) -> u64 {
    let rounded = amount.round();
    if rounded.is_finite() && rounded > 0.0 {
        rounded as u64
    } else {
        0
    }
}
