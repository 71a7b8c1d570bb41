use std::sync::Arc;

use tracing::info;

use crate::geo::{DistanceEstimate, DistanceResolver};
use crate::models::address::Address;
use crate::models::quote::{DeliveryOptions, DeliveryQuote, VehicleType};
use crate::observability::metrics::Metrics;
use crate::pricing::fare;
use crate::pricing::zone::ZoneClassifier;
use crate::pricing::{PricingTable, Zone};

#[derive(Clone)]
pub struct QuoteAggregator {
    table: Arc<PricingTable>,
    resolver: DistanceResolver,
    metrics: Metrics,
}

impl QuoteAggregator {
    pub fn new(table: Arc<PricingTable>, resolver: DistanceResolver, metrics: Metrics) -> Self {
        Self {
            table,
            resolver,
            metrics,
        }
    }

    pub fn table(&self) -> &PricingTable {
        &self.table
    }

    /// Classifies and resolves once, then prices every vehicle profile.
    /// Always succeeds; accuracy degrades instead.
    pub async fn get_quotes(&self, address: &Address) -> DeliveryOptions {
        let zone = ZoneClassifier::new(&self.table).classify_address(address);
        let destination = address.coordinates();
        let estimate = self
            .resolver
            .resolve(&self.table.store.location, destination.as_ref(), zone)
            .await;

        let quotes = quote_vehicles(&self.table, zone, &estimate);
        let pickup_option = pickup_quote(&self.table);
        let recommended = quotes
            .first()
            .cloned()
            .unwrap_or_else(|| pickup_option.clone());

        self.metrics
            .quotes_total
            .with_label_values(&[estimate.source.as_str()])
            .inc();

        info!(
            zone = %zone.key,
            source = estimate.source.as_str(),
            distance_km = estimate.distance_km,
            recommended = %recommended.vehicle_type,
            fare = recommended.total_fare,
            "quotes computed"
        );

        DeliveryOptions {
            quotes,
            recommended,
            pickup_option,
            zone_key: zone.key.clone(),
            zone_name: zone.display_name.clone(),
            distance_source: estimate.source,
            accurate: estimate.accurate,
            store: self.table.store.clone(),
        }
    }
}

/// One quote per profile, cheapest first. Ties go to the shorter ETA, then
/// to declaration order in the table.
pub fn quote_vehicles(
    table: &PricingTable,
    zone: &Zone,
    estimate: &DistanceEstimate,
) -> Vec<DeliveryQuote> {
    let mut ranked: Vec<(usize, DeliveryQuote)> = table
        .vehicles
        .iter()
        .enumerate()
        .map(|(position, vehicle)| {
            let breakdown = fare::quote(estimate.distance_km, vehicle, zone.multiplier);
            let quote = DeliveryQuote {
                vehicle_type: vehicle.vehicle_type,
                label: vehicle.label.clone(),
                distance_km: estimate.distance_km,
                base_fare: breakdown.base_fare,
                distance_charge: breakdown.distance_charge,
                zone_multiplier: zone.multiplier,
                zone_key: zone.key.clone(),
                total_fare: breakdown.total,
                estimated_minutes: fare::estimated_minutes(
                    estimate.distance_km,
                    vehicle,
                    estimate.eta_minutes,
                ),
                is_pickup: false,
            };
            (position, quote)
        })
        .collect();

    ranked.sort_by(|(pos_a, a), (pos_b, b)| {
        a.total_fare
            .cmp(&b.total_fare)
            .then(a.estimated_minutes.cmp(&b.estimated_minutes))
            .then(pos_a.cmp(pos_b))
    });

    ranked.into_iter().map(|(_, quote)| quote).collect()
}

pub fn pickup_quote(table: &PricingTable) -> DeliveryQuote {
    let store_zone = ZoneClassifier::new(table).classify(&table.store.province);

    DeliveryQuote {
        vehicle_type: VehicleType::StorePickup,
        label: format!("Store pickup at {}", table.store.name),
        distance_km: 0.0,
        base_fare: 0,
        distance_charge: 0,
        zone_multiplier: 1.0,
        zone_key: store_zone.key.clone(),
        total_fare: 0,
        estimated_minutes: 0,
        is_pickup: true,
    }
}
