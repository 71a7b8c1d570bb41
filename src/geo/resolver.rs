use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::geo::road_distance_km;
use crate::geo::routing::{RoutingClient, RoutingError};
use crate::models::address::GeoPoint;
use crate::observability::metrics::Metrics;
use crate::pricing::Zone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceSource {
    Routed,
    Haversine,
    ZoneEstimate,
}

impl DistanceSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceSource::Routed => "routed",
            DistanceSource::Haversine => "haversine",
            DistanceSource::ZoneEstimate => "zone_estimate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceEstimate {
    pub distance_km: f64,
    /// Only set when the routing service answered.
    pub eta_minutes: Option<u32>,
    pub accurate: bool,
    pub source: DistanceSource,
}

impl DistanceEstimate {
    pub fn zone_estimate(zone: &Zone) -> Self {
        Self {
            distance_km: zone.flat_distance_km,
            eta_minutes: None,
            accurate: false,
            source: DistanceSource::ZoneEstimate,
        }
    }

    pub fn haversine(origin: &GeoPoint, destination: &GeoPoint) -> Self {
        Self {
            distance_km: road_distance_km(origin, destination),
            eta_minutes: None,
            accurate: false,
            source: DistanceSource::Haversine,
        }
    }
}

/// Three tiers: routing service, haversine with curvature factor, zone flat
/// estimate. Resolution never fails.
#[derive(Clone)]
pub struct DistanceResolver {
    routing: Option<Arc<dyn RoutingClient>>,
    timeout: Duration,
    metrics: Metrics,
}

impl DistanceResolver {
    pub fn new(routing: Option<Arc<dyn RoutingClient>>, timeout: Duration, metrics: Metrics) -> Self {
        Self {
            routing,
            timeout,
            metrics,
        }
    }

    pub fn offline(metrics: Metrics) -> Self {
        Self::new(None, Duration::ZERO, metrics)
    }

    pub async fn resolve(
        &self,
        origin: &GeoPoint,
        destination: Option<&GeoPoint>,
        zone: &Zone,
    ) -> DistanceEstimate {
        let Some(destination) = destination else {
            debug!(zone = %zone.key, "no destination coordinates; using zone estimate");
            return DistanceEstimate::zone_estimate(zone);
        };

        let Some(routing) = &self.routing else {
            return DistanceEstimate::haversine(origin, destination);
        };

        let start = Instant::now();
        let outcome = match timeout(self.timeout, routing.route(origin, destination)).await {
            Ok(result) => result,
            Err(_) => Err(RoutingError::Request(format!(
                "timed out after {} ms",
                self.timeout.as_millis()
            ))),
        };
        let elapsed = start.elapsed().as_secs_f64();

        match outcome {
            Ok(route) => {
                self.metrics
                    .routing_latency_seconds
                    .with_label_values(&["success"])
                    .observe(elapsed);
                DistanceEstimate {
                    distance_km: route.distance_km,
                    eta_minutes: Some(route.duration_minutes),
                    accurate: true,
                    source: DistanceSource::Routed,
                }
            }
            Err(err) => {
                self.metrics
                    .routing_latency_seconds
                    .with_label_values(&["error"])
                    .observe(elapsed);
                warn!(error = %err, "routing unavailable; falling back to haversine");
                DistanceEstimate::haversine(origin, destination)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::geo::routing::RouteSummary;
    use crate::pricing::PricingTable;

    struct FixedRoute(RouteSummary);

    #[async_trait]
    impl RoutingClient for FixedRoute {
        async fn route(&self, _: &GeoPoint, _: &GeoPoint) -> Result<RouteSummary, RoutingError> {
            Ok(self.0)
        }
    }

    struct Failing;

    #[async_trait]
    impl RoutingClient for Failing {
        async fn route(&self, _: &GeoPoint, _: &GeoPoint) -> Result<RouteSummary, RoutingError> {
            Err(RoutingError::Status(500))
        }
    }

    struct Hanging;

    #[async_trait]
    impl RoutingClient for Hanging {
        async fn route(&self, _: &GeoPoint, _: &GeoPoint) -> Result<RouteSummary, RoutingError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Err(RoutingError::Status(504))
        }
    }

    #[derive(Default)]
    struct Counting(AtomicUsize);

    #[async_trait]
    impl RoutingClient for Counting {
        async fn route(&self, _: &GeoPoint, _: &GeoPoint) -> Result<RouteSummary, RoutingError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Err(RoutingError::Status(500))
        }
    }

    fn store() -> GeoPoint {
        GeoPoint {
            lat: 14.4297,
            lng: 120.9367,
        }
    }

    fn destination() -> GeoPoint {
        GeoPoint {
            lat: 14.5547,
            lng: 121.0244,
        }
    }

    fn resolver(client: Arc<dyn RoutingClient>) -> DistanceResolver {
        DistanceResolver::new(Some(client), Duration::from_millis(100), Metrics::new())
    }

    #[tokio::test]
    async fn routed_result_is_accurate() {
        let table = PricingTable::default();
        let route = RouteSummary {
            distance_km: 21.7,
            duration_minutes: 38,
        };
        let estimate = resolver(Arc::new(FixedRoute(route)))
            .resolve(&store(), Some(&destination()), &table.zones[1])
            .await;

        assert!(estimate.accurate);
        assert_eq!(estimate.source, DistanceSource::Routed);
        assert_eq!(estimate.distance_km, 21.7);
        assert_eq!(estimate.eta_minutes, Some(38));
    }

    #[tokio::test]
    async fn routing_failure_falls_back_to_haversine() {
        let table = PricingTable::default();
        let estimate = resolver(Arc::new(Failing))
            .resolve(&store(), Some(&destination()), &table.zones[1])
            .await;

        assert!(!estimate.accurate);
        assert_eq!(estimate.source, DistanceSource::Haversine);
        assert_eq!(estimate.distance_km, road_distance_km(&store(), &destination()));
        assert_eq!(estimate.eta_minutes, None);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_routing_is_cut_off_by_timeout() {
        let table = PricingTable::default();
        let estimate = resolver(Arc::new(Hanging))
            .resolve(&store(), Some(&destination()), &table.zones[1])
            .await;

        assert_eq!(estimate.source, DistanceSource::Haversine);
    }

    #[tokio::test]
    async fn missing_coordinates_skip_routing() {
        let table = PricingTable::default();
        let counting = Arc::new(Counting::default());
        let bulacan = table
            .zones
            .iter()
            .find(|zone| zone.key == "bulacan")
            .unwrap();

        let estimate = resolver(counting.clone()).resolve(&store(), None, bulacan).await;

        assert_eq!(counting.0.load(Ordering::SeqCst), 0);
        assert_eq!(estimate.source, DistanceSource::ZoneEstimate);
        assert_eq!(estimate.distance_km, 55.0);
        assert!(!estimate.accurate);
    }

    #[tokio::test]
    async fn routing_is_attempted_once() {
        let table = PricingTable::default();
        let counting = Arc::new(Counting::default());

        resolver(counting.clone())
            .resolve(&store(), Some(&destination()), &table.zones[1])
            .await;

        assert_eq!(counting.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn offline_resolver_is_deterministic() {
        let table = PricingTable::default();
        let resolver = DistanceResolver::offline(Metrics::new());

        let first = resolver
            .resolve(&store(), Some(&destination()), &table.zones[1])
            .await;
        let second = resolver
            .resolve(&store(), Some(&destination()), &table.zones[1])
            .await;

        assert_eq!(first, second);
        assert_eq!(first.source, DistanceSource::Haversine);
    }
}
