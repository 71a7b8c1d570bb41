use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::models::address::GeoPoint;

/// Never leaves the geo module; the resolver turns every variant into a
/// fallback tier.
#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("routing request failed: {0}")]
    Request(String),

    #[error("routing service returned status {0}")]
    Status(u16),

    #[error("routing response malformed: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    pub distance_meters: f64,
    pub duration_seconds: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteSummary {
    pub distance_km: f64,
    pub duration_minutes: u32,
}

impl TryFrom<RouteResponse> for RouteSummary {
    type Error = RoutingError;

    fn try_from(response: RouteResponse) -> Result<Self, Self::Error> {
        let valid = |value: f64| value.is_finite() && value >= 0.0;
        if !valid(response.distance_meters) || !valid(response.duration_seconds) {
            return Err(RoutingError::Malformed(format!(
                "distance {} m, duration {} s",
                response.distance_meters, response.duration_seconds
            )));
        }

        let minutes = (response.duration_seconds / 60.0).round();
        Ok(Self {
            distance_km: response.distance_meters / 1_000.0,
            duration_minutes: minutes.min(f64::from(u32::MAX)) as u32,
        })
    }
}

#[async_trait]
pub trait RoutingClient: Send + Sync {
    async fn route(&self, from: &GeoPoint, to: &GeoPoint) -> Result<RouteSummary, RoutingError>;
}

/// `GET {base_url}/route?from=lat,lng&to=lat,lng`, single attempt, bounded
/// by the client timeout.
#[derive(Debug, Clone)]
pub struct HttpRoutingClient {
    client: Client,
    base_url: String,
}

impl HttpRoutingClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RoutingError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|err| RoutingError::Request(format!("failed to build client: {err}")))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

fn coordinate_param(point: &GeoPoint) -> String {
    format!("{},{}", point.lat, point.lng)
}

#[async_trait]
impl RoutingClient for HttpRoutingClient {
    async fn route(&self, from: &GeoPoint, to: &GeoPoint) -> Result<RouteSummary, RoutingError> {
        let response = self
            .client
            .get(format!("{}/route", self.base_url))
            .query(&[("from", coordinate_param(from)), ("to", coordinate_param(to))])
            .send()
            .await
            .map_err(|err| RoutingError::Request(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RoutingError::Status(status.as_u16()));
        }

        let body: RouteResponse = response
            .json()
            .await
            .map_err(|err| RoutingError::Malformed(err.to_string()))?;

        RouteSummary::try_from(body)
    }
}
