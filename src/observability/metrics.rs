use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub quotes_total: IntCounterVec,
    pub routing_latency_seconds: HistogramVec,
    pub transitions_total: IntCounterVec,
    pub orders_placed_total: IntCounterVec,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let quotes_total = IntCounterVec::new(
            Opts::new("quotes_total", "Quote sets served by distance source"),
            &["source"],
        )
        .expect("valid quotes_total metric");

        let routing_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "routing_latency_seconds",
                "Latency of routing service lookups in seconds",
            )
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.0, 3.0]),
            &["outcome"],
        )
        .expect("valid routing_latency_seconds metric");

        let transitions_total = IntCounterVec::new(
            Opts::new("transitions_total", "Order status transitions by outcome"),
            &["outcome"],
        )
        .expect("valid transitions_total metric");

        let orders_placed_total = IntCounterVec::new(
            Opts::new("orders_placed_total", "Orders placed by shipping method"),
            &["shipping_method"],
        )
        .expect("valid orders_placed_total metric");

        registry
            .register(Box::new(quotes_total.clone()))
            .expect("register quotes_total");
        registry
            .register(Box::new(routing_latency_seconds.clone()))
            .expect("register routing_latency_seconds");
        registry
            .register(Box::new(transitions_total.clone()))
            .expect("register transitions_total");
        registry
            .register(Box::new(orders_placed_total.clone()))
            .expect("register orders_placed_total");

        Self {
            registry,
            quotes_total,
            routing_latency_seconds,
            transitions_total,
            orders_placed_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}
