use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub dashboard_requests_total: IntCounterVec,
    pub backend_fetch_latency_seconds: HistogramVec,
    pub backend_retries_total: IntCounterVec,
    pub inflight_superseded_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let dashboard_requests_total = IntCounterVec::new(
            Opts::new(
                "dashboard_requests_total",
                "Dashboard requests by endpoint and outcome",
            ),
            &["endpoint", "outcome"],
        )
        .expect("valid dashboard_requests_total metric");

        let backend_fetch_latency_seconds = HistogramVec::new(
            HistogramOpts::new(
                "backend_fetch_latency_seconds",
                "Latency of backend fetches in seconds, retries included",
            ),
            &["resource", "outcome"],
        )
        .expect("valid backend_fetch_latency_seconds metric");

        let backend_retries_total = IntCounterVec::new(
            Opts::new(
                "backend_retries_total",
                "Backend fetch retries after transport failures",
            ),
            &["resource"],
        )
        .expect("valid backend_retries_total metric");

        let inflight_superseded_total = IntCounter::new(
            "inflight_superseded_total",
            "Backend fetches cancelled because a newer request replaced them",
        )
        .expect("valid inflight_superseded_total metric");

        registry
            .register(Box::new(dashboard_requests_total.clone()))
            .expect("register dashboard_requests_total");
        registry
            .register(Box::new(backend_fetch_latency_seconds.clone()))
            .expect("register backend_fetch_latency_seconds");
        registry
            .register(Box::new(backend_retries_total.clone()))
            .expect("register backend_retries_total");
        registry
            .register(Box::new(inflight_superseded_total.clone()))
            .expect("register inflight_superseded_total");

        Self {
            registry,
            dashboard_requests_total,
            backend_fetch_latency_seconds,
            backend_retries_total,
            inflight_superseded_total,
        }
    }

    pub fn record_request(&self, endpoint: &str, ok: bool) {
        let outcome = if ok { "success" } else { "error" };
        self.dashboard_requests_total
            .with_label_values(&[endpoint, outcome])
            .inc();
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

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
