use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::info;

// Declare the static OnceCell to hold the Metrics.
static METRICS_INSTANCE: OnceCell<Arc<Metrics>> = OnceCell::const_new();

/// Asynchronously initializes and gets a reference to the static `Metrics`.
pub async fn get_metrics() -> &'static Arc<Metrics> {
    METRICS_INSTANCE
        .get_or_init(|| async {
            info!("Initializing Metrics ...");
            Metrics::new()
        })
        .await
}

pub const OUTCOME_SUCCESS: &str = "success";
pub const OUTCOME_FAILURE: &str = "failure";
/// waiter handed the failure of the refresh it queued behind
pub const OUTCOME_SHARED_FAILURE: &str = "shared_failure";

pub const ENDPOINT_CITIES: &str = "cities";
pub const ENDPOINT_TARIFF: &str = "tariff";

#[derive(Clone)]
pub struct Metrics {
    pub registry: Registry,

    // Token cache metrics
    pub token_refreshes: IntCounterVec,
    pub token_cache_hits: IntCounter,
    pub token_expiry_unix: IntGauge,

    // Upstream metrics
    pub upstream_requests: IntCounterVec,
    pub upstream_duration: HistogramVec,

    pub up: IntGauge,
}

impl Metrics {
    fn new() -> Arc<Self> {
        let registry = Registry::new_custom(Some("cdekproxy".into()), None)
            .expect("valid registry prefix");

        let metrics: Arc<Metrics> = Arc::new(Self {
            token_refreshes: IntCounterVec::new(Opts::new("token_refresh_total", "Token refresh attempts by outcome"), &["outcome"]).expect("metric definition"),
            token_cache_hits: IntCounter::new("token_cache_hits_total", "Tokens served from cache").expect("metric definition"),
            token_expiry_unix: IntGauge::new("token_expiry_unix_seconds", "Cached token expiry timestamp").expect("metric definition"),

            upstream_requests: IntCounterVec::new(Opts::new("upstream_requests_total", "Carrier API calls by endpoint and status"), &["endpoint", "status"]).expect("metric definition"),
            upstream_duration: HistogramVec::new(HistogramOpts::new("upstream_request_duration_seconds", "Carrier API call duration seconds").buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0]), &["endpoint"]).expect("metric definition"),

            up: IntGauge::new("up", "1 if service is serving").expect("metric definition"),

            registry,
        });

        // Register all metrics in the registry
        let reg = &metrics.registry;
        let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
            Box::new(metrics.token_refreshes.clone()),
            Box::new(metrics.token_cache_hits.clone()),
            Box::new(metrics.token_expiry_unix.clone()),
            Box::new(metrics.upstream_requests.clone()),
            Box::new(metrics.upstream_duration.clone()),
            Box::new(metrics.up.clone()),
        ];
        for collector in collectors {
            reg.register(collector).expect("metric registered once");
        }

        metrics
    }
}
