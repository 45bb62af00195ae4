use std::time::Duration;

/// Service metrics, recorded through the `metrics` facade and rendered by the
/// Prometheus recorder installed at bootstrap.
pub struct Metrics;

impl Metrics {
    pub fn add_request(method: &str, code: i32) {
        metrics::counter!(
            "wallet_rpc_requests",
            "method" => method.to_owned(),
            "code" => code.to_string()
        )
        .increment(1);
    }

    pub fn add_latency(method: &str, latency: Duration) {
        metrics::histogram!("wallet_rpc_latency", "method" => method.to_owned()).record(latency);
    }

    pub fn add_relay_call(method: &'static str, outcome: &'static str) {
        metrics::counter!("relay_calls", "method" => method, "outcome" => outcome).increment(1);
    }
}
