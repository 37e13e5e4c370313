use metrics::counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Install the global Prometheus recorder. Safe to call more than once;
/// only the first call installs.
pub fn init_metrics() {
    if METRICS_HANDLE.get().is_some() {
        return;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            let _ = METRICS_HANDLE.set(handle);
        }
        Err(e) => tracing::error!("Failed to install Prometheus recorder: {}", e),
    }
}

pub fn get_metrics() -> String {
    METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string())
}

/// Count one gate decision, e.g. `("edge", "redirect_login")`.
pub fn record_gate_decision(gate: &'static str, domain: &'static str, outcome: &'static str) {
    counter!(
        "portal_gate_decisions_total",
        "gate" => gate,
        "domain" => domain,
        "outcome" => outcome
    )
    .increment(1);
}
