use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: availability checks answered. Labels: outcome.
pub const AVAILABILITY_CHECKS_TOTAL: &str = "roomkeeper_availability_checks_total";

/// Counter: reservation requests refused because of an overlap.
pub const CONFLICTS_DETECTED_TOTAL: &str = "roomkeeper_conflicts_detected_total";

/// Counter: reservations created. Labels: none.
pub const RESERVATIONS_REQUESTED_TOTAL: &str = "roomkeeper_reservations_requested_total";

// ── USE metrics (resource utilization) ──────────────────────────

/// Gauge: rooms currently in the registry.
pub const ROOMS_ACTIVE: &str = "roomkeeper_rooms_active";

/// Counter: reservations finalized by the sweeper.
pub const SWEEPER_COMPLETED_TOTAL: &str = "roomkeeper_sweeper_completed_total";

/// Histogram: sweep pass duration in seconds.
pub const SWEEP_DURATION_SECONDS: &str = "roomkeeper_sweep_duration_seconds";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
