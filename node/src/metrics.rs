//! Prometheus metrics for the lattice node.
//!
//! [`NodeMetrics`] owns a dedicated [`Registry`] that the status endpoint's
//! `/metrics` route encodes into the Prometheus text format.

use prometheus::{
    register_int_counter_with_registry, register_int_gauge_with_registry, IntCounter, IntGauge,
    Opts, Registry,
};

pub struct NodeMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Complete messages decoded from peer connections.
    pub messages_received: IntCounter,
    /// confirm_ack messages received, valid or not.
    pub votes_received: IntCounter,
    /// confirm_ack messages whose signature did not verify.
    pub votes_invalid: IntCounter,
    pub elections_started: IntCounter,
    pub elections_confirmed: IntCounter,
    /// telemetry_ack messages rejected as mismatched, unsolicited or late.
    pub telemetry_rejected: IntCounter,
    /// Connections closed because their byte stream could not be framed.
    pub framing_errors: IntCounter,
    /// Blocks stored from bulk_pull responses.
    pub blocks_bootstrapped: IntCounter,

    // ── Gauges ──────────────────────────────────────────────────────────
    /// Peers that completed the node-id handshake.
    pub peer_count: IntGauge,
    pub active_elections: IntGauge,
    pub inactive_elections: IntGauge,
}

fn counter(registry: &Registry, name: &str, help: &str) -> IntCounter {
    register_int_counter_with_registry!(Opts::new(name, help), registry)
        .unwrap_or_else(|e| panic!("failed to register {name} counter: {e}"))
}

fn gauge(registry: &Registry, name: &str, help: &str) -> IntGauge {
    register_int_gauge_with_registry!(Opts::new(name, help), registry)
        .unwrap_or_else(|e| panic!("failed to register {name} gauge: {e}"))
}

impl NodeMetrics {
    /// Create a fresh set of metrics under a new [`Registry`].
    ///
    /// # Panics
    ///
    /// Only if two metrics share a name, which is a programming error.
    pub fn new() -> Self {
        let registry = Registry::new();

        let messages_received = counter(
            &registry,
            "lattice_messages_received_total",
            "Messages decoded from peer connections",
        );
        let votes_received = counter(&registry, "lattice_votes_received_total", "confirm_ack messages received");
        let votes_invalid = counter(
            &registry,
            "lattice_votes_invalid_total",
            "confirm_ack messages with an invalid signature",
        );
        let elections_started = counter(
            &registry,
            "lattice_elections_started_total",
            "Inactive elections promoted to active",
        );
        let elections_confirmed = counter(
            &registry,
            "lattice_elections_confirmed_total",
            "Elections that reached quorum",
        );
        let telemetry_rejected = counter(
            &registry,
            "lattice_telemetry_rejected_total",
            "telemetry_ack messages rejected",
        );
        let framing_errors = counter(
            &registry,
            "lattice_framing_errors_total",
            "Connections closed on a framing error",
        );
        let blocks_bootstrapped = counter(
            &registry,
            "lattice_blocks_bootstrapped_total",
            "Blocks stored from bulk_pull responses",
        );

        let peer_count = gauge(&registry, "lattice_peer_count", "Peers that completed the handshake");
        let active_elections = gauge(&registry, "lattice_active_elections", "Active elections, confirmed or not");
        let inactive_elections = gauge(
            &registry,
            "lattice_inactive_elections",
            "Inactive elections awaiting promotion",
        );

        Self {
            registry,
            messages_received,
            votes_received,
            votes_invalid,
            elections_started,
            elections_confirmed,
            telemetry_rejected,
            framing_errors,
            blocks_bootstrapped,
            peer_count,
            active_elections,
            inactive_elections,
        }
    }
}

impl Default for NodeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
