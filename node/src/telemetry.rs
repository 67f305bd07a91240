//! The node's own telemetry and the periodic telemetry_req loop.

use std::sync::Arc;
use std::time::Duration;

use lattice_crypto::sign_message;
use lattice_messages::{Message, TelemetryData};
use lattice_types::PublicKey;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::context::NodeContext;
use crate::NodeError;

fn version_part(part: &str) -> u8 {
    part.parse().unwrap_or_default()
}

/// Build and sign the telemetry this node reports about itself.
pub fn local_telemetry(ctx: &NodeContext) -> Result<TelemetryData, NodeError> {
    let now = ctx.now();
    let block_count = ctx.store().block_count()?;
    let (peer_count, cemented_count) = {
        let peers = ctx.lock_registry().len();
        let cemented = ctx.lock_engine().confirmed_count();
        (peers, cemented)
    };

    let mut data = TelemetryData {
        node_id: ctx.node_id(),
        block_count,
        cemented_count: cemented_count as u64,
        account_count: ctx.store().frontiers(&PublicKey::ZERO, usize::MAX)?.len() as u64,
        peer_count: u32::try_from(peer_count).unwrap_or(u32::MAX),
        protocol_version: ctx.constants().version.using,
        uptime: ctx.started_at().elapsed_since(now) / 1000,
        major_version: version_part(env!("CARGO_PKG_VERSION_MAJOR")),
        minor_version: version_part(env!("CARGO_PKG_VERSION_MINOR")),
        patch_version: version_part(env!("CARGO_PKG_VERSION_PATCH")),
        timestamp: now.as_millis(),
        ..Default::default()
    };
    data.signature = sign_message(&data.signed_payload(), &ctx.node_key().private);
    Ok(data)
}

/// Every telemetry cutoff interval, stamp each connected peer and send an
/// empty telemetry_req. The first round goes out one interval after start.
pub fn spawn_telemetry_loop(ctx: Arc<NodeContext>) -> JoinHandle<()> {
    let period = Duration::from_millis(ctx.constants().telemetry_cache_cutoff_ms);
    let mut shutdown = ctx.shutdown().subscribe();

    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_ms = period.as_millis() as u64, "telemetry requests enabled");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let sent = ctx.request_telemetry();
                    debug!(peers = sent, "telemetry_req sent");
                }
                _ = shutdown.recv() => break,
            }
        }
        debug!("telemetry loop stopped");
    })
}

/// Frame for a telemetry_req; the message has no body.
pub(crate) fn request_frame(ctx: &NodeContext) -> Vec<u8> {
    ctx.encoder().encode(&Message::TelemetryReq)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeConfig;
    use lattice_crypto::{Ed25519Verifier, SignatureVerifier};
    use lattice_nullables::NullClock;
    use lattice_store::MemoryStore;

    fn context() -> NodeContext {
        let config = NodeConfig {
            node_seed: Some("22".repeat(32)),
            ..Default::default()
        };
        NodeContext::new(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(Ed25519Verifier),
            Arc::new(NullClock::new(5_000)),
        )
        .unwrap()
    }

    #[test]
    fn local_telemetry_is_signed_by_node_key() {
        let ctx = context();
        let data = local_telemetry(&ctx).unwrap();
        assert_eq!(data.node_id, ctx.node_id());
        assert_eq!(data.timestamp, 5_000);
        assert_eq!(data.protocol_version, 0x12);
        assert!(Ed25519Verifier.verify(&data.node_id, &data.signed_payload(), &data.signature));
    }

    #[test]
    fn request_frame_has_only_a_header() {
        let ctx = context();
        assert_eq!(request_frame(&ctx).len(), lattice_messages::HEADER_SIZE);
    }
}
