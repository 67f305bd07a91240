//! Request handlers and the state they read.

use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use lattice_network::PeerRegistry;
use prometheus::{Encoder, Registry, TextEncoder};
use serde::{Deserialize, Serialize};

/// Anything that can report the number of handshaken peers.
pub trait PeerCountSource: Send + Sync {
    fn peer_count(&self) -> usize;
}

impl PeerCountSource for Mutex<PeerRegistry> {
    fn peer_count(&self) -> usize {
        match self.lock() {
            Ok(registry) => registry.handshaken_count(),
            Err(poisoned) => poisoned.into_inner().handshaken_count(),
        }
    }
}

#[derive(Clone)]
pub struct StatusState {
    pub peers: Arc<dyn PeerCountSource>,
    pub metrics: Option<Registry>,
}

/// Body of `GET /`. The count is a decimal string.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    #[serde(rename = "peerCount")]
    pub peer_count: String,
}

/// Handler for `GET /`.
pub async fn status_handler(State(state): State<StatusState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        peer_count: state.peers.peer_count().to_string(),
    })
}

/// Handler for `GET /metrics`.
pub async fn metrics_handler(State(state): State<StatusState>) -> Response {
    let Some(registry) = state.metrics else {
        return (StatusCode::NOT_FOUND, "metrics disabled").into_response();
    };

    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        tracing::error!(error = ?e, "failed to encode metrics");
        return (StatusCode::INTERNAL_SERVER_ERROR, "failed to encode metrics").into_response();
    }

    ([(header::CONTENT_TYPE, encoder.format_type().to_string())], buffer).into_response()
}
