//! Nullable network: record outbound frames without sending them.

use lattice_messages::PeerEndpoint;
use std::collections::HashMap;
use std::sync::Mutex;
use tokio::sync::mpsc;

const LINK_CAPACITY: usize = 1024;

/// Hands out outbound frame links that are never drained by a socket.
///
/// Each link is the same bounded channel a real connection writer reads
/// from; the frames stay queued until a test collects them.
#[derive(Debug, Default)]
pub struct NullNetwork {
    links: Mutex<HashMap<PeerEndpoint, mpsc::Receiver<Vec<u8>>>>,
}

impl NullNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) the link for `endpoint`.
    pub fn link(&self, endpoint: PeerEndpoint) -> mpsc::Sender<Vec<u8>> {
        let (tx, rx) = mpsc::channel(LINK_CAPACITY);
        self.lock().insert(endpoint, rx);
        tx
    }

    /// Drain and return every frame queued for `endpoint`.
    pub fn sent_to(&self, endpoint: &PeerEndpoint) -> Vec<Vec<u8>> {
        let mut links = self.lock();
        let mut frames = Vec::new();
        if let Some(rx) = links.get_mut(endpoint) {
            while let Ok(frame) = rx.try_recv() {
                frames.push(frame);
            }
        }
        frames
    }

    /// Drain every link, keyed by endpoint.
    pub fn drain_all(&self) -> HashMap<PeerEndpoint, Vec<Vec<u8>>> {
        let endpoints: Vec<PeerEndpoint> = self.lock().keys().copied().collect();
        endpoints
            .into_iter()
            .map(|ep| (ep, self.sent_to(&ep)))
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<PeerEndpoint, mpsc::Receiver<Vec<u8>>>> {
        self.links.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
