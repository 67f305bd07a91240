//! Axum status server.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use prometheus::Registry;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::error::RpcError;
use crate::handlers::{metrics_handler, status_handler, PeerCountSource, StatusState};

pub fn create_router(state: StatusState) -> Router {
    Router::new()
        .route("/", get(status_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

pub struct StatusServer {
    listen_addr: SocketAddr,
    state: StatusState,
}

pub struct StatusServerHandle {
    local_addr: SocketAddr,
    task: JoinHandle<()>,
}

impl StatusServerHandle {
    /// The bound address; differs from the configured one when port 0 was asked for.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn abort(&self) {
        self.task.abort();
    }

    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        self.task.await
    }
}

impl StatusServer {
    pub fn new(listen_addr: SocketAddr, peers: Arc<dyn PeerCountSource>) -> Self {
        Self {
            listen_addr,
            state: StatusState { peers, metrics: None },
        }
    }

    pub fn with_metrics(mut self, registry: Registry) -> Self {
        self.state.metrics = Some(registry);
        self
    }

    /// Bind and serve until `shutdown` fires.
    pub async fn start(self, mut shutdown: broadcast::Receiver<()>) -> Result<StatusServerHandle, RpcError> {
        let listener = TcpListener::bind(self.listen_addr).await?;
        let local_addr = listener.local_addr()?;
        info!(addr = %local_addr, "status endpoint listening");

        let router = create_router(self.state);
        let task = tokio::spawn(async move {
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(async move {
                    let _ = shutdown.recv().await;
                })
                .await;
            if let Err(e) = served {
                error!(error = ?e, "status endpoint error");
            }
        });

        Ok(StatusServerHandle { local_addr, task })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::StatusResponse;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use prometheus::IntCounter;
    use tower::ServiceExt;

    struct Fixed(usize);

    impl PeerCountSource for Fixed {
        fn peer_count(&self) -> usize {
            self.0
        }
    }

    fn state(count: usize, metrics: Option<Registry>) -> StatusState {
        StatusState {
            peers: Arc::new(Fixed(count)),
            metrics,
        }
    }

    async fn get_body(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024).await.unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn root_reports_peer_count_as_string() {
        let (status, body) = get_body(create_router(state(7, None)), "/").await;
        assert_eq!(status, StatusCode::OK);
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, serde_json::json!({ "peerCount": "7" }));
    }

    #[tokio::test]
    async fn metrics_disabled_is_not_found() {
        let (status, _) = get_body(create_router(state(0, None)), "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn metrics_are_exported() {
        let registry = Registry::new();
        let counter = IntCounter::new("votes_received", "votes").unwrap();
        registry.register(Box::new(counter.clone())).unwrap();
        counter.inc_by(3);

        let (status, body) = get_body(create_router(state(0, Some(registry))), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(String::from_utf8(body).unwrap().contains("votes_received 3"));
    }

    #[tokio::test]
    async fn registry_counts_only_handshaken_peers() {
        use lattice_messages::PeerEndpoint;
        use lattice_network::PeerRegistry;
        use lattice_types::PublicKey;
        use std::net::Ipv6Addr;
        use std::sync::Mutex;

        let mut registry = PeerRegistry::new(10);
        let (tx, _rx) = tokio::sync::mpsc::channel(4);
        let a = PeerEndpoint::new(Ipv6Addr::LOCALHOST, 1000);
        let b = PeerEndpoint::new(Ipv6Addr::LOCALHOST, 1001);
        registry.attach(a, tx.clone());
        registry.attach(b, tx);
        registry.set_node_id(&a, PublicKey([1; 32])).unwrap();

        let source: Arc<dyn PeerCountSource> = Arc::new(Mutex::new(registry));
        let (_, body) = get_body(
            create_router(StatusState { peers: source, metrics: None }),
            "/",
        )
        .await;
        assert_eq!(body, br#"{"peerCount":"1"}"#.to_vec());
    }

    #[tokio::test]
    async fn server_binds_and_shuts_down() {
        let (tx, rx) = broadcast::channel(1);
        let server = StatusServer::new("127.0.0.1:0".parse().unwrap(), Arc::new(Fixed(1)));
        let handle = server.start(rx).await.unwrap();
        assert_ne!(handle.local_addr().port(), 0);
        tx.send(()).unwrap();
        handle.join().await.unwrap();
    }

    #[test]
    fn response_shape() {
        let r = StatusResponse { peer_count: "2".into() };
        assert_eq!(serde_json::to_string(&r).unwrap(), r#"{"peerCount":"2"}"#);
    }
}
