use axum::{Router, http::StatusCode, routing::get};
use std::net::SocketAddr;

/// A throwaway HTTP server standing in for the monitored application.
pub struct TestApp {
    pub addr: SocketAddr,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Serves `body` with `status` on `/health`, plus a fixed `/metrics` object
/// and a `/slow` route that answers after two seconds.
pub async fn spawn_app(status: StatusCode, body: &'static str) -> TestApp {
    let app = Router::new()
        .route("/health", get(move || async move { (status, body) }))
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(2)).await;
                (StatusCode::OK, "{}")
            }),
        )
        .route(
            "/metrics",
            get(|| async {
                (
                    StatusCode::OK,
                    r#"{"cpu_percent": 93.0, "memory_percent": 40.0, "error_rate_percent": 0.5}"#,
                )
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    let addr = listener.local_addr().expect("missing local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server failed");
    });

    TestApp { addr }
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test listener");
    listener.local_addr().expect("missing local addr")
}

pub const HEALTHY_REPORT: &str = r#"{
    "status": "Healthy",
    "totalDuration": "00:00:00.031",
    "results": {
        "cosmosdb": {"status": "Healthy"},
        "servicebus": {"status": "Healthy"}
    }
}"#;

pub const DEGRADED_REPORT: &str = r#"{
    "status": "Degraded",
    "results": {
        "cosmosdb": {"status": "Healthy"},
        "servicebus": {"status": "Degraded", "description": "slow sender"}
    }
}"#;

pub const UNHEALTHY_ENTRY_REPORT: &str = r#"{
    "status": "Degraded",
    "results": {
        "cosmosdb": {"status": "Healthy"},
        "keyvault": {"status": "Unhealthy"}
    }
}"#;
