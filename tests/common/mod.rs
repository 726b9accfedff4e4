//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use action_log::config::ServiceConfig;
use action_log::controllers;
use action_log::services::{ServiceCollection, ServiceProvider};
use action_log::{HttpServer, Shutdown};
use axum::body::Body;
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;

#[path = "../../src/observability/capture.rs"]
mod capture;

pub use capture::CapturedLogs;

/// Provider with every controller service registered.
pub fn services() -> Arc<ServiceProvider> {
    let mut services = ServiceCollection::new();
    controllers::register_services(&mut services);
    services.build()
}

/// Fully layered application router.
pub fn app(services: Arc<ServiceProvider>) -> Router {
    HttpServer::build_router(&ServiceConfig::default(), services)
}

/// Send a GET through `router` in-process.
pub async fn get(router: &Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    router.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Serve the application on an ephemeral port until `shutdown` triggers.
pub async fn start_server(shutdown: &Shutdown) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = HttpServer::new(ServiceConfig::default(), services());
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    tokio::time::sleep(Duration::from_millis(100)).await;
    addr
}
