//! Diagnostics controller.
//!
//! Carries the log marker at controller scope, so every action here logs
//! entry and exit.

use std::sync::Arc;

use axum::{routing::get, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::filters::LogAttribute;
use crate::mvc::{Action, ControllerRoutes};
use crate::services::ServiceProvider;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub version: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerTime {
    pub utc: DateTime<Utc>,
}

pub fn controller(services: Arc<ServiceProvider>) -> ControllerRoutes {
    ControllerRoutes::new("Diagnostics", "/diagnostics", services)
        .filter(LogAttribute)
        .action(Action::new("Status", "/status", get(get_status)))
        .action(Action::new("Time", "/time", get(get_time)))
}

async fn get_status() -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION").to_string(),
        status: "operational".to_string(),
    })
}

async fn get_time() -> Json<ServerTime> {
    Json(ServerTime { utc: Utc::now() })
}
