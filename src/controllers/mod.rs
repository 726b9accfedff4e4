//! Application controllers.
//!
//! - `weather`: forecast endpoints, entry/exit logged on `Get` only
//! - `diagnostics`: service status endpoints, every action logged

pub mod diagnostics;
pub mod weather;

use std::sync::Arc;

use axum::Router;

use crate::filters::LogActionFilter;
use crate::services::{ServiceCollection, ServiceProvider};

/// Register every service the controllers' markers resolve.
pub fn register_services(services: &mut ServiceCollection) {
    LogActionFilter::register(services);
}

/// Routes of all controllers.
pub fn routes(services: Arc<ServiceProvider>) -> Router {
    Router::new()
        .merge(weather::controller(services.clone()).into_router())
        .merge(diagnostics::controller(services).into_router())
}
