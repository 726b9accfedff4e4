//! Metadata and per-request contexts handed to action filters.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::Request;
use axum::http::{Method, StatusCode, Uri};

use crate::filters::FilterFactory;

/// Where a marker was placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterScope {
    /// On the controller; applies to every action.
    Controller,
    /// On a single action.
    Action,
}

/// A marker together with its placement.
#[derive(Debug, Clone)]
pub struct ScopedFilter {
    pub scope: FilterScope,
    pub factory: Arc<dyn FilterFactory>,
}

/// Static description of one routed action.
#[derive(Debug, Clone)]
pub struct ActionDescriptor {
    pub controller: &'static str,
    pub action: &'static str,
    /// Full route path, including the controller's base path.
    pub path: String,
    /// Controller-scope markers first, then action-scope markers.
    pub filters: Vec<ScopedFilter>,
}

impl ActionDescriptor {
    /// Display name in `Controller.Action` form.
    pub fn display_name(&self) -> String {
        format!("{}.{}", self.controller, self.action)
    }
}

/// Context seen by [`ActionFilter::on_action_executing`](crate::filters::ActionFilter::on_action_executing).
#[derive(Debug, Clone)]
pub struct ActionExecutingContext {
    pub descriptor: Arc<ActionDescriptor>,
    pub request_id: Option<String>,
    pub method: Method,
    pub uri: Uri,
}

impl ActionExecutingContext {
    pub fn from_request(descriptor: Arc<ActionDescriptor>, request: &Request) -> Self {
        Self {
            descriptor,
            request_id: request_id(request),
            method: request.method().clone(),
            uri: request.uri().clone(),
        }
    }
}

/// Context seen by [`ActionFilter::on_action_executed`](crate::filters::ActionFilter::on_action_executed).
#[derive(Debug, Clone)]
pub struct ActionExecutedContext {
    pub descriptor: Arc<ActionDescriptor>,
    pub request_id: Option<String>,
    pub status: StatusCode,
    pub elapsed: Duration,
}

fn request_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get(crate::http::X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}
