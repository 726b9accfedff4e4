//! Controller and action builders.

use std::sync::Arc;

use axum::routing::MethodRouter;
use axum::Router;

use crate::filters::{ActionDescriptor, ActionFilterLayer, FilterFactory, FilterScope, ScopedFilter};
use crate::services::ServiceProvider;

/// One action of a controller.
pub struct Action {
    name: &'static str,
    path: String,
    method_router: MethodRouter,
    filters: Vec<Arc<dyn FilterFactory>>,
}

impl Action {
    /// `path` is relative to the controller's base path.
    pub fn new(name: &'static str, path: impl Into<String>, method_router: MethodRouter) -> Self {
        Self {
            name,
            path: path.into(),
            method_router,
            filters: Vec::new(),
        }
    }

    /// Place a marker on this action only.
    pub fn filter(mut self, factory: impl FilterFactory + 'static) -> Self {
        self.filters.push(Arc::new(factory));
        self
    }
}

/// A named group of actions sharing a base path and controller-scope markers.
pub struct ControllerRoutes {
    name: &'static str,
    base_path: String,
    services: Arc<ServiceProvider>,
    filters: Vec<Arc<dyn FilterFactory>>,
    actions: Vec<Action>,
}

impl ControllerRoutes {
    pub fn new(name: &'static str, base_path: impl Into<String>, services: Arc<ServiceProvider>) -> Self {
        Self {
            name,
            base_path: base_path.into(),
            services,
            filters: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Place a marker on the controller; it applies to every action.
    pub fn filter(mut self, factory: impl FilterFactory + 'static) -> Self {
        self.filters.push(Arc::new(factory));
        self
    }

    pub fn action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Descriptors of every registered action, in registration order.
    pub fn descriptors(&self) -> Vec<ActionDescriptor> {
        self.actions.iter().map(|a| self.describe(a)).collect()
    }

    fn describe(&self, action: &Action) -> ActionDescriptor {
        let controller_scope = self.filters.iter().map(|factory| ScopedFilter {
            scope: FilterScope::Controller,
            factory: factory.clone(),
        });
        let action_scope = action.filters.iter().map(|factory| ScopedFilter {
            scope: FilterScope::Action,
            factory: factory.clone(),
        });

        ActionDescriptor {
            controller: self.name,
            action: action.name,
            path: join_path(&self.base_path, &action.path),
            filters: controller_scope.chain(action_scope).collect(),
        }
    }

    pub fn into_router(self) -> Router {
        let mut router = Router::new();

        for action in &self.actions {
            let descriptor = Arc::new(self.describe(action));
            tracing::debug!(
                action = %descriptor.display_name(),
                path = %descriptor.path,
                filters = descriptor.filters.len(),
                "Action registered"
            );

            let path = descriptor.path.clone();
            let method_router = action
                .method_router
                .clone()
                .layer(ActionFilterLayer::new(descriptor, self.services.clone()));
            router = router.route(&path, method_router);
        }

        router
    }
}

/// Join a controller base path and an action path into one route path.
fn join_path(base: &str, path: &str) -> String {
    let mut joined = String::from("/");
    joined.push_str(base.trim_matches('/'));

    let tail = path.trim_matches('/');
    if !tail.is_empty() {
        if joined.len() > 1 {
            joined.push('/');
        }
        joined.push_str(tail);
    }
    joined
}
