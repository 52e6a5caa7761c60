use std::sync::Arc;
use surge_common::{resource::route::ServiceRoute, BoxFuture};

use crate::{error::RegisterError, event::Subscription};

pub mod error;
pub mod event;
pub mod factory;
pub mod support;

/// Change notification raised by a registry backend. Every variant carries
/// the complete route, never a diff.
#[derive(Debug, Clone)]
pub enum RouteEvent {
    Created(Arc<ServiceRoute>),
    Removed(Arc<ServiceRoute>),
    Changed {
        route: Arc<ServiceRoute>,
        old: Arc<ServiceRoute>,
    },
}

pub trait RouteListener: Send + Sync {
    fn on_event(&self, event: &RouteEvent);
}

/// Contract of the authoritative route store (Consul, Zookeeper, Nacos, ...).
pub trait RouteManager: Send + Sync {
    fn get_routes(&self) -> BoxFuture<Result<Vec<ServiceRoute>, RegisterError>>;

    fn set_routes(&self, routes: Vec<ServiceRoute>) -> BoxFuture<Result<(), RegisterError>>;

    fn clear_all(&self) -> BoxFuture<Result<(), RegisterError>>;

    /// Registers a listener for [`RouteEvent`]s. The listener stays attached
    /// until the returned [`Subscription`] is dropped or unsubscribed.
    fn subscribe(&self, listener: Arc<dyn RouteListener>) -> Subscription;
}
