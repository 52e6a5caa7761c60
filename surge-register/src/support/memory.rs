use crate::{
    error::RegisterError,
    event::{RouteEventBus, Subscription},
    factory::ServiceRouteFactory,
    RouteEvent, RouteListener, RouteManager,
};
use std::{collections::HashMap, sync::Arc};
use surge_common::{
    resource::route::{ServiceRoute, ServiceRouteDescriptor},
    BoxFuture,
};
use tokio::sync::RwLock;
use tracing::info;

/// In-process registry. Routes are kept in their serialized form, the way a
/// remote backend stores them, and every mutation raises the matching
/// [`RouteEvent`]s.
#[derive(Clone, Default)]
pub struct MemoryRouteManager {
    descriptors: Arc<RwLock<Vec<ServiceRouteDescriptor>>>,
    factory: Arc<ServiceRouteFactory>,
    bus: Arc<RouteEventBus>,
}

impl MemoryRouteManager {
    pub fn new(factory: Arc<ServiceRouteFactory>) -> Self {
        Self {
            descriptors: Default::default(),
            factory,
            bus: Default::default(),
        }
    }

    /// Seeds the store without raising events.
    pub fn with_descriptors(descriptors: Vec<ServiceRouteDescriptor>) -> Self {
        Self {
            descriptors: Arc::new(RwLock::new(descriptors)),
            ..Default::default()
        }
    }

    pub async fn descriptors(&self) -> Vec<ServiceRouteDescriptor> {
        self.descriptors.read().await.clone()
    }

    pub fn listener_count(&self) -> usize {
        self.bus.listener_count()
    }

    fn diff(old: Vec<ServiceRoute>, new: &[ServiceRoute]) -> Vec<RouteEvent> {
        let mut old: HashMap<String, ServiceRoute> = old
            .into_iter()
            .map(|route| (route.service_descriptor.id.clone(), route))
            .collect();
        let mut events = vec![];
        for route in new {
            match old.remove(route.service_id()) {
                None => events.push(RouteEvent::Created(Arc::new(route.clone()))),
                Some(previous) if previous != *route => events.push(RouteEvent::Changed {
                    route: Arc::new(route.clone()),
                    old: Arc::new(previous),
                }),
                Some(_) => {}
            }
        }
        events.extend(
            old.into_values()
                .map(|route| RouteEvent::Removed(Arc::new(route))),
        );
        events
    }
}

impl RouteManager for MemoryRouteManager {
    fn get_routes(&self) -> BoxFuture<Result<Vec<ServiceRoute>, RegisterError>> {
        let manager = self.clone();
        Box::pin(async move {
            let descriptors = manager.descriptors.read().await;
            Ok(manager.factory.create_service_routes(&descriptors))
        })
    }

    fn set_routes(&self, routes: Vec<ServiceRoute>) -> BoxFuture<Result<(), RegisterError>> {
        let manager = self.clone();
        Box::pin(async move {
            let descriptors = routes
                .iter()
                .map(|route| manager.factory.create_descriptor(route))
                .collect::<Result<Vec<_>, _>>()?;
            let routes = manager.factory.create_service_routes(&descriptors);
            let mut store = manager.descriptors.write().await;
            let old = std::mem::replace(&mut *store, descriptors);
            let events = Self::diff(manager.factory.create_service_routes(&old), &routes);
            info!("memory register set {} routes, {} changes", routes.len(), events.len());
            // published under the lock so concurrent writers emit in store order
            for event in events {
                manager.bus.publish(&event);
            }
            Ok(())
        })
    }

    fn clear_all(&self) -> BoxFuture<Result<(), RegisterError>> {
        let manager = self.clone();
        Box::pin(async move {
            let mut store = manager.descriptors.write().await;
            let routes = manager.factory.create_service_routes(&std::mem::take(&mut *store));
            info!("memory register clear {} routes", routes.len());
            for route in routes {
                manager.bus.publish(&RouteEvent::Removed(Arc::new(route)));
            }
            Ok(())
        })
    }

    fn subscribe(&self, listener: Arc<dyn RouteListener>) -> Subscription {
        self.bus.subscribe(listener)
    }
}
