use crate::error::SurgeError;
use index::{normalize_path, RouteIndex};
use std::sync::Arc;
use surge_common::resource::route::ServiceRoute;
use surge_register::{event::Subscription, RouteManager};
use tracing::warn;

mod index;

/// Client side view of the registry.
///
/// Lookups are served from memory; a cold key costs one `get_routes` round
/// trip, shared by every caller racing on that key. `Created` events fill the
/// cache eagerly, `Changed` and `Removed` evict so the next lookup re-fetches.
pub struct RouteCache {
    manager: Arc<dyn RouteManager>,
    index: Arc<RouteIndex>,
    _subscription: Subscription,
}

impl RouteCache {
    pub fn new(manager: Arc<dyn RouteManager>) -> Self {
        let index = Arc::new(RouteIndex::default());
        let subscription = manager.subscribe(index.clone());
        Self {
            manager,
            index,
            _subscription: subscription,
        }
    }

    pub async fn locate(
        &self,
        service_id: &str,
    ) -> Result<Option<Arc<ServiceRoute>>, SurgeError> {
        let slot = self.index.id_slot(service_id);
        let route = slot
            .get_or_try_init(|| self.fetch(|route| route.service_id() == service_id))
            .await?
            .clone();
        if route.is_none() {
            warn!("not find route of service : {service_id}");
        }
        Ok(route)
    }

    pub async fn locate_by_path(
        &self,
        path: &str,
    ) -> Result<Option<Arc<ServiceRoute>>, SurgeError> {
        let path = normalize_path(path);
        let slot = self.index.path_slot(&path);
        let route = slot
            .get_or_try_init(|| {
                self.fetch(|route| {
                    route
                        .service_descriptor
                        .route_path()
                        .is_some_and(|e| normalize_path(e) == path)
                })
            })
            .await?
            .clone();
        if route.is_none() {
            warn!("not find route of path : {path}");
        }
        Ok(route)
    }

    /// Positive cache entry for `service_id`, without touching the registry.
    pub fn cached_route(&self, service_id: &str) -> Option<Arc<ServiceRoute>> {
        self.index.cached(service_id)
    }

    pub fn clear(&self) {
        self.index.clear();
    }

    async fn fetch(
        &self,
        matcher: impl Fn(&ServiceRoute) -> bool,
    ) -> Result<Option<Arc<ServiceRoute>>, SurgeError> {
        let routes = self.manager.get_routes().await?;
        Ok(routes.into_iter().find(|route| matcher(route)).map(Arc::new))
    }
}
