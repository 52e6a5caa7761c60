use dashmap::DashMap;
use std::sync::Arc;
use surge_common::resource::route::ServiceRoute;
use surge_register::{RouteEvent, RouteListener};
use tokio::sync::OnceCell;
use tracing::debug;

/// A cache slot is filled at most once. An empty slot means a lookup is
/// still pending, `Some(None)` records a miss.
pub(crate) type RouteSlot = Arc<OnceCell<Option<Arc<ServiceRoute>>>>;

/// Two indexes, by service id and by lower-cased route path, over the same
/// routes. Registry events keep it coherent.
#[derive(Default)]
pub(crate) struct RouteIndex {
    by_id: DashMap<String, RouteSlot>,
    by_path: DashMap<String, RouteSlot>,
}

pub(crate) fn normalize_path(path: &str) -> String {
    path.to_lowercase()
}

impl RouteIndex {
    pub(crate) fn id_slot(&self, service_id: &str) -> RouteSlot {
        Self::slot(&self.by_id, service_id)
    }

    pub(crate) fn path_slot(&self, path: &str) -> RouteSlot {
        Self::slot(&self.by_path, path)
    }

    fn slot(map: &DashMap<String, RouteSlot>, key: &str) -> RouteSlot {
        if let Some(slot) = map.get(key) {
            return slot.value().clone();
        }
        map.entry(key.to_owned()).or_default().value().clone()
    }

    pub(crate) fn cached(&self, service_id: &str) -> Option<Arc<ServiceRoute>> {
        self.by_id
            .get(service_id)
            .and_then(|slot| slot.value().get().cloned().flatten())
    }

    pub(crate) fn clear(&self) {
        self.by_id.clear();
        self.by_path.clear();
    }

    fn insert(&self, route: &Arc<ServiceRoute>) {
        let slot: RouteSlot = Arc::new(OnceCell::new_with(Some(Some(route.clone()))));
        if let Some(path) = route.service_descriptor.route_path() {
            self.by_path.insert(normalize_path(path), slot.clone());
        }
        self.by_id.insert(route.service_id().to_owned(), slot);
    }

    fn evict(&self, route: &ServiceRoute) {
        self.by_id.remove(route.service_id());
        if let Some(path) = route.service_descriptor.route_path() {
            self.by_path.remove(&normalize_path(path));
        }
    }
}

impl RouteListener for RouteIndex {
    fn on_event(&self, event: &RouteEvent) {
        match event {
            RouteEvent::Created(route) => {
                debug!("route created : {}", route.service_id());
                self.insert(route);
            }
            RouteEvent::Removed(route) => {
                debug!("route removed : {}", route.service_id());
                self.evict(route);
            }
            RouteEvent::Changed { route, old } => {
                debug!("route changed : {}", route.service_id());
                self.evict(old);
                self.evict(route);
            }
        }
    }
}
