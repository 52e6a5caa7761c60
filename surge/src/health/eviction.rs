use super::HealthMonitor;
use std::{
    collections::HashSet,
    sync::{Arc, Weak},
};
use surge_common::resource::address::AddressModel;
use surge_register::{RouteEvent, RouteListener, RouteManager};
use tokio::runtime::Handle;
use tracing::{info, warn};

/// Drops monitor entries of endpoints that left a route once no route in the
/// registry references them anymore.
pub(crate) struct RouteRemovalEviction {
    manager: Weak<dyn RouteManager>,
    monitor: Arc<HealthMonitor>,
}

impl RouteRemovalEviction {
    pub(crate) fn new(manager: &Arc<dyn RouteManager>, monitor: Arc<HealthMonitor>) -> Self {
        Self {
            manager: Arc::downgrade(manager),
            monitor,
        }
    }
}

impl RouteListener for RouteRemovalEviction {
    fn on_event(&self, event: &RouteEvent) {
        let mut stale: Vec<AddressModel> = match event {
            RouteEvent::Created(_) => return,
            RouteEvent::Removed(route) => route.addresses.clone(),
            RouteEvent::Changed { route, old } => old
                .addresses
                .iter()
                .filter(|address| !route.addresses.contains(address))
                .cloned()
                .collect(),
        };
        stale.retain(|address| self.monitor.contains(address));
        if stale.is_empty() {
            return;
        }
        let Some(manager) = self.manager.upgrade() else {
            return;
        };
        let Ok(handle) = Handle::try_current() else {
            warn!("no runtime to evict {} monitor entries", stale.len());
            return;
        };
        let monitor = self.monitor.clone();
        handle.spawn(async move {
            match manager.get_routes().await {
                Ok(routes) => {
                    let live: HashSet<AddressModel> = routes
                        .into_iter()
                        .flat_map(|route| route.addresses)
                        .collect();
                    let evicted = monitor.evict_unreferenced(&stale, &live);
                    if evicted > 0 {
                        info!("evict {evicted} monitor entries");
                    }
                }
                Err(error) => warn!("skip monitor eviction, fetch routes error : {error}"),
            }
        });
    }
}
