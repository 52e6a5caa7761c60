use crate::{
    command::CommandProvider,
    error::SurgeError,
    handler::{loadbalance::AddressSelectContext, SelectorContext},
    health::HealthMonitor,
    route::RouteCache,
};
use futures::future::join_all;
use std::sync::Arc;
use surge_common::resource::{address::AddressModel, route::ServiceRoute};
use tracing::{debug, warn};

/// Turns a service id into one healthy endpoint.
///
/// Runs on every outbound call: the route comes from the cache, health from
/// the monitor's bookkeeping, so the registry and the network are only
/// touched for cold keys and never-probed endpoints.
pub struct AddressResolver {
    route_cache: Arc<RouteCache>,
    health_monitor: Arc<HealthMonitor>,
    command_provider: Arc<CommandProvider>,
    selectors: Arc<SelectorContext>,
}

impl AddressResolver {
    pub fn new(
        route_cache: Arc<RouteCache>,
        health_monitor: Arc<HealthMonitor>,
        command_provider: Arc<CommandProvider>,
        selectors: Arc<SelectorContext>,
    ) -> Self {
        Self {
            route_cache,
            health_monitor,
            command_provider,
            selectors,
        }
    }

    pub async fn resolve(
        &self,
        service_id: &str,
        item: Option<&str>,
    ) -> Result<AddressModel, SurgeError> {
        let route = self
            .route_cache
            .locate(service_id)
            .await?
            .ok_or_else(|| SurgeError::NotFound(service_id.to_owned()))?;
        self.select(&route, item).await
    }

    pub async fn resolve_by_path(
        &self,
        path: &str,
        item: Option<&str>,
    ) -> Result<AddressModel, SurgeError> {
        let route = self
            .route_cache
            .locate_by_path(path)
            .await?
            .ok_or_else(|| SurgeError::NotFound(path.to_owned()))?;
        self.select(&route, item).await
    }

    async fn select(
        &self,
        route: &ServiceRoute,
        item: Option<&str>,
    ) -> Result<AddressModel, SurgeError> {
        let service_id = route.service_id();
        for address in &route.addresses {
            self.health_monitor.monitor(address);
        }
        let checks = route.addresses.iter().map(|address| async move {
            self.health_monitor
                .is_healthy(address)
                .await
                .then(|| address.clone())
        });
        let healthy: Vec<AddressModel> = join_all(checks).await.into_iter().flatten().collect();
        if healthy.is_empty() {
            warn!(
                "service {service_id} has {} addresses, none healthy",
                route.addresses.len()
            );
            return Err(SurgeError::NoHealthyAddress(service_id.to_owned()));
        }
        let command = self.command_provider.get_command(service_id);
        let address = self.selectors.get(command.shunt_strategy)?.select(&AddressSelectContext {
            descriptor: &route.service_descriptor,
            addresses: &healthy,
            item,
        })?;
        debug!(
            "resolve {service_id} by {:?} -> {address} ({}/{} healthy)",
            command.shunt_strategy,
            healthy.len(),
            route.addresses.len()
        );
        Ok(address)
    }

    pub fn route_cache(&self) -> &Arc<RouteCache> {
        &self.route_cache
    }

    pub fn health_monitor(&self) -> &Arc<HealthMonitor> {
        &self.health_monitor
    }

    pub fn command_provider(&self) -> &Arc<CommandProvider> {
        &self.command_provider
    }
}
