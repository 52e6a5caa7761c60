pub mod command;
pub mod config;
pub mod error;
pub mod handler;
pub mod health;
pub mod resolver;
pub mod route;

use crate::{
    command::{CommandProvider, ShuntStrategy},
    config::SurgeConfig,
    error::SurgeError,
    handler::{loadbalance::AddressSelector, SelectorContext},
    health::{
        eviction::RouteRemovalEviction,
        probe::{HealthProbe, TcpProbe},
        HealthMonitor,
    },
    resolver::AddressResolver,
    route::RouteCache,
};
use std::sync::Arc;
pub use surge_common;
use surge_common::{config::get_config_by_file, resource::address::AddressModel};
pub use surge_register;
use surge_register::{event::Subscription, RouteManager};
use tokio::task::JoinHandle;
use tracing::info;

pub type Result<T> = std::result::Result<T, SurgeError>;

#[derive(Default)]
pub struct SurgeContextBuilder {
    config: SurgeConfig,
    route_manager: Option<Arc<dyn RouteManager>>,
    probe: Option<Arc<dyn HealthProbe>>,
    selectors: Vec<(ShuntStrategy, Arc<dyn AddressSelector>)>,
}

impl SurgeContextBuilder {
    pub fn config(mut self, config: SurgeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config_file(self, path: &str) -> Result<Self> {
        let config: SurgeConfig = get_config_by_file(path)?;
        Ok(self.config(config))
    }

    pub fn route_manager(mut self, route_manager: Arc<dyn RouteManager>) -> Self {
        self.route_manager = Some(route_manager);
        self
    }

    /// Replaces the TCP connect probe.
    pub fn probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    pub fn selector(mut self, strategy: ShuntStrategy, selector: Arc<dyn AddressSelector>) -> Self {
        self.selectors.push((strategy, selector));
        self
    }

    pub fn build(self) -> Result<SurgeContext> {
        let SurgeContextBuilder {
            config,
            route_manager,
            probe,
            selectors,
        } = self;
        let route_manager =
            route_manager.ok_or_else(|| SurgeError::Error("route manager is required".into()))?;
        let probe = probe.unwrap_or_else(|| Arc::new(TcpProbe));

        let mut selector_context = SelectorContext::new(config.selector.virtual_nodes);
        for (strategy, selector) in selectors {
            selector_context.insert(strategy, selector);
        }
        let route_cache = Arc::new(RouteCache::new(route_manager.clone()));
        let health_monitor = Arc::new(HealthMonitor::new(probe, config.health.clone()));
        let command_provider = Arc::new(CommandProvider::new(
            config.command.default.clone(),
            config.command.services.clone(),
        ));
        let eviction = config.health.evict_on_route_removal.then(|| {
            route_manager.subscribe(Arc::new(RouteRemovalEviction::new(
                &route_manager,
                health_monitor.clone(),
            )))
        });
        info!(
            "surge context built, {} command overrides, monitor eviction {}",
            config.command.services.len(),
            eviction.is_some()
        );
        Ok(SurgeContext {
            resolver: Arc::new(AddressResolver::new(
                route_cache,
                health_monitor,
                command_provider,
                Arc::new(selector_context),
            )),
            route_manager,
            _eviction: eviction,
        })
    }
}

/// Everything one process needs to resolve services. Build it once at
/// startup and hand out references.
pub struct SurgeContext {
    resolver: Arc<AddressResolver>,
    route_manager: Arc<dyn RouteManager>,
    _eviction: Option<Subscription>,
}

impl SurgeContext {
    pub fn builder() -> SurgeContextBuilder {
        SurgeContextBuilder::default()
    }

    pub async fn resolve(&self, service_id: &str, item: Option<&str>) -> Result<AddressModel> {
        self.resolver.resolve(service_id, item).await
    }

    pub fn resolver(&self) -> Arc<AddressResolver> {
        self.resolver.clone()
    }

    pub fn route_manager(&self) -> &Arc<dyn RouteManager> {
        &self.route_manager
    }

    pub fn route_cache(&self) -> &Arc<RouteCache> {
        self.resolver.route_cache()
    }

    pub fn health_monitor(&self) -> &Arc<HealthMonitor> {
        self.resolver.health_monitor()
    }

    pub fn command_provider(&self) -> &Arc<CommandProvider> {
        self.resolver.command_provider()
    }

    /// Spawns the periodic probe cycle on the current tokio runtime.
    pub fn start_health_check(&self) -> JoinHandle<()> {
        self.health_monitor().spawn()
    }
}
