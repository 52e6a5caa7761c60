use serde::Deserialize;
use std::sync::Arc;
use surge_rs::{
    config::SurgeConfig,
    surge_common::{
        config::get_config_by_file, logs::init_log, resource::route::ServiceRouteDescriptor,
    },
    surge_register::support::memory::MemoryRouteManager,
    SurgeContext,
};
use tracing::{error, info};

#[derive(Deserialize)]
struct DemoConfig {
    #[serde(flatten)]
    surge: SurgeConfig,
    #[serde(default)]
    routes: Vec<ServiceRouteDescriptor>,
}

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() {
    init_log();
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "demos/config/surge.yaml".to_owned());
    let config: DemoConfig = match get_config_by_file(&path) {
        Ok(config) => config,
        Err(error) => {
            error!("load config {path} error : {error}");
            return;
        }
    };
    let service_ids: Vec<String> = config
        .routes
        .iter()
        .map(|route| route.service_descriptor.id.clone())
        .collect();
    let context = match SurgeContext::builder()
        .config(config.surge)
        .route_manager(Arc::new(MemoryRouteManager::with_descriptors(config.routes)))
        .build()
    {
        Ok(context) => context,
        Err(error) => {
            error!("build context error : {error}");
            return;
        }
    };
    let health_check = context.start_health_check();
    for service_id in service_ids {
        for item in ["user:1001", "user:1002"] {
            match context.resolve(&service_id, Some(item)).await {
                Ok(address) => info!("{service_id} [{item}] -> {address}"),
                Err(error) => info!("{service_id} [{item}] unresolved : {error}"),
            }
        }
    }
    health_check.abort();
}
