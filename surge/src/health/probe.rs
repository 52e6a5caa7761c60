use std::time::Duration;
use surge_common::{resource::address::AddressModel, BoxFuture};
use tokio::net::TcpStream;
use tracing::debug;

/// Out of band reachability check of one endpoint.
pub trait HealthProbe: Send + Sync {
    fn probe(&self, address: &AddressModel, timeout: Duration) -> BoxFuture<bool>;
}

/// Bare TCP connect, no bytes are exchanged. Only proves L4 reachability.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpProbe;

impl HealthProbe for TcpProbe {
    fn probe(&self, address: &AddressModel, timeout: Duration) -> BoxFuture<bool> {
        let target = address.socket_addr_string();
        Box::pin(async move {
            match tokio::time::timeout(timeout, TcpStream::connect(&target)).await {
                Ok(Ok(_)) => true,
                Ok(Err(error)) => {
                    debug!("probe {target} failed : {error}");
                    false
                }
                Err(_) => {
                    debug!("probe {target} timeout after {timeout:?}");
                    false
                }
            }
        })
    }
}
