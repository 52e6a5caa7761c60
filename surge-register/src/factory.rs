use dashmap::DashMap;
use std::sync::Arc;
use surge_common::{
    codec::{AddressSerializer, JsonAddressSerializer},
    error::CodecError,
    resource::{
        address::AddressModel,
        route::{AddressDescriptor, ServiceRoute, ServiceRouteDescriptor},
    },
};
use tracing::warn;

/// Converts between the serialized route form kept by registries and
/// [`ServiceRoute`]. Decoded addresses are cached by type name and payload.
pub struct ServiceRouteFactory {
    serializer: Arc<dyn AddressSerializer>,
    addresses: DashMap<(String, String), AddressModel>,
}

impl Default for ServiceRouteFactory {
    fn default() -> Self {
        Self::new(Arc::new(JsonAddressSerializer::default()))
    }
}

impl ServiceRouteFactory {
    pub fn new(serializer: Arc<dyn AddressSerializer>) -> Self {
        Self {
            serializer,
            addresses: DashMap::new(),
        }
    }

    /// Addresses that fail to decode are logged and left out of their route.
    pub fn create_service_routes(
        &self,
        descriptors: &[ServiceRouteDescriptor],
    ) -> Vec<ServiceRoute> {
        descriptors
            .iter()
            .map(|descriptor| {
                let addresses = descriptor
                    .address_descriptors
                    .iter()
                    .filter_map(|address| match self.create_address(address) {
                        Ok(address) => Some(address),
                        Err(error) => {
                            warn!(
                                "skip address of service {} : {}",
                                descriptor.service_descriptor.id, error
                            );
                            None
                        }
                    })
                    .collect();
                ServiceRoute::new(descriptor.service_descriptor.clone(), addresses)
            })
            .collect()
    }

    pub fn create_descriptor(
        &self,
        route: &ServiceRoute,
    ) -> Result<ServiceRouteDescriptor, CodecError> {
        let address_descriptors = route
            .addresses
            .iter()
            .map(|address| {
                Ok(AddressDescriptor {
                    type_name: address.type_name().to_owned(),
                    value: self.serializer.serialize(address)?,
                })
            })
            .collect::<Result<Vec<_>, CodecError>>()?;
        Ok(ServiceRouteDescriptor {
            service_descriptor: route.service_descriptor.clone(),
            address_descriptors,
        })
    }

    fn create_address(&self, descriptor: &AddressDescriptor) -> Result<AddressModel, CodecError> {
        let key = (descriptor.type_name.clone(), descriptor.value.clone());
        if let Some(address) = self.addresses.get(&key) {
            return Ok(address.value().clone());
        }
        let address = self
            .serializer
            .deserialize(&descriptor.value, &descriptor.type_name)?;
        self.addresses.insert(key, address.clone());
        Ok(address)
    }

    pub fn cached_address_count(&self) -> usize {
        self.addresses.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use surge_common::resource::{address::IP_ADDRESS_TYPE, route::ServiceDescriptor};

    fn ip_descriptor(value: &str) -> AddressDescriptor {
        AddressDescriptor {
            type_name: IP_ADDRESS_TYPE.to_owned(),
            value: value.to_owned(),
        }
    }

    #[test]
    fn malformed_address_is_skipped() {
        let factory = ServiceRouteFactory::default();
        let descriptor = ServiceRouteDescriptor {
            service_descriptor: ServiceDescriptor::new("Order.Get"),
            address_descriptors: vec![
                ip_descriptor(r#"{"ip":"10.0.0.1","port":81}"#),
                ip_descriptor(r#"{"ip":"10.0.0.2"}"#),
                AddressDescriptor {
                    type_name: "UnixAddressModel".to_owned(),
                    value: "/tmp/order.sock".to_owned(),
                },
            ],
        };
        let routes = factory.create_service_routes(&[descriptor]);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].addresses, vec![AddressModel::ip("10.0.0.1", 81)]);
    }

    #[test]
    fn decoded_addresses_are_reused() {
        let factory = ServiceRouteFactory::default();
        let shared = r#"{"ip":"10.0.0.1","port":81}"#;
        let descriptors: Vec<ServiceRouteDescriptor> = ["Order.Get", "Order.List"]
            .iter()
            .map(|id| ServiceRouteDescriptor {
                service_descriptor: ServiceDescriptor::new(*id),
                address_descriptors: vec![ip_descriptor(shared)],
            })
            .collect();
        let routes = factory.create_service_routes(&descriptors);
        assert_eq!(routes[0].addresses, routes[1].addresses);
        assert_eq!(factory.cached_address_count(), 1);
    }

    #[test]
    fn cached_payload_is_not_reused_across_types() {
        let factory = ServiceRouteFactory::default();
        let payload = r#"{"ip":"10.0.0.1","port":81}"#;
        let descriptor = ServiceRouteDescriptor {
            service_descriptor: ServiceDescriptor::new("Order.Get"),
            address_descriptors: vec![
                ip_descriptor(payload),
                AddressDescriptor {
                    type_name: "UnixAddressModel".to_owned(),
                    value: payload.to_owned(),
                },
            ],
        };
        let routes = factory.create_service_routes(&[descriptor]);
        assert_eq!(routes[0].addresses, vec![AddressModel::ip("10.0.0.1", 81)]);
        assert_eq!(factory.cached_address_count(), 1);
    }

    #[test]
    fn descriptor_round_trip_keeps_addresses() {
        let factory = ServiceRouteFactory::default();
        let route = ServiceRoute::new(
            ServiceDescriptor::new("Order.Get").with_route_path("api/order/get"),
            vec![AddressModel::ip("10.0.0.1", 81), AddressModel::ip("10.0.0.2", 81)],
        );
        let descriptor = factory.create_descriptor(&route).unwrap();
        assert_eq!(descriptor.address_descriptors[0].type_name, IP_ADDRESS_TYPE);
        assert_eq!(factory.create_service_routes(&[descriptor]), vec![route]);
    }
}
