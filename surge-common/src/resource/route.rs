use super::address::AddressModel;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Metadata key holding the externally visible route path of a service.
pub const ROUTE_PATH_KEY: &str = "routePath";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ServiceDescriptor {
    pub id: String,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl ServiceDescriptor {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn route_path(&self) -> Option<&str> {
        self.metadata.get(ROUTE_PATH_KEY).and_then(Value::as_str)
    }

    pub fn with_route_path(self, path: impl Into<String>) -> Self {
        let path: String = path.into();
        self.with_metadata(ROUTE_PATH_KEY, path)
    }

    /// Reads one metadata value as `T`, `None` when it is absent or has
    /// another shape.
    pub fn get_metadata<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.metadata
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}

/// A service id together with every endpoint currently registered for it.
/// Registries replace routes wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceRoute {
    pub service_descriptor: ServiceDescriptor,
    pub addresses: Vec<AddressModel>,
}

impl ServiceRoute {
    pub fn new(service_descriptor: ServiceDescriptor, addresses: Vec<AddressModel>) -> Self {
        Self {
            service_descriptor,
            addresses,
        }
    }

    pub fn service_id(&self) -> &str {
        &self.service_descriptor.id
    }
}

/// Serialized form of one address as kept by a registry backend.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AddressDescriptor {
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: String,
}

/// Serialized form of one [`ServiceRoute`].
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRouteDescriptor {
    pub service_descriptor: ServiceDescriptor,
    #[serde(default)]
    pub address_descriptors: Vec<AddressDescriptor>,
}
