use crate::{
    error::CodecError,
    resource::address::{AddressModel, IpAddressModel, IP_ADDRESS_TYPE},
};
use std::collections::HashMap;

/// String based serializer used at the registry boundary.
pub trait AddressSerializer: Send + Sync {
    fn serialize(&self, address: &AddressModel) -> Result<String, CodecError>;

    fn deserialize(&self, content: &str, type_name: &str) -> Result<AddressModel, CodecError>;
}

pub type AddressFactory = fn(&str) -> Result<AddressModel, serde_json::Error>;

/// JSON serializer that resolves type names through a factory table filled
/// at startup.
pub struct JsonAddressSerializer {
    factories: HashMap<String, AddressFactory>,
}

impl Default for JsonAddressSerializer {
    fn default() -> Self {
        let mut serializer = Self {
            factories: HashMap::new(),
        };
        serializer.register(IP_ADDRESS_TYPE, |content| {
            serde_json::from_str::<IpAddressModel>(content).map(AddressModel::Ip)
        });
        serializer
    }
}

impl JsonAddressSerializer {
    pub fn register(&mut self, type_name: &str, factory: AddressFactory) -> &mut Self {
        self.factories.insert(type_name.to_owned(), factory);
        self
    }
}

impl AddressSerializer for JsonAddressSerializer {
    fn serialize(&self, address: &AddressModel) -> Result<String, CodecError> {
        match address {
            AddressModel::Ip(model) => Ok(serde_json::to_string(model)?),
        }
    }

    fn deserialize(&self, content: &str, type_name: &str) -> Result<AddressModel, CodecError> {
        let factory = self
            .factories
            .get(type_name)
            .ok_or_else(|| CodecError::UnknownType(type_name.to_owned()))?;
        factory(content).map_err(|source| CodecError::Mismatch {
            type_name: type_name.to_owned(),
            source,
        })
    }
}
