use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Discriminant stored next to a serialized [`IpAddressModel`].
pub const IP_ADDRESS_TYPE: &str = "IpAddressModel";

/// A concrete network location of one service instance.
///
/// Values are immutable; equality and hashing follow the endpoint identity,
/// so two addresses decoded from different payloads compare equal when they
/// point at the same `ip:port`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AddressModel {
    Ip(IpAddressModel),
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct IpAddressModel {
    pub ip: String,
    pub port: u16,
}

impl IpAddressModel {
    pub fn new(ip: impl Into<String>, port: u16) -> Self {
        Self { ip: ip.into(), port }
    }
}

impl AddressModel {
    pub fn ip(ip: impl Into<String>, port: u16) -> Self {
        AddressModel::Ip(IpAddressModel::new(ip, port))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            AddressModel::Ip(_) => IP_ADDRESS_TYPE,
        }
    }

    /// Target handed to a TCP connect.
    pub fn socket_addr_string(&self) -> String {
        match self {
            AddressModel::Ip(model) => format!("{}:{}", model.ip, model.port),
        }
    }
}

impl From<IpAddressModel> for AddressModel {
    fn from(model: IpAddressModel) -> Self {
        AddressModel::Ip(model)
    }
}

impl Display for AddressModel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AddressModel::Ip(model) => write!(f, "{}:{}", model.ip, model.port),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn identity_is_ip_and_port() {
        let a = AddressModel::ip("10.0.0.1", 81);
        let b = AddressModel::from(IpAddressModel::new("10.0.0.1".to_owned(), 81));
        let c = AddressModel::ip("10.0.0.1", 82);
        assert_eq!(a, b);
        assert_ne!(a, c);
        let set: HashSet<AddressModel> = [a.clone(), b, c].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_eq!(a.to_string(), "10.0.0.1:81");
        assert_eq!(a.socket_addr_string(), "10.0.0.1:81");
        assert_eq!(a.type_name(), IP_ADDRESS_TYPE);
    }
}
