use crate::error::SurgeError;
use surge_common::resource::{address::AddressModel, route::ServiceDescriptor};

pub mod hash;
pub mod polling;
pub mod random;

pub use hash::ConsistentHashAddressSelector;
pub use polling::PollingAddressSelector;
pub use random::RandomAddressSelector;

/// Input of one selection. `addresses` is already filtered to healthy
/// endpoints by the caller.
#[derive(Debug, Clone, Copy)]
pub struct AddressSelectContext<'a> {
    pub descriptor: &'a ServiceDescriptor,
    pub addresses: &'a [AddressModel],
    pub item: Option<&'a str>,
}

pub trait AddressSelector: Send + Sync {
    /// Rejects an empty candidate list and returns a lone candidate directly,
    /// everything else goes to [`AddressSelector::select_address`].
    fn select(&self, context: &AddressSelectContext<'_>) -> Result<AddressModel, SurgeError> {
        match context.addresses {
            [] => Err(SurgeError::EmptyCandidates(context.descriptor.id.clone())),
            [address] => Ok(address.clone()),
            _ => Ok(self.select_address(context)),
        }
    }

    /// Called with at least two candidates.
    fn select_address(&self, context: &AddressSelectContext<'_>) -> AddressModel;
}
