use super::{AddressSelectContext, AddressSelector};
use rand::Rng;
use surge_common::resource::address::AddressModel;

#[derive(Default, Debug, Clone, Copy)]
pub struct RandomAddressSelector;

impl AddressSelector for RandomAddressSelector {
    fn select_address(&self, context: &AddressSelectContext<'_>) -> AddressModel {
        let index = rand::thread_rng().gen_range(0..context.addresses.len());
        context.addresses[index].clone()
    }
}
