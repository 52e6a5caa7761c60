use super::{AddressSelectContext, AddressSelector};
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use surge_common::resource::address::AddressModel;

/// Round robin per service id. The index is taken modulo the candidate count
/// of the current call since the healthy set changes between calls.
#[derive(Default)]
pub struct PollingAddressSelector {
    counters: DashMap<String, AtomicUsize>,
}

impl AddressSelector for PollingAddressSelector {
    fn select_address(&self, context: &AddressSelectContext<'_>) -> AddressModel {
        let service_id = &context.descriptor.id;
        let ticket = match self.counters.get(service_id) {
            Some(counter) => counter.fetch_add(1, Ordering::Relaxed),
            None => self
                .counters
                .entry(service_id.clone())
                .or_default()
                .fetch_add(1, Ordering::Relaxed),
        };
        context.addresses[ticket % context.addresses.len()].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::loadbalance::tests::candidates;
    use std::{collections::HashMap, sync::Arc};
    use surge_common::resource::route::ServiceDescriptor;

    fn select(
        selector: &PollingAddressSelector,
        id: &str,
        addresses: &[AddressModel],
    ) -> AddressModel {
        let descriptor = ServiceDescriptor::new(id);
        selector
            .select(&AddressSelectContext {
                descriptor: &descriptor,
                addresses,
                item: None,
            })
            .unwrap()
    }

    #[test]
    fn each_candidate_gets_an_equal_share() {
        let selector = PollingAddressSelector::default();
        let addresses = candidates(4);
        let mut hits: HashMap<AddressModel, usize> = HashMap::new();
        for _ in 0..40 {
            *hits.entry(select(&selector, "Order.Get", &addresses)).or_default() += 1;
        }
        assert_eq!(hits.len(), 4);
        assert!(hits.values().all(|count| *count == 10));
    }

    #[test]
    fn counters_are_per_service_and_follow_current_size() {
        let selector = PollingAddressSelector::default();
        let three = candidates(3);
        assert_eq!(select(&selector, "Order.Get", &three), three[0]);
        assert_eq!(select(&selector, "Order.Get", &three), three[1]);
        assert_eq!(select(&selector, "User.Get", &three), three[0]);
        // set shrank to two, counter 2 maps onto the new size
        let two = candidates(2);
        assert_eq!(select(&selector, "Order.Get", &two), two[0]);
    }

    #[test]
    fn concurrent_callers_share_one_counter() {
        let selector = Arc::new(PollingAddressSelector::default());
        let addresses = Arc::new(candidates(5));
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let selector = selector.clone();
                let addresses = addresses.clone();
                std::thread::spawn(move || {
                    (0..250)
                        .map(|_| select(&selector, "Order.Get", &addresses))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        let mut hits: HashMap<AddressModel, usize> = HashMap::new();
        for worker in workers {
            for address in worker.join().unwrap() {
                *hits.entry(address).or_default() += 1;
            }
        }
        assert!(hits.values().all(|count| *count == 200));
    }
}
