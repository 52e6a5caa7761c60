use crate::{
    command::ShuntStrategy,
    error::SurgeError,
    handler::loadbalance::{
        AddressSelector, ConsistentHashAddressSelector, PollingAddressSelector,
        RandomAddressSelector,
    },
};
use std::{collections::HashMap, sync::Arc};

pub mod loadbalance;

/// Address selectors keyed by the strategy that picks them.
#[derive(Clone)]
pub struct SelectorContext {
    selectors: HashMap<ShuntStrategy, Arc<dyn AddressSelector>>,
}

impl Default for SelectorContext {
    fn default() -> Self {
        Self::new(100)
    }
}

impl SelectorContext {
    pub fn new(virtual_nodes: usize) -> Self {
        let mut context = Self {
            selectors: HashMap::new(),
        };
        context
            .insert(ShuntStrategy::Polling, Arc::new(PollingAddressSelector::default()))
            .insert(ShuntStrategy::Random, Arc::new(RandomAddressSelector))
            .insert(
                ShuntStrategy::ConsistentHash,
                Arc::new(ConsistentHashAddressSelector::new(virtual_nodes)),
            );
        context
    }

    /// Replaces the selector used for `strategy`.
    pub fn insert(
        &mut self,
        strategy: ShuntStrategy,
        selector: Arc<dyn AddressSelector>,
    ) -> &mut Self {
        self.selectors.insert(strategy, selector);
        self
    }

    pub fn get(&self, strategy: ShuntStrategy) -> Result<&Arc<dyn AddressSelector>, SurgeError> {
        self.selectors
            .get(&strategy)
            .ok_or(SurgeError::MissingSelector(strategy))
    }
}
