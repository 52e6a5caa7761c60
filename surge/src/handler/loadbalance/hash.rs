use super::{AddressSelectContext, AddressSelector};
use dashmap::DashMap;
use std::sync::Arc;
use surge_common::resource::address::AddressModel;

pub const DEFAULT_SEED: u32 = 0xc58f1a7b;
const M: u32 = 0x5bd1e995;
const R: u32 = 24;

/// MurmurHash2, 32 bit. Changing anything here moves keys between endpoints.
pub fn murmur_hash2(data: &[u8], seed: u32) -> u32 {
    if data.is_empty() {
        return 0;
    }
    let mut h = seed ^ data.len() as u32;
    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);
        h = h.wrapping_mul(M);
        h ^= k;
    }
    match *chunks.remainder() {
        [a, b, c] => {
            h ^= u32::from(a) | u32::from(b) << 8;
            h ^= u32::from(c) << 16;
            h = h.wrapping_mul(M);
        }
        [a, b] => {
            h ^= u32::from(a) | u32::from(b) << 8;
            h = h.wrapping_mul(M);
        }
        [a] => {
            h ^= u32::from(a);
            h = h.wrapping_mul(M);
        }
        _ => {}
    }
    h ^= h >> 13;
    h = h.wrapping_mul(M);
    h ^= h >> 15;
    h
}

/// Hash of a routing key: its ASCII bytes, every non-ASCII character
/// replaced by `?`, under [`DEFAULT_SEED`].
pub fn hash_key(key: &str) -> u32 {
    let bytes: Vec<u8> = key
        .chars()
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect();
    murmur_hash2(&bytes, DEFAULT_SEED)
}

/// Ring of virtual nodes. A key belongs to the first virtual node whose hash
/// is not below the key hash, wrapping around to the start.
#[derive(Debug)]
pub struct HashRing {
    nodes: Vec<AddressModel>,
    ring: Vec<(u32, usize)>,
}

impl HashRing {
    pub fn new(nodes: &[AddressModel], virtual_nodes: usize) -> Self {
        let virtual_nodes = virtual_nodes.max(1);
        let mut ring = Vec::with_capacity(nodes.len() * virtual_nodes);
        for (index, node) in nodes.iter().enumerate() {
            for n in 0..virtual_nodes {
                ring.push((hash_key(&format!("{node}{n}")), index));
            }
        }
        ring.sort_unstable();
        Self {
            nodes: nodes.to_vec(),
            ring,
        }
    }

    pub fn get(&self, key: &str) -> Option<&AddressModel> {
        let hash = hash_key(key);
        let position = self.ring.partition_point(|(point, _)| *point < hash);
        self.ring
            .get(position)
            .or_else(|| self.ring.first())
            .map(|(_, index)| &self.nodes[*index])
    }

    fn is_built_for(&self, nodes: &[AddressModel]) -> bool {
        self.nodes == nodes
    }
}

/// Keeps one ring per service id and rebuilds it whenever the candidate set
/// differs from the one it was built for.
pub struct ConsistentHashAddressSelector {
    virtual_nodes: usize,
    rings: DashMap<String, Arc<HashRing>>,
}

impl Default for ConsistentHashAddressSelector {
    fn default() -> Self {
        Self::new(100)
    }
}

impl ConsistentHashAddressSelector {
    pub fn new(virtual_nodes: usize) -> Self {
        Self {
            virtual_nodes,
            rings: DashMap::new(),
        }
    }

    fn ring(&self, context: &AddressSelectContext<'_>) -> Arc<HashRing> {
        let service_id = &context.descriptor.id;
        if let Some(ring) = self.rings.get(service_id) {
            if ring.is_built_for(context.addresses) {
                return ring.value().clone();
            }
        }
        let ring = Arc::new(HashRing::new(context.addresses, self.virtual_nodes));
        self.rings.insert(service_id.clone(), ring.clone());
        ring
    }
}

impl AddressSelector for ConsistentHashAddressSelector {
    fn select_address(&self, context: &AddressSelectContext<'_>) -> AddressModel {
        let ring = self.ring(context);
        ring.get(context.item.unwrap_or_default())
            .cloned()
            .unwrap_or_else(|| context.addresses[0].clone())
    }
}
