use crate::config::{CacheConfig, ReplacementPolicyConfig};
use crate::simulator::{AccessBudget, Simulator};

mod cache_tests;
mod config_tests;

/// The cache used by the reference entry point: 64 byte blocks, 4 ways, 16 sets, LRU, write-back
pub(crate) fn reference_config() -> CacheConfig {
    CacheConfig::new(64, 4, 16, ReplacementPolicyConfig::LeastRecentlyUsed, true, true).unwrap()
}

pub(crate) fn lru(block_size: u32, associativity: u32, set_count: u32) -> CacheConfig {
    CacheConfig::new(block_size, associativity, set_count, ReplacementPolicyConfig::LeastRecentlyUsed, true, true).unwrap()
}

pub(crate) fn lfu(block_size: u32, associativity: u32, set_count: u32) -> CacheConfig {
    CacheConfig::new(block_size, associativity, set_count, ReplacementPolicyConfig::LeastFrequentlyUsed, true, true).unwrap()
}

/// A simulator with the reference entry point's budget of 1000 batches each way
pub(crate) fn simulator(config: CacheConfig) -> Simulator {
    Simulator::new(config, AccessBudget::new(1000, 1000))
}
