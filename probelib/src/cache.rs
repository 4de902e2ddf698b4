use tracing::trace;
use crate::config::{CacheConfig, ReplacementPolicyConfig};
use crate::replacement_policies::{LeastFrequentlyUsed, LeastRecentlyUsed, ReplacementPolicy};

/// Latency of a write hit in a write-back cache
pub const HIT_LATENCY: u32 = 1;
/// Latency of any access which has to go to memory
pub const MISS_LATENCY: u32 = 100;
/// Latency of a write hit in a write-through cache, and of every write in a no-allocate cache
pub const WRITE_THROUGH_LATENCY: u32 = 20;

/// The state of a single way
///
/// Lines are allocated once when the cache is built and are only ever cleared, never reallocated
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct CacheLine {
    pub valid: bool,
    pub dirty: bool,
    pub tag: u32,
    /// Recency for LRU, frequency for LFU
    pub counter: u32,
}

/// An address split into its offset within a block, set index, and tag
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AddressParts {
    pub offset: u32,
    pub index: u32,
    pub tag: u32,
}

/// A generic trait for caches
///
/// Technically not required as we're using static dispatch instead of dyn Cache, but it keeps the
/// engine independent of the replacement policy with no overhead
pub trait CacheTrait {
    /// Splits an address into offset, set index and tag.
    ///
    /// Block sizes need not be powers of 2, so this divides rather than masking
    ///
    /// # Arguments
    ///
    /// * `address`:
    ///
    /// returns: AddressParts
    fn decompose(&self, address: u32) -> AddressParts;

    /// Reads the line containing an address, returning true on a cache hit, and false otherwise
    ///
    /// On both hits and misses the replacement metadata is updated, and misses install the block
    fn read_line(&mut self, address: u32) -> bool;

    /// Writes to the line containing an address, returning the latency of the write
    fn write_line(&mut self, address: u32) -> u32;

    /// Clears every line, leaving the configuration untouched
    fn reset(&mut self);

    /// Gets the configuration this cache was built with
    fn config(&self) -> &CacheConfig;

    /// Gets the number of valid lines. Useful for debugging
    fn get_valid_line_count(&self) -> usize;
}

/// A generic cache implementation, parameterised by a replacement policy
///
/// Lines live in one contiguous arena, set `s` occupying `s * associativity..(s + 1) *
/// associativity`, so a set is always a slice and no line is shared between sets
#[derive(Debug)]
pub struct Cache<R: ReplacementPolicy> {
    config: CacheConfig,
    lines: Vec<CacheLine>,
    ways: usize,
    replacement_policy: R,
}

impl<R: ReplacementPolicy> Cache<R> {
    pub fn new(config: CacheConfig, policy: R) -> Self {
        Self {
            ways: config.associativity() as usize,
            lines: vec![CacheLine::default(); config.line_count()],
            config,
            replacement_policy: policy,
        }
    }

    /// Bounds-checked access to a single line
    pub fn line(&self, set: usize, way: usize) -> Option<&CacheLine> {
        if way >= self.ways {
            return None;
        }
        self.lines.get(set * self.ways + way)
    }

    /// Looks an address up, filling it on a miss. Returns whether it hit, and the arena index of
    /// the line now holding the block
    fn access(&mut self, address: u32) -> (bool, usize) {
        let AddressParts { index, tag, .. } = self.decompose(address);
        let write_back = self.config.write_back();
        let start = index as usize * self.ways;
        let policy = &self.replacement_policy;
        let set = &mut self.lines[start..start + self.ways];

        if let Some(way) = set.iter().position(|line| line.valid && line.tag == tag) {
            policy.update_on_access(set, way);
            return (true, start + way);
        }

        let way = match set.iter().position(|line| !line.valid) {
            Some(way) => way,
            None => {
                let victim = policy.get_victim(set);
                evict(&mut set[victim], write_back);
                victim
            }
        };
        set[way].valid = true;
        set[way].tag = tag;
        policy.update_on_access(set, way);
        (false, start + way)
    }
}

fn evict(line: &mut CacheLine, write_back: bool) {
    if write_back && line.dirty {
        // The write back to memory is free as far as the oracles are concerned
        trace!(tag = line.tag, "writing back dirty line");
    }
    *line = CacheLine::default();
}

impl<R: ReplacementPolicy> CacheTrait for Cache<R> {
    fn decompose(&self, address: u32) -> AddressParts {
        let block = address / self.config.block_size();
        AddressParts {
            offset: address % self.config.block_size(),
            index: block % self.config.set_count(),
            tag: block / self.config.set_count(),
        }
    }

    // Cache hit is true, cache miss is false
    fn read_line(&mut self, address: u32) -> bool {
        self.access(address).0
    }

    fn write_line(&mut self, address: u32) -> u32 {
        // No-allocate writes go straight to memory without touching the array
        if !self.config.write_allocate() {
            return WRITE_THROUGH_LATENCY;
        }
        let (hit, line) = self.access(address);
        let write_back = self.config.write_back();
        if write_back {
            self.lines[line].dirty = true;
        }
        match (hit, write_back) {
            (true, true) => HIT_LATENCY,
            (true, false) => WRITE_THROUGH_LATENCY,
            (false, _) => MISS_LATENCY,
        }
    }

    fn reset(&mut self) {
        self.lines.fill(CacheLine::default());
    }

    fn config(&self) -> &CacheConfig {
        &self.config
    }

    fn get_valid_line_count(&self) -> usize {
        self.lines.iter().filter(|line| line.valid).count()
    }
}

/// Enum for both cache types provided by the library
///
/// It's much faster to explicitly branch on all implementations than to use a trait object, as the
/// compiler can reason about the concrete types and inline the replacement policy
#[derive(Debug)]
pub enum GenericCache {
    LeastRecentlyUsed(Cache<LeastRecentlyUsed>),
    LeastFrequentlyUsed(Cache<LeastFrequentlyUsed>),
}

impl GenericCache {
    /// Creates a new cache using the replacement policy named by the configuration
    pub fn new(config: CacheConfig) -> Self {
        match config.replacement_policy() {
            ReplacementPolicyConfig::LeastRecentlyUsed => {
                GenericCache::from(Cache::new(config, LeastRecentlyUsed))
            }
            ReplacementPolicyConfig::LeastFrequentlyUsed => {
                GenericCache::from(Cache::new(config, LeastFrequentlyUsed))
            }
        }
    }

    /// Bounds-checked access to a single line
    pub fn line(&self, set: usize, way: usize) -> Option<&CacheLine> {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.line(set, way),
            GenericCache::LeastFrequentlyUsed(c) => c.line(set, way),
        }
    }
}

impl From<Cache<LeastRecentlyUsed>> for GenericCache {
    fn from(value: Cache<LeastRecentlyUsed>) -> Self {
        Self::LeastRecentlyUsed(value)
    }
}

impl From<Cache<LeastFrequentlyUsed>> for GenericCache {
    fn from(value: Cache<LeastFrequentlyUsed>) -> Self {
        Self::LeastFrequentlyUsed(value)
    }
}

impl CacheTrait for GenericCache {
    fn decompose(&self, address: u32) -> AddressParts {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.decompose(address),
            GenericCache::LeastFrequentlyUsed(c) => c.decompose(address),
        }
    }

    fn read_line(&mut self, address: u32) -> bool {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.read_line(address),
            GenericCache::LeastFrequentlyUsed(c) => c.read_line(address),
        }
    }

    fn write_line(&mut self, address: u32) -> u32 {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.write_line(address),
            GenericCache::LeastFrequentlyUsed(c) => c.write_line(address),
        }
    }

    fn reset(&mut self) {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.reset(),
            GenericCache::LeastFrequentlyUsed(c) => c.reset(),
        }
    }

    fn config(&self) -> &CacheConfig {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.config(),
            GenericCache::LeastFrequentlyUsed(c) => c.config(),
        }
    }

    fn get_valid_line_count(&self) -> usize {
        match self {
            GenericCache::LeastRecentlyUsed(c) => c.get_valid_line_count(),
            GenericCache::LeastFrequentlyUsed(c) => c.get_valid_line_count(),
        }
    }
}
