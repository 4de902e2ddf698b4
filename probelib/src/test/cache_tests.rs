use crate::cache::{AddressParts, Cache, CacheLine, CacheTrait, GenericCache, HIT_LATENCY, MISS_LATENCY, WRITE_THROUGH_LATENCY};
use crate::config::{CacheConfig, ReplacementPolicyConfig};
use crate::replacement_policies::{LeastFrequentlyUsed, LeastRecentlyUsed, ReplacementPolicy};
use super::{lfu, lru, reference_config};

fn line_with_counter(counter: u32) -> CacheLine {
    CacheLine {
        valid: true,
        dirty: false,
        tag: 0,
        counter,
    }
}

fn write_through(write_allocate: bool) -> CacheConfig {
    CacheConfig::new(64, 4, 16, ReplacementPolicyConfig::LeastRecentlyUsed, false, write_allocate).unwrap()
}

#[test]
fn decompose_power_of_two_block() {
    let cache = GenericCache::new(reference_config());
    // 0x1234 is block 72: offset 52, set 72 % 16, tag 72 / 16
    assert_eq!(cache.decompose(0x1234), AddressParts { offset: 52, index: 8, tag: 4 });
}

#[test]
fn decompose_non_power_of_two_block() {
    let cache = GenericCache::new(lru(100, 2, 4));
    assert_eq!(cache.decompose(1234), AddressParts { offset: 34, index: 0, tag: 3 });
    assert_eq!(cache.decompose(99), AddressParts { offset: 99, index: 0, tag: 0 });
    assert_eq!(cache.decompose(100), AddressParts { offset: 0, index: 1, tag: 0 });
}

#[test]
fn same_block_hits() {
    let mut cache = GenericCache::new(reference_config());
    assert!(!cache.read_line(128));
    assert!(cache.read_line(129));
    assert!(cache.read_line(191));
    assert!(!cache.read_line(192));
}

#[test]
fn lru_evicts_least_recently_used() {
    let mut cache = Cache::new(lru(4, 2, 1), LeastRecentlyUsed);
    assert!(!cache.read_line(0));
    assert!(!cache.read_line(4));
    assert!(cache.read_line(0));
    // 4 is now the least recently used
    assert!(!cache.read_line(8));
    assert!(cache.read_line(0));
    assert!(!cache.read_line(4));
}

#[test]
fn lru_counters_age_other_ways() {
    let mut cache = Cache::new(lru(4, 4, 1), LeastRecentlyUsed);
    cache.read_line(0);
    cache.read_line(4);
    cache.read_line(8);
    let counters: Vec<u32> = (0..4).map(|way| cache.line(0, way).unwrap().counter).collect();
    assert_eq!(counters, vec![2, 1, 0, 3]);
}

#[test]
fn lfu_evicts_least_frequently_used() {
    let mut cache = Cache::new(lfu(4, 2, 1), LeastFrequentlyUsed);
    assert!(!cache.read_line(0));
    assert!(cache.read_line(0));
    assert!(cache.read_line(0));
    assert!(!cache.read_line(4));
    // 4 has been used once, 0 three times
    assert!(!cache.read_line(8));
    assert!(cache.read_line(0));
    assert!(!cache.read_line(4));
}

#[test]
fn lfu_counts_fills_and_hits() {
    let mut cache = Cache::new(lfu(4, 2, 1), LeastFrequentlyUsed);
    cache.read_line(0);
    cache.read_line(1);
    cache.read_line(4);
    assert_eq!(cache.line(0, 0).unwrap().counter, 2);
    assert_eq!(cache.line(0, 1).unwrap().counter, 1);
}

#[test]
fn lfu_tie_evicts_highest_way() {
    let mut cache = Cache::new(lfu(4, 2, 1), LeastFrequentlyUsed);
    cache.read_line(0);
    cache.read_line(4);
    // Both used once, so way 1 goes
    cache.read_line(8);
    assert_eq!(cache.line(0, 0).unwrap().tag, 0);
    assert_eq!(cache.line(0, 1).unwrap().tag, 2);
}

#[test]
fn victim_ties_go_to_highest_way() {
    let set = [line_with_counter(3), line_with_counter(3), line_with_counter(1)];
    assert_eq!(LeastRecentlyUsed.get_victim(&set), 1);
    let set = [line_with_counter(2), line_with_counter(1), line_with_counter(1)];
    assert_eq!(LeastFrequentlyUsed.get_victim(&set), 2);
    let set = [line_with_counter(5)];
    assert_eq!(LeastRecentlyUsed.get_victim(&set), 0);
    assert_eq!(LeastFrequentlyUsed.get_victim(&set), 0);
}

#[test]
fn write_back_latencies() {
    let mut cache = GenericCache::new(reference_config());
    assert_eq!(cache.write_line(0), MISS_LATENCY);
    assert_eq!(cache.write_line(4), HIT_LATENCY);
    assert!(cache.line(0, 0).unwrap().dirty);
}

#[test]
fn write_through_latencies() {
    let mut cache = GenericCache::new(write_through(true));
    assert_eq!(cache.write_line(0), MISS_LATENCY);
    assert_eq!(cache.write_line(4), WRITE_THROUGH_LATENCY);
    assert!(!cache.line(0, 0).unwrap().dirty);
}

#[test]
fn write_no_allocate_never_touches_lines() {
    let mut cache = GenericCache::new(write_through(false));
    for address in [0, 0, 64, 0] {
        assert_eq!(cache.write_line(address), WRITE_THROUGH_LATENCY);
    }
    assert_eq!(cache.get_valid_line_count(), 0);
    // Reads still allocate
    assert!(!cache.read_line(0));
    assert!(cache.read_line(0));
}

#[test]
fn eviction_clears_dirty_line() {
    let mut cache = Cache::new(lru(4, 1, 1), LeastRecentlyUsed);
    cache.write_line(0);
    assert!(cache.line(0, 0).unwrap().dirty);
    assert!(!cache.read_line(4));
    let line = cache.line(0, 0).unwrap();
    assert!(line.valid);
    assert!(!line.dirty);
    assert_eq!(line.tag, 1);
}

#[test]
fn reset_clears_every_line() {
    let mut cache = GenericCache::new(reference_config());
    for address in (0..4096).step_by(16) {
        cache.write_line(address);
    }
    assert_eq!(cache.get_valid_line_count(), 64);
    cache.reset();
    assert_eq!(cache.get_valid_line_count(), 0);
    for set in 0..16 {
        for way in 0..4 {
            assert_eq!(*cache.line(set, way).unwrap(), CacheLine::default());
        }
    }
    assert_eq!(*cache.config(), reference_config());
}

#[test]
fn line_access_is_bounds_checked() {
    let cache = GenericCache::new(reference_config());
    assert!(cache.line(15, 3).is_some());
    assert!(cache.line(16, 0).is_none());
    assert!(cache.line(0, 4).is_none());
}
