use crate::config::{CacheConfig, EngineConfig, ReplacementPolicyConfig, DEFAULT_BATCH_LIMIT};
use crate::error::ConfigError;
use crate::simulator::Simulator;
use crate::util::{bytes, kib, mib, parse_byte_size};

const LRU: ReplacementPolicyConfig = ReplacementPolicyConfig::LeastRecentlyUsed;

#[test]
fn block_size_bounds() {
    assert_eq!(CacheConfig::new(3, 1, 1, LRU, false, false), Err(ConfigError::BlockSize(3)));
    assert_eq!(CacheConfig::new(513, 1, 1, LRU, false, false), Err(ConfigError::BlockSize(513)));
    assert!(CacheConfig::new(4, 1, 1, LRU, false, false).is_ok());
    assert!(CacheConfig::new(100, 1, 1, LRU, false, false).is_ok());
    assert!(CacheConfig::new(512, 1, 1, LRU, false, false).is_ok());
}

#[test]
fn associativity_must_be_small_power_of_two() {
    for associativity in [0, 3, 6, 32] {
        assert_eq!(
            CacheConfig::new(64, associativity, 1, LRU, false, false),
            Err(ConfigError::Associativity(associativity))
        );
    }
    for associativity in [1, 2, 4, 8, 16] {
        assert!(CacheConfig::new(64, associativity, 1, LRU, false, false).is_ok());
    }
}

#[test]
fn set_count_must_be_small_power_of_two() {
    for set_count in [0, 3, 100, 512] {
        assert_eq!(CacheConfig::new(64, 1, set_count, LRU, false, false), Err(ConfigError::SetCount(set_count)));
    }
    assert!(CacheConfig::new(64, 1, 1, LRU, false, false).is_ok());
    assert!(CacheConfig::new(64, 1, 256, LRU, false, false).is_ok());
}

#[test]
fn write_back_requires_write_allocate() {
    assert_eq!(CacheConfig::new(64, 4, 16, LRU, true, false), Err(ConfigError::WriteBackWithoutAllocate));
    assert!(CacheConfig::new(64, 4, 16, LRU, true, true).is_ok());
    assert!(CacheConfig::new(64, 4, 16, LRU, false, true).is_ok());
    assert!(CacheConfig::new(64, 4, 16, LRU, false, false).is_ok());
}

#[test]
fn replacement_policy_names() {
    assert_eq!("LRU".parse::<ReplacementPolicyConfig>(), Ok(ReplacementPolicyConfig::LeastRecentlyUsed));
    assert_eq!("lfu".parse::<ReplacementPolicyConfig>(), Ok(ReplacementPolicyConfig::LeastFrequentlyUsed));
    assert_eq!(
        "FIFO".parse::<ReplacementPolicyConfig>(),
        Err(ConfigError::ReplacementPolicy("FIFO".to_string()))
    );
    assert_eq!(ReplacementPolicyConfig::LeastFrequentlyUsed.to_string(), "LFU");
}

#[test]
fn engine_config_from_json() {
    let config: EngineConfig = serde_json::from_str(
        r#"{
            "block_size": "64_Bytes",
            "associativity": 4,
            "set_count": 16,
            "replacement_policy": "LRU",
            "write_back": true,
            "write_allocate": true
        }"#,
    )
    .unwrap();
    let (cache, budget) = config.validate().unwrap();
    assert_eq!(cache.block_size(), 64);
    assert_eq!(cache.replacement_policy(), LRU);
    assert_eq!(budget.reads_remaining(), DEFAULT_BATCH_LIMIT);
    assert_eq!(budget.writes_remaining(), DEFAULT_BATCH_LIMIT);
}

#[test]
fn engine_config_rejects_invalid_cache() {
    let config: EngineConfig = serde_json::from_str(
        r#"{
            "block_size": 64,
            "associativity": 4,
            "set_count": 16,
            "replacement_policy": "LRU",
            "write_back": true,
            "write_allocate": false,
            "read_limit": 10,
            "write_limit": 10
        }"#,
    )
    .unwrap();
    assert_eq!(Simulator::from_config(&config).unwrap_err(), ConfigError::WriteBackWithoutAllocate);

    let config: EngineConfig = serde_json::from_str(
        r#"{
            "block_size": 64,
            "associativity": 4,
            "set_count": 16,
            "replacement_policy": "MRU",
            "write_back": false,
            "write_allocate": false
        }"#,
    )
    .unwrap();
    assert_eq!(config.validate().unwrap_err(), ConfigError::ReplacementPolicy("MRU".to_string()));
}

#[test]
fn byte_size_literals() {
    assert_eq!(parse_byte_size("64").unwrap(), 64);
    assert_eq!(parse_byte_size("64B").unwrap(), 64);
    assert_eq!(parse_byte_size("64_Bytes").unwrap(), 64);
    assert_eq!(parse_byte_size(" 4KiB ").unwrap(), 4096);
    assert_eq!(parse_byte_size("1_MiB").unwrap(), 1 << 20);
    assert_eq!(parse_byte_size("5000MiB"), Err(ConfigError::ByteSize("5000MiB".to_string())));
    assert_eq!(parse_byte_size("KiB"), Err(ConfigError::ByteSize("KiB".to_string())));
    assert_eq!(parse_byte_size("4 kb"), Err(ConfigError::ByteSize("4 kb".to_string())));
}

#[test]
fn byte_size_helpers() {
    assert_eq!(bytes(64), 64);
    assert_eq!(kib(2), 2048);
    assert_eq!(mib(1), 1_048_576);
}
