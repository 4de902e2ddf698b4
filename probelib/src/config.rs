use std::fmt::{Display, Formatter};
use std::str::FromStr;
use serde::{Deserialize, Serialize};
use crate::error::ConfigError;
use crate::simulator::AccessBudget;
use crate::util::parse_byte_size;

pub const MIN_BLOCK_SIZE: u32 = 4;
pub const MAX_BLOCK_SIZE: u32 = 512;
pub const MAX_ASSOCIATIVITY: u32 = 16;
pub const MAX_SET_COUNT: u32 = 256;

/// Batch limits used when the configuration file doesn't give any
pub const DEFAULT_BATCH_LIMIT: u32 = 1000;

/// The replacement policy - lru or lfu
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReplacementPolicyConfig {
    #[serde(rename = "LRU", alias = "lru")]
    LeastRecentlyUsed,
    #[serde(rename = "LFU", alias = "lfu")]
    LeastFrequentlyUsed,
}

impl FromStr for ReplacementPolicyConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LRU" | "lru" => Ok(Self::LeastRecentlyUsed),
            "LFU" | "lfu" => Ok(Self::LeastFrequentlyUsed),
            other => Err(ConfigError::ReplacementPolicy(other.to_string())),
        }
    }
}

impl Display for ReplacementPolicyConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LeastRecentlyUsed => write!(f, "LRU"),
            Self::LeastFrequentlyUsed => write!(f, "LFU"),
        }
    }
}

/// A validated configuration for a single cache
///
/// The only way to get one is through [`CacheConfig::new`], so holding a `CacheConfig` means every
/// invariant has already been checked
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct CacheConfig {
    block_size: u32,
    associativity: u32,
    set_count: u32,
    replacement_policy: ReplacementPolicyConfig,
    write_back: bool,
    write_allocate: bool,
}

impl CacheConfig {
    /// Validates and creates a cache configuration
    ///
    /// # Arguments
    ///
    /// * `block_size`: Bytes per line, between 4 and 512. Doesn't need to be a power of 2
    /// * `associativity`: Ways per set, a power of 2 between 1 and 16
    /// * `set_count`: Number of sets, a power of 2 between 1 and 256
    /// * `replacement_policy`: LRU or LFU
    /// * `write_back`: Whether write hits are deferred. Requires `write_allocate`
    /// * `write_allocate`: Whether write misses load the block into the cache
    ///
    /// returns: Result<CacheConfig, ConfigError>
    pub fn new(
        block_size: u32,
        associativity: u32,
        set_count: u32,
        replacement_policy: ReplacementPolicyConfig,
        write_back: bool,
        write_allocate: bool,
    ) -> Result<Self, ConfigError> {
        if !(MIN_BLOCK_SIZE..=MAX_BLOCK_SIZE).contains(&block_size) {
            return Err(ConfigError::BlockSize(block_size));
        }
        if !associativity.is_power_of_two() || associativity > MAX_ASSOCIATIVITY {
            return Err(ConfigError::Associativity(associativity));
        }
        if !set_count.is_power_of_two() || set_count > MAX_SET_COUNT {
            return Err(ConfigError::SetCount(set_count));
        }
        if write_back && !write_allocate {
            return Err(ConfigError::WriteBackWithoutAllocate);
        }
        Ok(Self {
            block_size,
            associativity,
            set_count,
            replacement_policy,
            write_back,
            write_allocate,
        })
    }

    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    pub fn associativity(&self) -> u32 {
        self.associativity
    }

    pub fn set_count(&self) -> u32 {
        self.set_count
    }

    pub fn replacement_policy(&self) -> ReplacementPolicyConfig {
        self.replacement_policy
    }

    pub fn write_back(&self) -> bool {
        self.write_back
    }

    pub fn write_allocate(&self) -> bool {
        self.write_allocate
    }

    /// Total number of lines across all sets
    pub fn line_count(&self) -> usize {
        (self.associativity * self.set_count) as usize
    }
}

/// A block size, either as a plain number of bytes or as a literal such as `"64B"` or `"1KiB"`
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ByteSizeConfig {
    Bytes(u32),
    Literal(String),
}

impl ByteSizeConfig {
    pub fn to_bytes(&self) -> Result<u32, ConfigError> {
        match self {
            ByteSizeConfig::Bytes(size) => Ok(*size),
            ByteSizeConfig::Literal(literal) => parse_byte_size(literal),
        }
    }
}

/// The JSON input format: the cache under test plus the oracle budgets
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    pub block_size: ByteSizeConfig,
    pub associativity: u32,
    pub set_count: u32,
    pub replacement_policy: String,
    pub write_back: bool,
    pub write_allocate: bool,
    #[serde(default = "default_batch_limit")]
    pub read_limit: u32,
    #[serde(default = "default_batch_limit")]
    pub write_limit: u32,
}

fn default_batch_limit() -> u32 {
    DEFAULT_BATCH_LIMIT
}

impl EngineConfig {
    /// Checks the configuration, producing the cache configuration and a fresh budget
    pub fn validate(&self) -> Result<(CacheConfig, AccessBudget), ConfigError> {
        let cache = CacheConfig::new(
            self.block_size.to_bytes()?,
            self.associativity,
            self.set_count,
            self.replacement_policy.parse()?,
            self.write_back,
            self.write_allocate,
        )?;
        Ok((cache, AccessBudget::new(self.read_limit, self.write_limit)))
    }
}
