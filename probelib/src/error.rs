use thiserror::Error;

/// Raised when a cache configuration violates one of the construction invariants. No engine is
/// ever built from a configuration which fails validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("block size must be between 4 and 512 bytes, got {0}")]
    BlockSize(u32),
    #[error("associativity must be a power of 2 between 1 and 16, got {0}")]
    Associativity(u32),
    #[error("set count must be a power of 2 between 1 and 256, got {0}")]
    SetCount(u32),
    #[error("replacement policy must be either 'LRU' or 'LFU', got '{0}'")]
    ReplacementPolicy(String),
    #[error("write-back caches must be write-allocate")]
    WriteBackWithoutAllocate,
    #[error("couldn't parse byte size literal '{0}'")]
    ByteSize(String),
}

/// Raised by the read and write oracles. All variants are fatal for the probing procedure which
/// triggered them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("read limit of {limit} batches exceeded")]
    ReadLimitExceeded { limit: u32 },
    #[error("write limit of {limit} batches exceeded")]
    WriteLimitExceeded { limit: u32 },
    #[error("cache not initialised")]
    Uninitialised,
}
