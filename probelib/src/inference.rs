use std::cmp::Ordering;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use crate::cache::WRITE_THROUGH_LATENCY;
use crate::config::{CacheConfig, ReplacementPolicyConfig, MAX_BLOCK_SIZE, MIN_BLOCK_SIZE};
use crate::error::OracleError;
use crate::simulator::{Oracle, BATCH_SIZE};

/// Stride visiting 4 distinct blocks, all in set 0, repeating every 4 accesses
const ASSOCIATIVITY_STRIDE_4_BLOCKS: u32 = 1 << 30;
/// Stride visiting 2 distinct blocks, all in set 0
const ASSOCIATIVITY_STRIDE_2_BLOCKS: u32 = 1 << 31;
/// Stride visiting 16 distinct blocks, all in set 0
const ASSOCIATIVITY_STRIDE_16_BLOCKS: u32 = 1 << 28;
/// Stride cycling through 32 blocks, more than any set holds
const REPLACEMENT_POLICY_STRIDE: u32 = 1 << 27;

/// The write policies a cache can have. Write-back without write-allocate is not a legal cache, so
/// it has no variant
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WritePolicy {
    WriteBackAllocate,
    WriteThroughAllocate,
    WriteThroughNoAllocate,
}

impl WritePolicy {
    /// Converts a pair of flags into a policy, or None for write-back without write-allocate
    pub fn from_flags(write_back: bool, write_allocate: bool) -> Option<Self> {
        match (write_back, write_allocate) {
            (true, true) => Some(Self::WriteBackAllocate),
            (false, true) => Some(Self::WriteThroughAllocate),
            (false, false) => Some(Self::WriteThroughNoAllocate),
            (true, false) => None,
        }
    }

    pub fn write_back(&self) -> bool {
        matches!(self, Self::WriteBackAllocate)
    }

    pub fn write_allocate(&self) -> bool {
        !matches!(self, Self::WriteThroughNoAllocate)
    }
}

/// What the caller knows about the cache. `None` means the field is unknown and should be inferred
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct InferredParameters {
    pub block_size: Option<u32>,
    pub associativity: Option<u32>,
    pub set_count: Option<u32>,
    pub replacement_policy: Option<ReplacementPolicyConfig>,
    pub write_policy: Option<WritePolicy>,
}

/// Which fields of a configuration to hide from the inference engine
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Mask {
    pub block_size: bool,
    pub associativity: bool,
    pub set_count: bool,
    pub replacement_policy: bool,
    pub write_policy: bool,
}

impl Mask {
    pub const ALL: Mask = Mask {
        block_size: true,
        associativity: true,
        set_count: true,
        replacement_policy: true,
        write_policy: true,
    };
}

impl InferredParameters {
    /// Builds the caller's view of a configuration, with the masked fields unknown
    pub fn masked(config: &CacheConfig, mask: Mask) -> Self {
        Self {
            block_size: (!mask.block_size).then_some(config.block_size()),
            associativity: (!mask.associativity).then_some(config.associativity()),
            set_count: (!mask.set_count).then_some(config.set_count()),
            replacement_policy: (!mask.replacement_policy).then_some(config.replacement_policy()),
            write_policy: if mask.write_policy {
                None
            } else {
                WritePolicy::from_flags(config.write_back(), config.write_allocate())
            },
        }
    }

    /// Whether every field is known
    pub fn is_complete(&self) -> bool {
        self.block_size.is_some()
            && self.associativity.is_some()
            && self.set_count.is_some()
            && self.replacement_policy.is_some()
            && self.write_policy.is_some()
    }
}

/// How many probes the block size search can afford
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TestMode {
    /// Enough read batches for a binary search
    Relaxed,
    /// A single read batch
    Tight,
}

impl TestMode {
    /// Test cases 1 to 8 have relaxed budgets, 9 to 11 tight ones. Other test cases don't probe
    /// the block size at all
    pub fn from_test_case(test_case: u32) -> Option<Self> {
        match test_case {
            1..=8 => Some(TestMode::Relaxed),
            9..=11 => Some(TestMode::Tight),
            _ => None,
        }
    }
}

/// Infers every unknown field of `params` using only the oracle
///
/// Each procedure starts from a reset cache, so they don't depend on each other or on the order
/// they run in. The first oracle error aborts the run, leaving fields inferred so far filled in
///
/// # Arguments
///
/// * `oracle`: The engine under test
/// * `test_case`: Selects the block size strategy, see [`TestMode::from_test_case`]
/// * `params`: Known fields on input, known and inferred fields on output
///
/// returns: Result<(), OracleError>
pub fn infer<O: Oracle>(oracle: &mut O, test_case: u32, params: &mut InferredParameters) -> Result<(), OracleError> {
    if params.block_size.is_none() {
        params.block_size = match TestMode::from_test_case(test_case) {
            Some(TestMode::Relaxed) => Some(infer_block_size(oracle)?),
            Some(TestMode::Tight) => Some(estimate_block_size(oracle)?),
            None => {
                warn!(test_case, "no block size strategy for this test case");
                None
            }
        };
    }
    if params.associativity.is_none() {
        params.associativity = Some(infer_associativity(oracle)?);
    }
    if params.set_count.is_none() {
        params.set_count = infer_set_count(oracle)?;
    }
    if params.replacement_policy.is_none() {
        params.replacement_policy = Some(infer_replacement_policy(oracle)?);
    }
    if params.write_policy.is_none() {
        params.write_policy = Some(infer_write_policy(oracle)?);
    }
    Ok(())
}

/// Binary searches the block size over [4, 512]
///
/// On a cold cache a stride at least as large as the block size puts every access in a fresh
/// block, so the batch has no hits. A smaller stride always revisits blocks. The cache is reset
/// before every probe, as blocks left over from the previous probe would otherwise produce hits
pub fn infer_block_size<O: Oracle>(oracle: &mut O) -> Result<u32, OracleError> {
    let mut low = MIN_BLOCK_SIZE;
    let mut high = MAX_BLOCK_SIZE;
    while low < high {
        let middle = low + (high - low) / 2;
        oracle.reset();
        if oracle.read_1024(0, middle)? == 0 {
            high = middle;
        } else {
            low = middle + 1;
        }
    }
    info!(block_size = low, "inferred block size");
    Ok(low)
}

/// Estimates the block size from a single sequential read
///
/// Reading consecutive bytes misses once per block, so the block size is about 1024 / misses.
/// This is exact for block sizes up to 32 and for powers of 2, and an approximation elsewhere: the
/// true value can't be recovered once 1024 / misses stops being unique
pub fn estimate_block_size<O: Oracle>(oracle: &mut O) -> Result<u32, OracleError> {
    oracle.reset();
    let hits = oracle.read_1024(0, 1)?;
    let misses = (BATCH_SIZE - hits).max(1);
    let block_size = BATCH_SIZE.div_ceil(misses);
    info!(block_size, misses, "estimated block size");
    Ok(block_size)
}

/// Decides the associativity from the hit counts of strides which pile blocks into set 0
///
/// The first probe cycles 4 blocks: up to 2 ways thrash on every access, 4 or more keep all of
/// them. The follow up distinguishes 1 from 2 ways with 2 blocks, or 4, 8 and 16 ways with 16
/// blocks. Hit counts outside the table leave the default of 1 way
///
/// The table is built for LRU caches with a power of 2 block size. Other block sizes scatter the
/// strided blocks across sets, and LFU keeps different blocks resident, both of which give counts
/// the table doesn't decode
pub fn infer_associativity<O: Oracle>(oracle: &mut O) -> Result<u32, OracleError> {
    oracle.reset();
    let associativity = match oracle.read_1024(0, ASSOCIATIVITY_STRIDE_4_BLOCKS)? {
        0 => match oracle.read_1024(0, ASSOCIATIVITY_STRIDE_2_BLOCKS)? {
            1022 => 2,
            _ => 1,
        },
        1020 => match oracle.read_1024(0, ASSOCIATIVITY_STRIDE_16_BLOCKS)? {
            1 => 4,
            2 => 8,
            1012 => 16,
            hits => {
                warn!(hits, "unrecognised hit count probing 16 blocks, assuming direct mapped");
                1
            }
        },
        hits => {
            warn!(hits, "unrecognised hit count probing 4 blocks, assuming direct mapped");
            1
        }
    };
    info!(associativity, "inferred associativity");
    Ok(associativity)
}

/// Set count inference isn't implemented, so the set count stays unknown
// TODO: probe with strides of block_size * candidate set count once block size and associativity
// are known, looking for the stride at which blocks start competing for a single set
pub fn infer_set_count<O: Oracle>(_oracle: &mut O) -> Result<Option<u32>, OracleError> {
    warn!("set count inference is not implemented, leaving it unknown");
    Ok(None)
}

/// Distinguishes LRU from LFU
///
/// The base address is read 1024 times, making it the most frequently used block in its set, then
/// a long stride cycles enough blocks through the set to push out everything else. LRU evicts the
/// base address during the first cycle, so only the first access hits. LFU keeps it resident, so it
/// hits on later cycles too. Like the associativity probe, this relies on a power of 2 block size
/// to keep the strided blocks in one set
pub fn infer_replacement_policy<O: Oracle>(oracle: &mut O) -> Result<ReplacementPolicyConfig, OracleError> {
    oracle.reset();
    oracle.read_1024(0, 0)?;
    let hits = oracle.read_1024(0, REPLACEMENT_POLICY_STRIDE)?;
    let policy = if hits == 1 {
        ReplacementPolicyConfig::LeastRecentlyUsed
    } else {
        ReplacementPolicyConfig::LeastFrequentlyUsed
    };
    info!(%policy, hits, "inferred replacement policy");
    Ok(policy)
}

/// Decodes the write policy from the latency of 1024 writes to one address
///
/// No-allocate caches charge the write-through latency for every write. Allocating caches miss
/// once, then hit, which is cheaper than that baseline for write-back and dearer for write-through
pub fn infer_write_policy<O: Oracle>(oracle: &mut O) -> Result<WritePolicy, OracleError> {
    oracle.reset();
    let latency = oracle.write_1024(0, 0)?;
    let policy = match latency.cmp(&(WRITE_THROUGH_LATENCY * BATCH_SIZE)) {
        Ordering::Equal => WritePolicy::WriteThroughNoAllocate,
        Ordering::Less => WritePolicy::WriteBackAllocate,
        Ordering::Greater => WritePolicy::WriteThroughAllocate,
    };
    info!(?policy, latency, "inferred write policy");
    Ok(policy)
}
