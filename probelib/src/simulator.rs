use std::time::{Duration, Instant};
use serde::Serialize;
use tracing::{debug, trace};
use crate::cache::{CacheTrait, GenericCache};
use crate::config::{CacheConfig, EngineConfig};
use crate::error::{ConfigError, OracleError};

/// Number of accesses performed by a single oracle call
pub const BATCH_SIZE: u32 = 1024;

/// The two probes through which a cache can be observed, plus a free reset
///
/// This is the only view of the engine the inference procedures get
pub trait Oracle {
    /// Clears the cache to its initial state. Does not count against either budget
    fn reset(&mut self);

    /// Reads `base_addr + i * stride` for each i in [0, 1024), returning the number of hits
    ///
    /// Addresses wrap at 2^32
    fn read_1024(&mut self, base_addr: u32, stride: u32) -> Result<u32, OracleError>;

    /// Writes `base_addr + i * stride` for each i in [0, 1024), returning the total latency
    ///
    /// Addresses wrap at 2^32
    fn write_1024(&mut self, base_addr: u32, stride: u32) -> Result<u32, OracleError>;
}

/// Counts oracle calls against their ceilings. Counts only ever increase, and a batch is only
/// counted once it is allowed to run
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct AccessBudget {
    read_count: u32,
    read_limit: u32,
    write_count: u32,
    write_limit: u32,
}

impl AccessBudget {
    pub fn new(read_limit: u32, write_limit: u32) -> Self {
        Self {
            read_count: 0,
            read_limit,
            write_count: 0,
            write_limit,
        }
    }

    fn charge_read(&mut self) -> Result<(), OracleError> {
        if self.read_count >= self.read_limit {
            return Err(OracleError::ReadLimitExceeded { limit: self.read_limit });
        }
        self.read_count += 1;
        Ok(())
    }

    fn charge_write(&mut self) -> Result<(), OracleError> {
        if self.write_count >= self.write_limit {
            return Err(OracleError::WriteLimitExceeded { limit: self.write_limit });
        }
        self.write_count += 1;
        Ok(())
    }

    pub fn reads_used(&self) -> u32 {
        self.read_count
    }

    pub fn writes_used(&self) -> u32 {
        self.write_count
    }

    pub fn reads_remaining(&self) -> u32 {
        self.read_limit - self.read_count
    }

    pub fn writes_remaining(&self) -> u32 {
        self.write_limit - self.write_count
    }
}

/// The simulator owns the cache and its budget, and runs oracle batches against it.
///
/// It supports any number of batches up to the budget, and keeps track of the time spent
/// simulating them
#[derive(Debug)]
pub struct Simulator {
    cache: GenericCache,
    budget: AccessBudget,
    simulation_time: Duration,
}

impl Simulator {
    /// Creates a new simulator with an empty cache
    ///
    /// # Arguments
    ///
    /// * `config`: A validated cache configuration
    /// * `budget`: The oracle limits for this simulator's lifetime
    ///
    /// returns: Simulator
    pub fn new(config: CacheConfig, budget: AccessBudget) -> Self {
        Self {
            cache: GenericCache::new(config),
            budget,
            simulation_time: Duration::new(0, 0),
        }
    }

    /// Creates a simulator from the JSON input format, failing before anything is built if the
    /// configuration is invalid
    pub fn from_config(config: &EngineConfig) -> Result<Self, ConfigError> {
        let (cache, budget) = config.validate()?;
        Ok(Self::new(cache, budget))
    }

    pub fn config(&self) -> &CacheConfig {
        self.cache.config()
    }

    pub fn cache(&self) -> &GenericCache {
        &self.cache
    }

    pub fn budget(&self) -> &AccessBudget {
        &self.budget
    }

    /// Gets the wall-clock time spent running batches
    pub fn get_execution_time(&self) -> &Duration {
        &self.simulation_time
    }

    fn batch_addresses(base_addr: u32, stride: u32) -> impl Iterator<Item = u32> {
        (0..BATCH_SIZE).map(move |i| base_addr.wrapping_add(i.wrapping_mul(stride)))
    }
}

impl Oracle for Simulator {
    fn reset(&mut self) {
        trace!("resetting cache");
        self.cache.reset();
    }

    fn read_1024(&mut self, base_addr: u32, stride: u32) -> Result<u32, OracleError> {
        self.budget.charge_read()?;
        let start = Instant::now();
        let mut hits = 0;
        for address in Self::batch_addresses(base_addr, stride) {
            if self.cache.read_line(address) {
                hits += 1;
            }
        }
        self.simulation_time += start.elapsed();
        debug!(base_addr, stride, hits, "read batch");
        Ok(hits)
    }

    fn write_1024(&mut self, base_addr: u32, stride: u32) -> Result<u32, OracleError> {
        self.budget.charge_write()?;
        let start = Instant::now();
        let mut latency = 0;
        for address in Self::batch_addresses(base_addr, stride) {
            latency += self.cache.write_line(address);
        }
        self.simulation_time += start.elapsed();
        debug!(base_addr, stride, latency, "write batch");
        Ok(latency)
    }
}

/// Holds the single live engine for a run
///
/// The slot is created empty, has an engine installed before inference, and gives it back
/// afterwards. Probing an empty slot fails rather than touching a stale engine
#[derive(Debug, Default)]
pub struct EngineSlot {
    engine: Option<Simulator>,
}

impl EngineSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs an engine, returning the previous one if there was one
    pub fn install(&mut self, engine: Simulator) -> Option<Simulator> {
        self.engine.replace(engine)
    }

    /// Removes the engine, leaving the slot empty
    pub fn take(&mut self) -> Option<Simulator> {
        self.engine.take()
    }

    pub fn get(&self) -> Option<&Simulator> {
        self.engine.as_ref()
    }

    fn engine_mut(&mut self) -> Result<&mut Simulator, OracleError> {
        self.engine.as_mut().ok_or(OracleError::Uninitialised)
    }
}

impl Oracle for EngineSlot {
    fn reset(&mut self) {
        if let Some(engine) = self.engine.as_mut() {
            engine.reset();
        }
    }

    fn read_1024(&mut self, base_addr: u32, stride: u32) -> Result<u32, OracleError> {
        self.engine_mut()?.read_1024(base_addr, stride)
    }

    fn write_1024(&mut self, base_addr: u32, stride: u32) -> Result<u32, OracleError> {
        self.engine_mut()?.write_1024(base_addr, stride)
    }
}
