//! # ProbeLib
//!
//! Probelib simulates a configurable set-associative cache and recovers its hidden configuration
//! by observing it from the outside
//!
//! The cache can only be observed through two oracles, a batched read reporting hits and a batched
//! write reporting latency, each limited by a budget. The inference procedures choose address
//! patterns, call the oracles, and decode the block size, associativity, replacement policy and
//! write policy from what they see

/// Contains the implementation of the cache, and a utility enum for the existing cache types
pub mod cache;

/// Contains the validated cache configuration and the JSON input format
pub mod config;

/// Contains the configuration and oracle errors
pub mod error;

/// Contains the procedures which infer the cache configuration from the oracles
pub mod inference;

/// Contains the provided replacement policies, with a trait for implementing custom replacement
/// policies
pub mod replacement_policies;

/// Contains the simulator, which runs oracle batches against a cache within a budget
pub mod simulator;

#[cfg(test)]
mod test;

/// Contains byte size literal helpers
pub mod util;
