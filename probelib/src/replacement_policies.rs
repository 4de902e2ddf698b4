use crate::cache::CacheLine;

/// A generic trait for implementing new replacement policies. Can be used to parameterise a Cache.
///
/// Policies keep their bookkeeping in the `counter` of each line, so they hold no state of their
/// own and only ever see the lines of a single set
pub trait ReplacementPolicy {
    /// Updates the counters of a set when one of its ways is accessed
    ///
    /// Called on every hit, and on every fill after the new tag has been installed
    ///
    /// # Arguments
    ///
    /// * `set`: The lines of the set containing the accessed way
    /// * `way`: The way which was accessed
    ///
    /// returns: ()
    fn update_on_access(&self, set: &mut [CacheLine], way: usize);

    /// Chooses the way to evict from a full set
    ///
    /// Implementations must not modify the set, eviction is the responsibility of the cache
    ///
    /// # Arguments
    ///
    /// * `set`: The lines of the set, all of which are valid
    ///
    /// returns: usize
    fn get_victim(&self, set: &[CacheLine]) -> usize;
}

/// Least Recently Used replacement policy
///
/// Rather than keeping a usage stack, each line counts how many accesses to its set have happened
/// since it was last touched. Accessing a way zeroes its counter and ages every other way, so the
/// victim is the way with the largest counter
#[derive(Debug, Default, Copy, Clone)]
pub struct LeastRecentlyUsed;

impl ReplacementPolicy for LeastRecentlyUsed {
    fn update_on_access(&self, set: &mut [CacheLine], way: usize) {
        for (index, line) in set.iter_mut().enumerate() {
            if index == way {
                line.counter = 0;
            } else {
                line.counter = line.counter.saturating_add(1);
            }
        }
    }

    fn get_victim(&self, set: &[CacheLine]) -> usize {
        // Ties go to the highest way
        let mut victim = 0;
        let mut max_value = set[0].counter;
        for (index, line) in set.iter().enumerate().skip(1) {
            if line.counter >= max_value {
                max_value = line.counter;
                victim = index;
            }
        }
        victim
    }
}

/// Least frequently used replacement policy
///
/// Counters start from zero when a line is filled, so a freshly installed line has been used once
#[derive(Debug, Default, Copy, Clone)]
pub struct LeastFrequentlyUsed;

impl ReplacementPolicy for LeastFrequentlyUsed {
    fn update_on_access(&self, set: &mut [CacheLine], way: usize) {
        set[way].counter = set[way].counter.saturating_add(1);
    }

    fn get_victim(&self, set: &[CacheLine]) -> usize {
        // Ties go to the highest way
        let mut victim = 0;
        let mut min_value = set[0].counter;
        for (index, line) in set.iter().enumerate().skip(1) {
            if line.counter <= min_value {
                min_value = line.counter;
                victim = index;
            }
        }
        victim
    }
}
