use std::collections::VecDeque;

use rand::Rng;
use serde::Deserialize;

/// A generic trait for implementing new replacement policies. Can be used to
/// parameterise a cache set.
///
/// Each policy instance tracks at most `capacity` way indices for a single
/// set; it knows nothing about addresses, tags, or block contents
pub trait ReplacementPolicy {
    /// Records that `slot` was just used or inserted.
    ///
    /// Calling this repeatedly with the same slot before an eviction must not
    /// corrupt the tracked ordering
    ///
    /// # Arguments
    ///
    /// * `slot`: The way index within the set that was accessed
    ///
    /// returns: ()
    fn access(&mut self, slot: usize);

    /// Selects and removes a victim according to the policy.
    ///
    /// Returns `None` when nothing is tracked. The cache only asks for a
    /// victim after observing a full set, so `None` here indicates an internal
    /// invariant violation and the cache falls back to recency-based selection
    ///
    /// returns: Option<usize>
    fn evict(&mut self) -> Option<usize>;

    /// Returns the tracked slots in the policy's internal order, for
    /// inspection and debugging.
    fn peek(&self) -> Vec<usize>;

    /// Clears all tracked state.
    fn reset(&mut self);
}

/// The kind of replacement policy - LRU, FIFO, or Random. Defaults to LRU.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
pub enum PolicyKind {
    #[serde(alias = "lru")]
    Lru,
    #[serde(alias = "fifo")]
    Fifo,
    #[serde(alias = "random")]
    Random,
}

impl Default for PolicyKind {
    fn default() -> Self {
        PolicyKind::Lru
    }
}

impl PolicyKind {
    /// Resolves a policy name without failing, defaulting unrecognised names
    /// to LRU. This preserves the lossy behaviour callers driving the cache
    /// from user-entered strings rely on; configuration files parsed through
    /// serde reject unknown names instead.
    pub fn from_name(name: &str) -> Self {
        match name {
            "LRU" | "lru" => PolicyKind::Lru,
            "FIFO" | "fifo" => PolicyKind::Fifo,
            "Random" | "random" => PolicyKind::Random,
            _ => PolicyKind::Lru,
        }
    }
}

/// Least Recently Used replacement policy
///
/// Slots are kept ordered from least- to most-recently-used; re-accessing a
/// tracked slot moves it to the most-recently-used end
#[derive(Debug)]
pub struct LeastRecentlyUsed {
    capacity: usize,
    slots: VecDeque<usize>,
}

impl LeastRecentlyUsed {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: VecDeque::with_capacity(capacity),
        }
    }
}

impl ReplacementPolicy for LeastRecentlyUsed {
    fn access(&mut self, slot: usize) {
        if let Some(position) = self.slots.iter().position(|s| *s == slot) {
            self.slots.remove(position);
        }
        self.slots.push_back(slot);
        // Self-eviction under capacity pressure. The cache never lets this
        // happen in normal flow, the policy stays correct regardless
        if self.slots.len() > self.capacity {
            self.slots.pop_front();
        }
    }

    fn evict(&mut self) -> Option<usize> {
        self.slots.pop_front()
    }

    fn peek(&self) -> Vec<usize> {
        self.slots.iter().copied().collect()
    }

    fn reset(&mut self) {
        self.slots.clear();
    }
}

/// First-In-First-Out replacement policy
///
/// The defining difference from LRU: re-accessing a tracked slot does not
/// reorder it, only first insertion counts
#[derive(Debug)]
pub struct FirstInFirstOut {
    capacity: usize,
    slots: VecDeque<usize>,
}

impl FirstInFirstOut {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: VecDeque::with_capacity(capacity),
        }
    }
}

impl ReplacementPolicy for FirstInFirstOut {
    fn access(&mut self, slot: usize) {
        if self.slots.contains(&slot) {
            return;
        }
        self.slots.push_back(slot);
        if self.slots.len() > self.capacity {
            self.slots.pop_front();
        }
    }

    fn evict(&mut self) -> Option<usize> {
        self.slots.pop_front()
    }

    fn peek(&self) -> Vec<usize> {
        self.slots.iter().copied().collect()
    }

    fn reset(&mut self) {
        self.slots.clear();
    }
}

/// Random replacement policy, evicting a uniformly-random tracked slot
#[derive(Debug)]
pub struct RandomEviction {
    capacity: usize,
    slots: Vec<usize>,
}

impl RandomEviction {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
        }
    }

    fn remove_random(&mut self) -> Option<usize> {
        if self.slots.is_empty() {
            return None;
        }
        let victim = rand::rng().random_range(0..self.slots.len());
        Some(self.slots.swap_remove(victim))
    }
}

impl ReplacementPolicy for RandomEviction {
    fn access(&mut self, slot: usize) {
        if self.slots.contains(&slot) {
            return;
        }
        self.slots.push(slot);
        if self.slots.len() > self.capacity {
            self.remove_random();
        }
    }

    fn evict(&mut self) -> Option<usize> {
        self.remove_random()
    }

    fn peek(&self) -> Vec<usize> {
        self.slots.clone()
    }

    fn reset(&mut self) {
        self.slots.clear();
    }
}

/// Enum for the three policies provided by the library
///
/// Using trait objects in Rust reduces boilerplate, but it is opaque to the
/// compiler; as every cache access goes through the policy it's better to
/// branch explicitly on the concrete types so the calls can be inlined
#[derive(Debug)]
pub enum Policy {
    LeastRecentlyUsed(LeastRecentlyUsed),
    FirstInFirstOut(FirstInFirstOut),
    RandomEviction(RandomEviction),
}

impl Policy {
    /// Creates a fresh policy instance of the requested kind with capacity for
    /// `capacity` slots (one per way in the owning set).
    pub fn new(kind: PolicyKind, capacity: usize) -> Self {
        match kind {
            PolicyKind::Lru => Policy::LeastRecentlyUsed(LeastRecentlyUsed::new(capacity)),
            PolicyKind::Fifo => Policy::FirstInFirstOut(FirstInFirstOut::new(capacity)),
            PolicyKind::Random => Policy::RandomEviction(RandomEviction::new(capacity)),
        }
    }
}

impl ReplacementPolicy for Policy {
    fn access(&mut self, slot: usize) {
        match self {
            Policy::LeastRecentlyUsed(p) => p.access(slot),
            Policy::FirstInFirstOut(p) => p.access(slot),
            Policy::RandomEviction(p) => p.access(slot),
        }
    }

    fn evict(&mut self) -> Option<usize> {
        match self {
            Policy::LeastRecentlyUsed(p) => p.evict(),
            Policy::FirstInFirstOut(p) => p.evict(),
            Policy::RandomEviction(p) => p.evict(),
        }
    }

    fn peek(&self) -> Vec<usize> {
        match self {
            Policy::LeastRecentlyUsed(p) => p.peek(),
            Policy::FirstInFirstOut(p) => p.peek(),
            Policy::RandomEviction(p) => p.peek(),
        }
    }

    fn reset(&mut self) {
        match self {
            Policy::LeastRecentlyUsed(p) => p.reset(),
            Policy::FirstInFirstOut(p) => p.reset(),
            Policy::RandomEviction(p) => p.reset(),
        }
    }
}
