use serde::{Deserialize, Serialize};

use crate::config::CacheConfig;
use crate::error::SimulationError;
use crate::replacement_policies::{Policy, PolicyKind, ReplacementPolicy};

/// Whether writes propagate to memory immediately or are deferred to eviction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WritePolicy {
    #[serde(alias = "write-back")]
    WriteBack,
    #[serde(alias = "write-through")]
    WriteThrough,
}

impl Default for WritePolicy {
    fn default() -> Self {
        WritePolicy::WriteThrough
    }
}

/// Whether a write miss loads the line into the cache or bypasses it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteMissPolicy {
    #[serde(alias = "write-allocate")]
    WriteAllocate,
    #[serde(alias = "write-no-allocate")]
    WriteNoAllocate,
}

impl Default for WriteMissPolicy {
    fn default() -> Self {
        WriteMissPolicy::WriteAllocate
    }
}

/// One way of a cache set.
///
/// `data` always has length `line_size` and is zeroed while the block is
/// invalid. `last_access_time` and `load_time` are taken from the cache's
/// logical clock; the former backs the defensive recency fallback when a
/// policy fails to produce a victim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheBlock {
    pub tag: Option<u64>,
    pub valid: bool,
    pub dirty: bool,
    pub last_access_time: u64,
    pub load_time: u64,
    pub data: Vec<u8>,
}

impl CacheBlock {
    fn empty(line_size: u64) -> Self {
        Self {
            tag: None,
            valid: false,
            dirty: false,
            last_access_time: 0,
            load_time: 0,
            data: vec![0; line_size as usize],
        }
    }

    fn invalidate(&mut self) {
        self.tag = None;
        self.valid = false;
        self.dirty = false;
        self.last_access_time = 0;
        self.load_time = 0;
        self.data.fill(0);
    }
}

/// The outcome of a single cache access.
///
/// `memory_read` and `memory_write` are obligations reported to the caller,
/// not side-effects already performed; the cache itself never touches the
/// backing store. `way_index` is `None` only on a write-no-allocate miss,
/// `evicted` is a snapshot of the victim taken before its slot was
/// overwritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessResult {
    pub hit: bool,
    pub set_index: usize,
    pub way_index: Option<usize>,
    pub evicted: Option<CacheBlock>,
    pub memory_read: bool,
    pub memory_write: bool,
}

/// A set-associative cache model.
///
/// The cache is an array of `num_sets` sets of `associativity` ways each,
/// with one independent replacement policy instance per set. Address
/// decomposition is purely arithmetic:
///
/// ```text
/// block_addr = address / line_size
/// set_index  = block_addr % num_sets
/// tag        = block_addr / num_sets
/// ```
///
/// so no power-of-two geometry is required.
#[derive(Debug)]
pub struct Cache {
    num_blocks: usize,
    line_size: u64,
    associativity: usize,
    num_sets: usize,
    write_policy: WritePolicy,
    write_miss_policy: WriteMissPolicy,
    sets: Vec<Vec<CacheBlock>>,
    policies: Vec<Policy>,
    // Logical clock, bumped once per access that touches a block
    clock: u64,
}

impl Cache {
    /// Creates a cache with the given geometry and policies.
    ///
    /// If `associativity` does not evenly divide `num_blocks` it is reduced to
    /// the largest value below it that does; `num_blocks` is never changed to
    /// compensate. A `line_size` of 0 is coerced to 1 as a permissive default,
    /// while a zero `num_blocks` or `associativity` is rejected outright.
    ///
    /// # Arguments
    ///
    /// * `num_blocks`: Total number of ways across all sets
    /// * `line_size`: Bytes per cache line
    /// * `associativity`: Requested ways per set
    /// * `replacement`: Replacement policy kind, applied to every set
    /// * `write_policy`: Write-back or write-through
    /// * `write_miss_policy`: Write-allocate or write-no-allocate
    ///
    /// returns: Result<Cache, SimulationError>
    pub fn new(
        num_blocks: usize,
        line_size: u64,
        associativity: usize,
        replacement: PolicyKind,
        write_policy: WritePolicy,
        write_miss_policy: WriteMissPolicy,
    ) -> Result<Self, SimulationError> {
        if num_blocks == 0 {
            return Err(SimulationError::InvalidConfiguration(
                "num_blocks must be >= 1".to_string(),
            ));
        }
        if associativity == 0 {
            return Err(SimulationError::InvalidConfiguration(
                "associativity must be >= 1".to_string(),
            ));
        }
        let line_size = line_size.max(1);
        let associativity = normalise_associativity(num_blocks, associativity);
        let num_sets = num_blocks / associativity;
        let sets = (0..num_sets)
            .map(|_| (0..associativity).map(|_| CacheBlock::empty(line_size)).collect())
            .collect();
        let policies = (0..num_sets).map(|_| Policy::new(replacement, associativity)).collect();
        Ok(Self {
            num_blocks,
            line_size,
            associativity,
            num_sets,
            write_policy,
            write_miss_policy,
            sets,
            policies,
            clock: 0,
        })
    }

    /// Creates a cache from a parsed configuration.
    pub fn from_config(config: &CacheConfig) -> Result<Self, SimulationError> {
        Self::new(
            config.num_blocks,
            config.line_size,
            config.associativity,
            config.replacement,
            config.write_policy,
            config.write_miss_policy,
        )
    }

    /// Decodes an address into `(set_index, tag)`.
    pub fn decode(&self, address: u64) -> (usize, u64) {
        let block_addr = address / self.line_size;
        let set_index = (block_addr % self.num_sets as u64) as usize;
        let tag = block_addr / self.num_sets as u64;
        (set_index, tag)
    }

    /// Performs one cache access, reporting the hit/miss outcome and any
    /// memory obligations it creates.
    ///
    /// The order of checks is fixed: hit detection first, then the
    /// write-no-allocate bypass, then allocation into a free way, then
    /// eviction. A reported `memory_read` means the line must be fetched from
    /// the backing store on any allocation; a reported `memory_write` means
    /// either an immediate write-through/bypass write or a dirty victim flush
    /// (the evicted snapshot says which).
    ///
    /// # Arguments
    ///
    /// * `address`: Byte address of the access, assumed non-negative by type
    /// * `is_write`: Whether this access is a write
    /// * `write_miss_override`: Overrides the configured write-miss policy for
    ///   this access only
    /// * `write_value`: Byte stored at `address % line_size` within the line
    ///   when writing
    ///
    /// returns: AccessResult
    pub fn access(
        &mut self,
        address: u64,
        is_write: bool,
        write_miss_override: Option<WriteMissPolicy>,
        write_value: Option<u8>,
    ) -> AccessResult {
        let write_miss_policy = write_miss_override.unwrap_or(self.write_miss_policy);
        let (set_index, tag) = self.decode(address);
        let offset = (address % self.line_size) as usize;
        self.clock += 1;
        let now = self.clock;

        // Hit path
        let hit_way = self.sets[set_index]
            .iter()
            .position(|block| block.valid && block.tag == Some(tag));
        if let Some(way) = hit_way {
            let write_policy = self.write_policy;
            let block = &mut self.sets[set_index][way];
            block.last_access_time = now;
            let mut memory_write = false;
            if is_write {
                if let Some(value) = write_value {
                    block.data[offset] = value;
                }
                match write_policy {
                    WritePolicy::WriteBack => block.dirty = true,
                    WritePolicy::WriteThrough => memory_write = true,
                }
            }
            self.policies[set_index].access(way);
            return AccessResult {
                hit: true,
                set_index,
                way_index: Some(way),
                evicted: None,
                memory_read: false,
                memory_write,
            };
        }

        // Write miss under write-no-allocate bypasses the cache entirely
        if is_write && write_miss_policy == WriteMissPolicy::WriteNoAllocate {
            return AccessResult {
                hit: false,
                set_index,
                way_index: None,
                evicted: None,
                memory_read: false,
                memory_write: true,
            };
        }

        // Allocate into a free way if one exists
        if let Some(way) = self.sets[set_index].iter().position(|block| !block.valid) {
            self.fill_way(set_index, way, tag, is_write, write_value, offset, now);
            return AccessResult {
                hit: false,
                set_index,
                way_index: Some(way),
                evicted: None,
                memory_read: true,
                memory_write: is_write && self.write_policy == WritePolicy::WriteThrough,
            };
        }

        // Set is full, evict. The policy must produce a victim here; if it
        // doesn't, fall back to the least recently used way so the access can
        // still make progress
        let victim = match self.policies[set_index].evict() {
            Some(way) if way < self.associativity => way,
            _ => self.least_recent_way(set_index),
        };
        // Snapshot before overwriting: the flush address is reconstructed
        // from the victim's old tag and this set index
        let evicted = self.sets[set_index][victim].clone();
        let flush = evicted.dirty && self.write_policy == WritePolicy::WriteBack;
        self.fill_way(set_index, victim, tag, is_write, write_value, offset, now);
        AccessResult {
            hit: false,
            set_index,
            way_index: Some(victim),
            evicted: Some(evicted),
            memory_read: true,
            memory_write: flush || (is_write && self.write_policy == WritePolicy::WriteThrough),
        }
    }

    fn fill_way(
        &mut self,
        set_index: usize,
        way: usize,
        tag: u64,
        is_write: bool,
        write_value: Option<u8>,
        offset: usize,
        now: u64,
    ) {
        let dirty = is_write && self.write_policy == WritePolicy::WriteBack;
        let block = &mut self.sets[set_index][way];
        block.tag = Some(tag);
        block.valid = true;
        block.dirty = dirty;
        block.last_access_time = now;
        block.load_time = now;
        // A fresh block starts zeroed; the simulator fills in the real line
        // when it performs the reported memory read
        block.data.fill(0);
        if is_write {
            if let Some(value) = write_value {
                block.data[offset] = value;
            }
        }
        self.policies[set_index].access(way);
    }

    fn least_recent_way(&self, set_index: usize) -> usize {
        self.sets[set_index]
            .iter()
            .enumerate()
            .min_by_key(|(_, block)| block.last_access_time)
            .map(|(way, _)| way)
            .unwrap_or(0)
    }

    /// Invalidates every way in every set and resets every set's policy.
    pub fn reset(&mut self) {
        for set in &mut self.sets {
            for block in set {
                block.invalidate();
            }
        }
        for policy in &mut self.policies {
            policy.reset();
        }
        self.clock = 0;
    }

    /// Replaces every set's policy with a fresh instance of `kind`, discarding
    /// all prior eviction-order state. Block contents are unaffected. Usable
    /// at any time, not only at construction.
    pub fn set_replacement(&mut self, kind: PolicyKind) {
        self.policies = (0..self.num_sets)
            .map(|_| Policy::new(kind, self.associativity))
            .collect();
    }

    /// Name-based variant of [`Cache::set_replacement`]; unknown names fall
    /// back to LRU.
    pub fn set_replacement_by_name(&mut self, name: &str) {
        self.set_replacement(PolicyKind::from_name(name));
    }

    pub fn block(&self, set_index: usize, way: usize) -> &CacheBlock {
        &self.sets[set_index][way]
    }

    pub(crate) fn block_mut(&mut self, set_index: usize, way: usize) -> &mut CacheBlock {
        &mut self.sets[set_index][way]
    }

    /// The tracked slot order of one set's policy, for inspection.
    pub fn policy_order(&self, set_index: usize) -> Vec<usize> {
        self.policies[set_index].peek()
    }

    pub fn num_blocks(&self) -> usize {
        self.num_blocks
    }

    pub fn line_size(&self) -> u64 {
        self.line_size
    }

    /// The effective associativity after divisor normalisation.
    pub fn associativity(&self) -> usize {
        self.associativity
    }

    pub fn num_sets(&self) -> usize {
        self.num_sets
    }

    pub fn write_policy(&self) -> WritePolicy {
        self.write_policy
    }

    pub fn write_miss_policy(&self) -> WriteMissPolicy {
        self.write_miss_policy
    }
}

/// Largest value `<= requested` that evenly divides `num_blocks`. 1 always
/// divides, so this terminates with a usable associativity.
fn normalise_associativity(num_blocks: usize, requested: usize) -> usize {
    let mut candidate = requested.min(num_blocks);
    while num_blocks % candidate != 0 {
        candidate -= 1;
    }
    candidate
}
