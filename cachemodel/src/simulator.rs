use serde::Serialize;

use crate::cache::{AccessResult, Cache, CacheBlock, WritePolicy};
use crate::error::SimulationError;
use crate::memory::BackingStore;
use crate::stats::{Statistics, StatsSnapshot};

/// One pending memory access: an address, a read/write flag, and the byte to
/// store when writing
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct Access {
    pub address: u64,
    pub write: bool,
    pub value: Option<u8>,
}

impl Access {
    pub fn read(address: u64) -> Self {
        Self {
            address,
            write: false,
            value: None,
        }
    }

    pub fn write(address: u64, value: u8) -> Self {
        Self {
            address,
            write: true,
            value: Some(value),
        }
    }
}

/// Everything a consumer needs to know about one completed access, including
/// a snapshot of the statistics after it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessRecord {
    pub address: u64,
    pub is_write: bool,
    pub hit: bool,
    pub set_index: usize,
    pub way_index: Option<usize>,
    pub memory_read: bool,
    pub memory_write: bool,
    pub evicted: Option<CacheBlock>,
    pub stats: StatsSnapshot,
}

/// Drives a queue of accesses through a cache one at a time, turning the
/// cache's reported memory obligations into reads and writes against an
/// optional backing store.
///
/// The simulator is the only component that moves bytes between the cache's
/// per-line payloads and the store: line fills happen exactly when the cache
/// reports `memory_read`, flushes and write-throughs exactly when it reports
/// `memory_write`. Each `step` runs one access to completion, so driving the
/// queue interactively or via [`Simulator::run_all`] produces identical
/// statistics and final cache contents.
pub struct Simulator {
    cache: Cache,
    stats: Statistics,
    memory: Option<BackingStore>,
    queue: Vec<Access>,
    cursor: usize,
}

impl Simulator {
    pub fn new(cache: Cache, memory: Option<BackingStore>) -> Self {
        Self {
            cache,
            stats: Statistics::new(),
            memory,
            queue: Vec::new(),
            cursor: 0,
        }
    }

    /// Replaces the pending queue with the zipped triples of the given
    /// slices and rewinds to the start.
    ///
    /// Missing `writes` entries default to reads, missing `values` to no
    /// value. Statistics are not reset; call [`Simulator::reset`] for that
    ///
    /// # Arguments
    ///
    /// * `addresses`: The addresses to access, in order
    /// * `writes`: Optional per-access write flags
    /// * `values`: Optional per-access bytes to store when writing
    ///
    /// returns: ()
    pub fn load_sequence(
        &mut self,
        addresses: &[u64],
        writes: Option<&[bool]>,
        values: Option<&[Option<u8>]>,
    ) {
        self.queue = addresses
            .iter()
            .enumerate()
            .map(|(i, address)| Access {
                address: *address,
                write: writes.and_then(|w| w.get(i).copied()).unwrap_or(false),
                value: values.and_then(|v| v.get(i).copied()).unwrap_or(None),
            })
            .collect();
        self.cursor = 0;
    }

    /// Replaces the pending queue with pre-built accesses.
    pub fn load_accesses(&mut self, accesses: Vec<Access>) {
        self.queue = accesses;
        self.cursor = 0;
    }

    pub fn has_next(&self) -> bool {
        self.cursor < self.queue.len()
    }

    /// Runs the next pending access to completion.
    ///
    /// Returns `Ok(None)` once the queue is exhausted. When a backing store is
    /// attached, the access's whole line is bounds-checked up front, so a
    /// failing access leaves the cache, store, and statistics untouched.
    ///
    /// returns: Result<Option<AccessRecord>, SimulationError>
    pub fn step(&mut self) -> Result<Option<AccessRecord>, SimulationError> {
        if !self.has_next() {
            return Ok(None);
        }
        let access = self.queue[self.cursor];
        let line_size = self.cache.line_size();
        let base = (access.address / line_size) * line_size;
        if let Some(memory) = &self.memory {
            memory.check_range(base, line_size)?;
        }
        self.cursor += 1;

        let result = self.cache.access(access.address, access.write, None, access.value);
        self.stats.record_access(result.hit);
        if result.memory_read {
            self.fill_line(&access, &result, base)?;
            self.stats.memory_reads += 1;
        }
        if result.memory_write {
            self.write_memory(&access, &result, base)?;
            self.stats.memory_writes += 1;
        }

        Ok(Some(AccessRecord {
            address: access.address,
            is_write: access.write,
            hit: result.hit,
            set_index: result.set_index,
            way_index: result.way_index,
            memory_read: result.memory_read,
            memory_write: result.memory_write,
            evicted: result.evicted,
            stats: self.stats.snapshot(),
        }))
    }

    /// Fetches the accessed line from the store into the allocated way, then
    /// re-applies the just-written value on top so a write-allocate reflects
    /// both the store contents and the new write.
    fn fill_line(
        &mut self,
        access: &Access,
        result: &AccessResult,
        base: u64,
    ) -> Result<(), SimulationError> {
        let line_size = self.cache.line_size();
        let write_back = self.cache.write_policy() == WritePolicy::WriteBack;
        let memory = match &self.memory {
            Some(memory) => memory,
            None => return Ok(()),
        };
        let way = match result.way_index {
            Some(way) => way,
            None => return Ok(()),
        };
        let mut line = vec![0u8; line_size as usize];
        for (offset, byte) in line.iter_mut().enumerate() {
            *byte = memory.read(base + offset as u64)?;
        }
        let block = self.cache.block_mut(result.set_index, way);
        block.data.copy_from_slice(&line);
        if access.write {
            if let Some(value) = access.value {
                block.data[(access.address % line_size) as usize] = value;
            }
            if write_back {
                block.dirty = true;
            }
        }
        Ok(())
    }

    /// Performs the store write the cache reported: a dirty victim flush to
    /// the victim's own base address, a full-line write-through of the current
    /// way, or the single-byte write-no-allocate bypass.
    fn write_memory(
        &mut self,
        access: &Access,
        result: &AccessResult,
        base: u64,
    ) -> Result<(), SimulationError> {
        let line_size = self.cache.line_size();
        let num_sets = self.cache.num_sets() as u64;
        let memory = match &mut self.memory {
            Some(memory) => memory,
            None => return Ok(()),
        };
        // Dirty blocks only exist under write-back, so a dirty victim always
        // means a flush rather than a write-through
        if let Some(evicted) = result.evicted.as_ref().filter(|block| block.dirty) {
            let tag = evicted.tag.unwrap_or(0);
            let victim_base = (tag * num_sets + result.set_index as u64) * line_size;
            for (offset, byte) in evicted.data.iter().enumerate() {
                memory.write(victim_base + offset as u64, *byte)?;
            }
            return Ok(());
        }
        if let Some(way) = result.way_index {
            let line = self.cache.block(result.set_index, way).data.clone();
            for (offset, byte) in line.iter().enumerate() {
                memory.write(base + offset as u64, *byte)?;
            }
            return Ok(());
        }
        memory.write(access.address, access.value.unwrap_or(0))
    }

    /// Repeatedly steps until the queue is exhausted.
    pub fn run_all(&mut self) -> Result<(), SimulationError> {
        self.run_all_with(|_| {})
    }

    /// Repeatedly steps until the queue is exhausted, handing each record to
    /// `callback`. Replaying a sequence this way is observably equivalent to
    /// stepping it manually
    pub fn run_all_with<F>(&mut self, mut callback: F) -> Result<(), SimulationError>
    where
        F: FnMut(&AccessRecord),
    {
        while let Some(record) = self.step()? {
            callback(&record);
        }
        Ok(())
    }

    /// Resets statistics, empties the pending queue, and invalidates the
    /// whole cache. The backing store keeps its contents.
    pub fn reset(&mut self) {
        self.stats.reset();
        self.queue.clear();
        self.cursor = 0;
        self.cache.reset();
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn cache_mut(&mut self) -> &mut Cache {
        &mut self.cache
    }

    pub fn memory(&self) -> Option<&BackingStore> {
        self.memory.as_ref()
    }

    pub fn memory_mut(&mut self) -> Option<&mut BackingStore> {
        self.memory.as_mut()
    }
}
