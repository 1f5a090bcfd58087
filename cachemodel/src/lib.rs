//! # CacheModel
//!
//! Cachemodel is a library for simulating a single-level set-associative CPU
//! cache over a byte-addressable backing store
//!
//! It provides the cache data structure itself, interchangeable replacement
//! policies, a simulator which feeds an access stream through the cache while
//! keeping cache lines and memory bytes reconciled, and running statistics
//!
//! The geometry is not restricted to powers of two; address decomposition is
//! plain integer arithmetic, so any block count, line size, and associativity
//! combination works

/// Contains the set-associative cache, its blocks, and the access algorithm
pub mod cache;

/// Contains definitions for the JSON configuration format
pub mod config;

/// Contains the error type used across the library
pub mod error;

/// Contains trace-file reading and parsing for drivers of the simulator
pub mod io;

/// Contains the byte-addressable backing store used behind the cache
pub mod memory;

/// Contains the provided replacement policies, with a trait for implementing
/// custom replacement policies
pub mod replacement_policies;

/// Contains the simulator which coordinates the cache, the backing store, and
/// the statistics
pub mod simulator;

/// Contains the statistics counters and their exportable snapshot form
pub mod stats;
