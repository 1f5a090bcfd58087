use serde::Deserialize;

use crate::cache::{WriteMissPolicy, WritePolicy};
use crate::replacement_policies::PolicyKind;

/// A full simulation configuration - one cache, optionally backed by memory
#[derive(Debug, Deserialize)]
pub struct SimConfig {
    pub cache: CacheConfig,
    #[serde(default)]
    pub memory: Option<MemoryConfig>,
}

/// A configuration for a single cache
#[derive(Debug, Deserialize)]
pub struct CacheConfig {
    pub num_blocks: usize,
    pub line_size: u64,
    pub associativity: usize,
    #[serde(default)]
    pub replacement: PolicyKind,
    #[serde(default)]
    pub write_policy: WritePolicy,
    #[serde(default)]
    pub write_miss_policy: WriteMissPolicy,
}

/// The backing store size in bytes
#[derive(Debug, Deserialize)]
pub struct MemoryConfig {
    pub size_bytes: u64,
}
