use thiserror::Error;

/// Errors surfaced by the simulation core.
///
/// The original design swallowed most of these silently (including clamping
/// out-of-range memory addresses, which corrupted results); here they are
/// explicit and must be handled by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SimulationError {
    /// A backing-store access fell outside `[0, size)`.
    #[error("address {address:#x} is out of bounds for a backing store of {size} bytes")]
    AddressOutOfBounds { address: u64, size: u64 },

    /// The cache geometry or policy configuration was rejected at construction.
    #[error("invalid cache configuration: {0}")]
    InvalidConfiguration(String),
}
