use thiserror::Error;

/// Invariant violations inside the device primitives.
///
/// These signal bugs in the allocator or deallocator, not user mistakes:
/// with a correct caller they never occur, but the primitives check for them
/// defensively instead of silently corrupting device state.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    #[error("Block index out of range: {0}")]
    OutOfRange(usize),

    #[error("Block already occupied: {0}")]
    AlreadyOccupied(usize),

    #[error("Block already free: {0}")]
    AlreadyFree(usize),
}

/// Errors returned by file creation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AllocationError {
    #[error("File '{0}' already exists")]
    DuplicateName(String),

    #[error("File name must not be empty")]
    InvalidName,

    #[error("Invalid size: {0} (must be at least 1 block)")]
    InvalidSize(usize),

    #[error("Size {size} exceeds the per-file limit of {limit} blocks")]
    SizeExceedsLimit { size: usize, limit: usize },

    #[error("Insufficient space: needed {needed} blocks, {available} free")]
    InsufficientSpace { needed: usize, available: usize },

    #[error(
        "Insufficient contiguous space: needed a run of {needed} blocks, \
         largest free run is {largest_run} ({total_free} blocks free in total)"
    )]
    InsufficientContiguousSpace {
        needed: usize,
        largest_run: usize,
        total_free: usize,
    },

    #[error("Device invariant violated: {0}")]
    Device(#[from] DeviceError),
}

/// Errors returned by file deletion.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeletionError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Malformed chain for file '{name}': visited {visited} blocks, expected {expected}")]
    CorruptChain {
        name: String,
        visited: usize,
        expected: usize,
    },

    #[error("Device invariant violated: {0}")]
    Device(#[from] DeviceError),
}
