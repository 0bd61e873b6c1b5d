//! FileSim - disk-space allocation simulator
//!
//! An educational model of the three classic file-allocation methods used
//! to teach operating-systems concepts:
//!
//! - **Contiguous**: a file occupies one unbroken run of blocks (first-fit,
//!   left-to-right scan) and demonstrates external fragmentation.
//! - **Linked (FAT)**: a file's blocks chain through a per-block
//!   next-pointer table; only total free space matters.
//! - **Indexed (inode)**: one index block lists the file's data blocks.
//!
//! The crate is the allocation core only; rendering, terminals and dialogs
//! are left to a UI collaborator that drives the [`Simulator`] API and reads
//! its derived views ([`Simulator::stats`], [`Simulator::describe`],
//! [`Simulator::block_map`]).
//!
//! ## Example
//!
//! ```rust
//! use filesim::{AllocationMethod, Simulator};
//!
//! let mut sim = Simulator::new(10);
//!
//! let file = sim.create("report", 4, AllocationMethod::Contiguous).unwrap();
//! assert_eq!(file.blocks, vec![0, 1, 2, 3]);
//!
//! let stats = sim.stats();
//! assert_eq!((stats.total, stats.used, stats.free), (10, 4, 6));
//!
//! assert_eq!(sim.fragmentation("report"), Some(0));
//!
//! sim.delete("report").unwrap();
//! assert_eq!(sim.stats().free, 10);
//! ```
//!
//! ## Guarantees
//!
//! After every successful operation:
//!
//! - each block is owned by at most one file, and is occupied iff some
//!   catalog record references it;
//! - file names are unique and each file's data-block count equals its size;
//! - an indexed file's index block never appears in its own data-block list;
//! - every allocate/delete is all-or-nothing - a failed call leaves device
//!   and catalog exactly as they were.
//!
//! State lives only for the process lifetime; there is no persistence and
//! no concurrency (the simulator is an owned value, `&mut self` to write).

pub mod alloc;
pub mod catalog;
pub mod device;
pub mod error;
pub mod simulator;


// Re-export commonly used types
pub use alloc::{AllocationMethod, UnknownMethod};
pub use catalog::{Catalog, FileLayout, FileRecord};
pub use device::{BlockOwner, BlockRole, Device, NextPointer};
pub use error::{AllocationError, DeletionError, DeviceError};
pub use simulator::{
    BlockView, DeviceStats, FileDescription, FileSummary, SimConfig, Simulator,
    BLOCK_SIZE_BYTES, DEFAULT_DEVICE_BLOCKS, DEFAULT_MAX_FILE_BLOCKS,
};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
