//! Block device state
//!
//! Holds the fixed-length block array plus the two auxiliary tables used by
//! the allocation methods: the FAT next-pointer table (linked allocation)
//! and the index table (indexed allocation).
//!
//! Only primitive queries and mutators live here; the allocation and
//! deletion algorithms in [`crate::alloc`] and [`crate::simulator`] are the
//! sole callers of the mutators. `claim` and `release` reject double-claims
//! and double-releases so allocator bugs surface immediately instead of
//! corrupting the bookkeeping.

use crate::error::DeviceError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Role a block plays within its owning file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockRole {
    /// Holds file content.
    Data,
    /// Holds the list of data blocks of an indexed file.
    Index,
}

/// Ownership record for an occupied block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockOwner {
    /// Name of the owning file.
    pub file: String,
    /// Data or index block.
    pub role: BlockRole,
}

/// FAT next-pointer entry.
///
/// An explicit tri-state instead of the classic overloaded integer sentinels
/// (`0` = unused, `-1` = end-of-chain), so block 0 can appear as a chain
/// target without ambiguity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NextPointer {
    /// Block is not part of any chain.
    #[default]
    Unused,
    /// Chain continues at the given block.
    Next(usize),
    /// Last block of its chain.
    EndOfChain,
}

/// Fixed-size simulated block device.
///
/// Blocks are identified by zero-based index. Each block is either free or
/// owned by exactly one file; `free_count` is kept incrementally so queries
/// never rescan the array.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    /// Per-block ownership; `None` means free.
    blocks: Vec<Option<BlockOwner>>,

    /// FAT next-pointer table, parallel to `blocks`.
    next_table: Vec<NextPointer>,

    /// Index-block -> ordered data blocks, for indexed files.
    /// BTreeMap keeps iteration deterministic for rendering.
    index_table: BTreeMap<usize, Vec<usize>>,

    /// Number of free blocks (cached).
    free_count: usize,
}

impl Device {
    /// Create an all-free device with `total_blocks` blocks.
    pub fn new(total_blocks: usize) -> Self {
        Device {
            blocks: vec![None; total_blocks],
            next_table: vec![NextPointer::Unused; total_blocks],
            index_table: BTreeMap::new(),
            free_count: total_blocks,
        }
    }

    /// Total number of blocks on the device.
    pub fn total_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Number of free blocks.
    pub fn free_count(&self) -> usize {
        self.free_count
    }

    /// Number of occupied blocks.
    pub fn occupied_count(&self) -> usize {
        self.blocks.len() - self.free_count
    }

    /// Check whether block `idx` is free. Out-of-range indices report
    /// not-free so scans cannot wander off the device.
    pub fn is_free(&self, idx: usize) -> bool {
        matches!(self.blocks.get(idx), Some(None))
    }

    /// Ownership record of block `idx`, if occupied.
    pub fn owner(&self, idx: usize) -> Option<&BlockOwner> {
        self.blocks.get(idx).and_then(|b| b.as_ref())
    }

    /// Mark block `idx` as owned.
    ///
    /// Fails if the index is out of range or the block is already occupied.
    pub fn claim(&mut self, idx: usize, owner: BlockOwner) -> Result<(), DeviceError> {
        let slot = self
            .blocks
            .get_mut(idx)
            .ok_or(DeviceError::OutOfRange(idx))?;
        if slot.is_some() {
            return Err(DeviceError::AlreadyOccupied(idx));
        }
        *slot = Some(owner);
        self.free_count -= 1;
        Ok(())
    }

    /// Return block `idx` to the free pool.
    ///
    /// Fails if the index is out of range or the block is already free.
    pub fn release(&mut self, idx: usize) -> Result<(), DeviceError> {
        let slot = self
            .blocks
            .get_mut(idx)
            .ok_or(DeviceError::OutOfRange(idx))?;
        if slot.is_none() {
            return Err(DeviceError::AlreadyFree(idx));
        }
        *slot = None;
        self.free_count += 1;
        Ok(())
    }

    /// Read the FAT entry of block `idx`.
    pub fn next(&self, idx: usize) -> Result<NextPointer, DeviceError> {
        self.next_table
            .get(idx)
            .copied()
            .ok_or(DeviceError::OutOfRange(idx))
    }

    /// Write the FAT entry of block `idx`.
    pub fn set_next(&mut self, idx: usize, ptr: NextPointer) -> Result<(), DeviceError> {
        let entry = self
            .next_table
            .get_mut(idx)
            .ok_or(DeviceError::OutOfRange(idx))?;
        *entry = ptr;
        Ok(())
    }

    /// Reset the FAT entry of block `idx` to `Unused`.
    pub fn clear_next(&mut self, idx: usize) -> Result<(), DeviceError> {
        self.set_next(idx, NextPointer::Unused)
    }

    /// Record the data blocks listed by index block `index_block`.
    pub fn set_index_entry(&mut self, index_block: usize, data_blocks: Vec<usize>) {
        self.index_table.insert(index_block, data_blocks);
    }

    /// Data blocks listed by index block `index_block`, if present.
    pub fn index_entry(&self, index_block: usize) -> Option<&[usize]> {
        self.index_table.get(&index_block).map(Vec::as_slice)
    }

    /// Remove and return the index-table entry for `index_block`.
    pub fn take_index_entry(&mut self, index_block: usize) -> Option<Vec<usize>> {
        self.index_table.remove(&index_block)
    }

    /// Number of entries in the index table.
    pub fn index_entry_count(&self) -> usize {
        self.index_table.len()
    }

    /// Iterate over occupied block indices.
    pub fn occupied_blocks(&self) -> impl Iterator<Item = usize> + '_ {
        self.blocks
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_some())
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(file: &str) -> BlockOwner {
        BlockOwner {
            file: file.to_string(),
            role: BlockRole::Data,
        }
    }

    #[test]
    fn test_new_device_all_free() {
        let dev = Device::new(10);
        assert_eq!(dev.total_blocks(), 10);
        assert_eq!(dev.free_count(), 10);
        assert_eq!(dev.occupied_count(), 0);
        assert!((0..10).all(|i| dev.is_free(i)));
    }

    #[test]
    fn test_claim_and_release() {
        let mut dev = Device::new(4);
        dev.claim(2, owner("a")).unwrap();
        assert!(!dev.is_free(2));
        assert_eq!(dev.free_count(), 3);
        assert_eq!(dev.owner(2).unwrap().file, "a");

        dev.release(2).unwrap();
        assert!(dev.is_free(2));
        assert_eq!(dev.free_count(), 4);
        assert!(dev.owner(2).is_none());
    }

    #[test]
    fn test_double_claim_rejected() {
        let mut dev = Device::new(4);
        dev.claim(1, owner("a")).unwrap();
        let err = dev.claim(1, owner("b")).unwrap_err();
        assert_eq!(err, DeviceError::AlreadyOccupied(1));
        // First owner untouched
        assert_eq!(dev.owner(1).unwrap().file, "a");
        assert_eq!(dev.free_count(), 3);
    }

    #[test]
    fn test_double_release_rejected() {
        let mut dev = Device::new(4);
        dev.claim(0, owner("a")).unwrap();
        dev.release(0).unwrap();
        assert_eq!(dev.release(0).unwrap_err(), DeviceError::AlreadyFree(0));
        assert_eq!(dev.free_count(), 4);
    }

    #[test]
    fn test_out_of_range() {
        let mut dev = Device::new(4);
        assert_eq!(
            dev.claim(4, owner("a")).unwrap_err(),
            DeviceError::OutOfRange(4)
        );
        assert_eq!(dev.release(99).unwrap_err(), DeviceError::OutOfRange(99));
        assert_eq!(dev.next(4).unwrap_err(), DeviceError::OutOfRange(4));
        assert!(!dev.is_free(4));
    }

    #[test]
    fn test_next_table_roundtrip() {
        let mut dev = Device::new(4);
        assert_eq!(dev.next(3).unwrap(), NextPointer::Unused);
        dev.set_next(3, NextPointer::Next(0)).unwrap();
        assert_eq!(dev.next(3).unwrap(), NextPointer::Next(0));
        dev.clear_next(3).unwrap();
        assert_eq!(dev.next(3).unwrap(), NextPointer::Unused);
    }

    #[test]
    fn test_index_table_roundtrip() {
        let mut dev = Device::new(8);
        dev.set_index_entry(0, vec![1, 2, 3]);
        assert_eq!(dev.index_entry(0).unwrap(), &[1, 2, 3]);
        assert_eq!(dev.index_entry_count(), 1);
        assert_eq!(dev.take_index_entry(0).unwrap(), vec![1, 2, 3]);
        assert!(dev.index_entry(0).is_none());
        assert_eq!(dev.index_entry_count(), 0);
    }
}
