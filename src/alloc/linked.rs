//! Linked (FAT) allocation
//!
//! A file's blocks form a chain through the per-block next-pointer table;
//! the blocks themselves can live anywhere on the device. Only total free
//! capacity matters, so linked files are immune to external fragmentation.
//!
//! The free-block search resumes just past the previously claimed block and
//! wraps at the device end, matching the order a FAT driver would walk its
//! table.

use super::find_free_from;
use crate::catalog::FileLayout;
use crate::device::{BlockOwner, BlockRole, Device, NextPointer};
use crate::error::AllocationError;

/// Claim `size` free blocks for `name` and chain them in the FAT table.
///
/// The up-front free-count check makes the claim loop infallible, so no
/// partial chain can survive a failure.
pub(crate) fn allocate(
    device: &mut Device,
    name: &str,
    size: usize,
) -> Result<FileLayout, AllocationError> {
    let free = device.free_count();
    if free < size {
        return Err(AllocationError::InsufficientSpace {
            needed: size,
            available: free,
        });
    }

    let mut blocks = Vec::with_capacity(size);
    let mut cursor = 0;
    for _ in 0..size {
        // Cannot fail: free_count >= size and we claim one block per step.
        let idx = find_free_from(device, cursor)
            .ok_or(AllocationError::InsufficientSpace {
                needed: size,
                available: device.free_count(),
            })?;
        device.claim(
            idx,
            BlockOwner {
                file: name.to_string(),
                role: BlockRole::Data,
            },
        )?;
        if let Some(&prev) = blocks.last() {
            device.set_next(prev, NextPointer::Next(idx))?;
        }
        blocks.push(idx);
        cursor = idx + 1;
    }

    if let Some(&last) = blocks.last() {
        device.set_next(last, NextPointer::EndOfChain)?;
    }

    Ok(FileLayout::Linked { blocks })
}
