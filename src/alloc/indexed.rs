//! Indexed (inode) allocation
//!
//! One index block holds the list of data blocks, so the file needs
//! `size + 1` free blocks in total. The index block is the lowest free
//! block; the data-block search then continues forward from it (wrapping),
//! the same search the linked allocator uses.

use super::find_free_from;
use crate::catalog::FileLayout;
use crate::device::{BlockOwner, BlockRole, Device};
use crate::error::AllocationError;
use tracing::warn;

/// Claim one index block plus `size` data blocks for `name` and record the
/// index-table entry.
///
/// All-or-nothing: if a data block cannot be found mid-allocation (the
/// up-front check makes this unreachable, but it is handled anyway), every
/// block claimed so far is released before the error is returned.
pub(crate) fn allocate(
    device: &mut Device,
    name: &str,
    size: usize,
) -> Result<FileLayout, AllocationError> {
    let needed = size + 1;
    let free = device.free_count();
    if free < needed {
        return Err(AllocationError::InsufficientSpace {
            needed,
            available: free,
        });
    }

    let index_block = match find_free_from(device, 0) {
        Some(idx) => idx,
        None => {
            return Err(AllocationError::InsufficientSpace {
                needed,
                available: 0,
            })
        }
    };
    device.claim(
        index_block,
        BlockOwner {
            file: name.to_string(),
            role: BlockRole::Index,
        },
    )?;

    let mut data_blocks = Vec::with_capacity(size);
    let mut cursor = index_block + 1;
    for _ in 0..size {
        let Some(idx) = find_free_from(device, cursor) else {
            unwind(device, index_block, &data_blocks);
            warn!(
                file = name,
                claimed = data_blocks.len(),
                requested = size,
                "Indexed allocation ran out of blocks mid-way; unwound"
            );
            return Err(AllocationError::InsufficientSpace {
                needed,
                available: device.free_count(),
            });
        };
        device.claim(
            idx,
            BlockOwner {
                file: name.to_string(),
                role: BlockRole::Data,
            },
        )?;
        data_blocks.push(idx);
        cursor = idx + 1;
    }

    device.set_index_entry(index_block, data_blocks.clone());

    Ok(FileLayout::Indexed {
        index_block,
        data_blocks,
    })
}

/// Release the index block and any data blocks claimed before a failure.
fn unwind(device: &mut Device, index_block: usize, data_blocks: &[usize]) {
    for &idx in data_blocks {
        if let Err(err) = device.release(idx) {
            warn!(block = idx, %err, "Unwind failed to release data block");
        }
    }
    if let Err(err) = device.release(index_block) {
        warn!(block = index_block, %err, "Unwind failed to release index block");
    }
}
