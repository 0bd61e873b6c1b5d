//! Contiguous allocation
//!
//! First-fit: a strict left-to-right scan looking for the first run of
//! consecutive free blocks long enough for the request. No lookahead, no
//! best-fit - when several runs qualify, the lowest starting index wins.
//!
//! Failing with [`AllocationError::InsufficientContiguousSpace`] while total
//! free space would suffice is the point of this method: it demonstrates
//! external fragmentation.

use crate::catalog::FileLayout;
use crate::device::{BlockOwner, BlockRole, Device};
use crate::error::AllocationError;

/// Claim the first free run of `size` consecutive blocks for `name`.
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

    let mut run_start = 0;
    let mut run_len = 0;
    let mut largest_run = 0;
    let mut found: Option<usize> = None;

    for idx in 0..device.total_blocks() {
        if device.is_free(idx) {
            if run_len == 0 {
                run_start = idx;
            }
            run_len += 1;
            largest_run = largest_run.max(run_len);
            if run_len == size {
                found = Some(run_start);
                break;
            }
        } else {
            run_len = 0;
        }
    }

    let start = found.ok_or(AllocationError::InsufficientContiguousSpace {
        needed: size,
        largest_run,
        total_free: free,
    })?;

    for idx in start..start + size {
        device.claim(
            idx,
            BlockOwner {
                file: name.to_string(),
                role: BlockRole::Data,
            },
        )?;
    }

    Ok(FileLayout::Contiguous { start, len: size })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocates_lowest_run_first() {
        let mut dev = Device::new(10);
        let layout = allocate(&mut dev, "a", 5).unwrap();
        assert_eq!(layout, FileLayout::Contiguous { start: 0, len: 5 });
        assert_eq!(dev.free_count(), 5);
        assert_eq!(dev.owner(0).unwrap().file, "a");
        assert_eq!(dev.owner(4).unwrap().file, "a");
        assert!(dev.is_free(5));
    }

    #[test]
    fn test_run_scan_skips_occupied_gaps() {
        let mut dev = Device::new(10);
        allocate(&mut dev, "a", 2).unwrap(); // blocks 0-1
        allocate(&mut dev, "b", 3).unwrap(); // blocks 2-4
        let layout = allocate(&mut dev, "c", 4).unwrap();
        assert_eq!(layout, FileLayout::Contiguous { start: 5, len: 4 });
    }

    #[test]
    fn test_external_fragmentation_detected() {
        let mut dev = Device::new(10);
        allocate(&mut dev, "a", 4).unwrap(); // 0-3
        allocate(&mut dev, "b", 4).unwrap(); // 4-7
        // Free 0-3, leaving two free runs: 0-3 and 8-9 (6 blocks total)
        for idx in 0..4 {
            dev.release(idx).unwrap();
        }

        let err = allocate(&mut dev, "c", 5).unwrap_err();
        assert_eq!(
            err,
            AllocationError::InsufficientContiguousSpace {
                needed: 5,
                largest_run: 4,
                total_free: 6,
            }
        );
        // All-or-nothing: nothing was claimed
        assert_eq!(dev.free_count(), 6);
    }

    #[test]
    fn test_total_space_checked_first() {
        let mut dev = Device::new(4);
        allocate(&mut dev, "a", 3).unwrap();
        let err = allocate(&mut dev, "b", 2).unwrap_err();
        assert_eq!(
            err,
            AllocationError::InsufficientSpace {
                needed: 2,
                available: 1,
            }
        );
    }

    #[test]
    fn test_reuses_freed_hole() {
        let mut dev = Device::new(10);
        allocate(&mut dev, "a", 5).unwrap(); // 0-4
        allocate(&mut dev, "b", 5).unwrap(); // 5-9
        for idx in 0..5 {
            dev.release(idx).unwrap();
        }
        let layout = allocate(&mut dev, "c", 3).unwrap();
        assert_eq!(layout, FileLayout::Contiguous { start: 0, len: 3 });
    }
}
