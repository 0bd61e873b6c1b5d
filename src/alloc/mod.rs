//! Block allocation strategies
//!
//! One algorithm per classic file-allocation method:
//! - [`contiguous`] - first-fit run of consecutive blocks
//! - [`linked`] - FAT-style chain of arbitrary free blocks
//! - [`indexed`] - inode-style index block plus data blocks
//!
//! Each algorithm searches the device for sufficient free capacity and
//! claims blocks; it never touches the file catalog. Every allocation is
//! all-or-nothing: on failure the device is left exactly as it was.

pub mod contiguous;
pub mod indexed;
pub mod linked;

use crate::device::Device;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// File-allocation method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AllocationMethod {
    /// One unbroken run of blocks.
    Contiguous,
    /// FAT chain via per-block next pointers.
    Linked,
    /// One index block listing the data blocks.
    Indexed,
}

impl fmt::Display for AllocationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AllocationMethod::Contiguous => "contiguous",
            AllocationMethod::Linked => "linked",
            AllocationMethod::Indexed => "indexed",
        };
        f.write_str(name)
    }
}

impl FromStr for AllocationMethod {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "contiguous" => Ok(AllocationMethod::Contiguous),
            "linked" => Ok(AllocationMethod::Linked),
            "indexed" => Ok(AllocationMethod::Indexed),
            _ => Err(UnknownMethod(s.to_string())),
        }
    }
}

/// Parse error for [`AllocationMethod`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown allocation method: {0} (expected contiguous, linked or indexed)")]
pub struct UnknownMethod(pub String);

/// Find the first free block at or after `from`, wrapping around to block 0
/// at the device end. Returns `None` when the device has no free block.
///
/// Shared by the linked and indexed allocators: both resume the search just
/// past the most recently claimed block instead of restarting at 0, which
/// determines the block-selection order on a partially occupied device.
pub(crate) fn find_free_from(device: &Device, from: usize) -> Option<usize> {
    let total = device.total_blocks();
    if total == 0 {
        return None;
    }
    (0..total)
        .map(|offset| (from + offset) % total)
        .find(|&idx| device.is_free(idx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{BlockOwner, BlockRole};

    fn claim(dev: &mut Device, idx: usize) {
        dev.claim(
            idx,
            BlockOwner {
                file: "x".to_string(),
                role: BlockRole::Data,
            },
        )
        .unwrap();
    }

    #[test]
    fn test_method_parse_and_display() {
        for (text, method) in [
            ("contiguous", AllocationMethod::Contiguous),
            ("linked", AllocationMethod::Linked),
            ("indexed", AllocationMethod::Indexed),
        ] {
            assert_eq!(text.parse::<AllocationMethod>().unwrap(), method);
            assert_eq!(method.to_string(), text);
        }
        assert_eq!(
            "LINKED".parse::<AllocationMethod>().unwrap(),
            AllocationMethod::Linked
        );
        assert!("fat32".parse::<AllocationMethod>().is_err());
    }

    #[test]
    fn test_find_free_from_start() {
        let mut dev = Device::new(5);
        claim(&mut dev, 0);
        claim(&mut dev, 1);
        assert_eq!(find_free_from(&dev, 0), Some(2));
    }

    #[test]
    fn test_find_free_wraps_around() {
        let mut dev = Device::new(5);
        claim(&mut dev, 3);
        claim(&mut dev, 4);
        // Searching past the end wraps back to block 0
        assert_eq!(find_free_from(&dev, 3), Some(0));
        assert_eq!(find_free_from(&dev, 7), Some(2));
    }

    #[test]
    fn test_find_free_full_device() {
        let mut dev = Device::new(3);
        for i in 0..3 {
            claim(&mut dev, i);
        }
        assert_eq!(find_free_from(&dev, 0), None);
    }
}
