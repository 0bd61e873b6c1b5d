//! Simulator facade
//!
//! High-level API for the allocation simulator: create and delete simulated
//! files, reset the device, and derive read-only views (stats, per-file
//! description, fragmentation, chain listing, block map) for a UI to render.
//!
//! The simulator owns one [`Device`] and one [`Catalog`] and keeps them in
//! agreement: every create/delete either fully succeeds or leaves both
//! untouched.

use crate::alloc::{contiguous, indexed, linked, AllocationMethod};
use crate::catalog::{Catalog, FileLayout, FileRecord};
use crate::device::{BlockRole, Device, NextPointer};
use crate::error::{AllocationError, DeletionError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Device size used by [`Simulator::default`].
pub const DEFAULT_DEVICE_BLOCKS: usize = 100;

/// Simulated block size, presentation only (byte sizes in [`FileDescription`]).
pub const BLOCK_SIZE_BYTES: usize = 512;

/// Default per-file cap in blocks.
pub const DEFAULT_MAX_FILE_BLOCKS: usize = 100;

/// Simulator policy knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Per-file size cap in blocks; `None` disables the cap.
    pub max_file_blocks: Option<usize>,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            max_file_blocks: Some(DEFAULT_MAX_FILE_BLOCKS),
        }
    }
}

/// Device occupancy counters. `used + free == total` always.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStats {
    pub total: usize,
    pub used: usize,
    pub free: usize,
}

/// Compact per-file summary, returned by [`Simulator::create`] and
/// [`Simulator::files`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSummary {
    pub name: String,
    pub method: AllocationMethod,
    /// Size in data blocks.
    pub size: usize,
    /// Data blocks in allocation order.
    pub blocks: Vec<usize>,
    /// Index block, for indexed files.
    pub index_block: Option<usize>,
}

/// Full per-file view for rendering or printing, the material behind a
/// `stat`-style report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescription {
    pub name: String,
    pub method: AllocationMethod,
    pub size_blocks: usize,
    pub size_bytes: usize,
    pub layout: FileLayout,
    pub first_block: Option<usize>,
    pub last_block: Option<usize>,
    /// `(from, to)` FAT pointer pairs, for linked files.
    pub fat_links: Option<Vec<(usize, usize)>>,
    /// Index block, for indexed files.
    pub index_block: Option<usize>,
    /// Number of entries in the index block, for indexed files.
    pub index_entries: Option<usize>,
    /// Rounded fragmentation percentage of the data-block layout.
    pub fragmentation_pct: u8,
}

/// Render view of one block, for drawing the device grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockView {
    pub index: usize,
    /// Owning file name, if occupied.
    pub file: Option<String>,
    /// Data or index block, if occupied.
    pub role: Option<BlockRole>,
    /// FAT entry of this block.
    pub next: NextPointer,
}

/// Disk-space allocation simulator.
///
/// Owns the block device and the file catalog; single-threaded by design
/// (`&mut self` for the two write operations, `&self` for every query).
/// Multiple independent simulators can coexist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Simulator {
    device: Device,
    catalog: Catalog,
    config: SimConfig,
}

impl Default for Simulator {
    fn default() -> Self {
        Simulator::new(DEFAULT_DEVICE_BLOCKS)
    }
}

impl Simulator {
    /// Create a simulator over an all-free device of `num_blocks` blocks.
    pub fn new(num_blocks: usize) -> Self {
        Simulator::with_config(num_blocks, SimConfig::default())
    }

    /// Create a simulator with explicit policy.
    pub fn with_config(num_blocks: usize, config: SimConfig) -> Self {
        Simulator {
            device: Device::new(num_blocks),
            catalog: Catalog::new(),
            config,
        }
    }

    /// Read-only view of the device state.
    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Create a file of `size` blocks using `method`.
    ///
    /// On success the catalog gains exactly one record and the device claims
    /// exactly the blocks of the returned summary; on failure neither
    /// changes.
    pub fn create(
        &mut self,
        name: &str,
        size: usize,
        method: AllocationMethod,
    ) -> Result<FileSummary, AllocationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AllocationError::InvalidName);
        }
        if self.catalog.contains(name) {
            return Err(AllocationError::DuplicateName(name.to_string()));
        }
        if size == 0 {
            return Err(AllocationError::InvalidSize(size));
        }
        if let Some(limit) = self.config.max_file_blocks {
            if size > limit {
                return Err(AllocationError::SizeExceedsLimit { size, limit });
            }
        }

        let layout = match method {
            AllocationMethod::Contiguous => contiguous::allocate(&mut self.device, name, size)?,
            AllocationMethod::Linked => linked::allocate(&mut self.device, name, size)?,
            AllocationMethod::Indexed => indexed::allocate(&mut self.device, name, size)?,
        };

        let record = FileRecord::new(name, size, layout);
        let summary = summary_of(&record);
        debug!(file = name, %method, size, "Created file");
        self.catalog.insert(record);
        Ok(summary)
    }

    /// Delete a file and return all its blocks to the free pool.
    ///
    /// Clears the file's FAT entries (linked) and index-table entry
    /// (indexed); no bookkeeping referencing the file survives.
    pub fn delete(&mut self, name: &str) -> Result<(), DeletionError> {
        let record = self
            .catalog
            .remove(name)
            .ok_or_else(|| DeletionError::NotFound(name.to_string()))?;

        match &record.layout {
            FileLayout::Contiguous { start, len } => {
                for idx in *start..*start + *len {
                    self.device.release(idx)?;
                }
            }
            FileLayout::Linked { blocks } => {
                self.release_chain(&record, blocks)?;
            }
            FileLayout::Indexed {
                index_block,
                data_blocks,
            } => {
                for &idx in data_blocks {
                    self.device.release(idx)?;
                }
                self.device.release(*index_block)?;
                self.device.take_index_entry(*index_block);
            }
        }

        debug!(file = name, "Deleted file");
        Ok(())
    }

    /// Walk a linked file's chain via the FAT table, releasing each visited
    /// block and clearing its entry.
    ///
    /// The walk is bounded by the file's recorded size; a chain that
    /// terminates early, runs long, loops back on itself, or hits an unused
    /// entry is malformed.
    /// In that case the recorded blocks are reclaimed directly so the device
    /// stays consistent, and the defect is reported.
    fn release_chain(
        &mut self,
        record: &FileRecord,
        blocks: &[usize],
    ) -> Result<(), DeletionError> {
        let Some(&start) = blocks.first() else {
            return Ok(());
        };

        let mut current = start;
        let mut visited = 0usize;
        loop {
            // A block no longer owned by this file means the chain looped
            // back onto itself or wandered into foreign territory; both are
            // corruption, not device errors.
            if !self
                .device
                .owner(current)
                .is_some_and(|owner| owner.file == record.name)
            {
                return Err(self.corrupt_chain(record, blocks, visited));
            }
            let next = self.device.next(current)?;
            self.device.clear_next(current)?;
            self.device.release(current)?;
            visited += 1;
            match next {
                NextPointer::EndOfChain => break,
                NextPointer::Next(n) if visited < record.size => current = n,
                NextPointer::Next(_) | NextPointer::Unused => {
                    return Err(self.corrupt_chain(record, blocks, visited));
                }
            }
        }
        if visited != record.size {
            return Err(self.corrupt_chain(record, blocks, visited));
        }
        Ok(())
    }

    /// Reclaim a malformed linked file by its recorded block list and build
    /// the corresponding error.
    fn corrupt_chain(
        &mut self,
        record: &FileRecord,
        blocks: &[usize],
        visited: usize,
    ) -> DeletionError {
        warn!(
            file = %record.name,
            visited,
            expected = record.size,
            "Malformed FAT chain; reclaiming recorded blocks"
        );
        for &idx in blocks {
            if self
                .device
                .owner(idx)
                .is_some_and(|owner| owner.file == record.name)
            {
                if let Err(err) = self.device.release(idx) {
                    warn!(block = idx, %err, "Reclaim failed to release block");
                }
                if let Err(err) = self.device.clear_next(idx) {
                    warn!(block = idx, %err, "Reclaim failed to clear FAT entry");
                }
            }
        }
        DeletionError::CorruptChain {
            name: record.name.clone(),
            visited,
            expected: record.size,
        }
    }

    /// Reinitialize to an all-free device of `num_blocks` blocks and an
    /// empty catalog. Discards all files and bookkeeping; always succeeds.
    pub fn reset(&mut self, num_blocks: usize) {
        self.device = Device::new(num_blocks);
        self.catalog = Catalog::new();
        debug!(num_blocks, "Device formatted");
    }

    /// Occupancy counters.
    pub fn stats(&self) -> DeviceStats {
        DeviceStats {
            total: self.device.total_blocks(),
            used: self.device.occupied_count(),
            free: self.device.free_count(),
        }
    }

    /// Number of files in the catalog.
    pub fn file_count(&self) -> usize {
        self.catalog.len()
    }

    /// Catalog listing in name order.
    pub fn files(&self) -> Vec<FileSummary> {
        self.catalog.iter().map(summary_of).collect()
    }

    /// Full description of a file, or `None` if the name is unknown.
    pub fn describe(&self, name: &str) -> Option<FileDescription> {
        let record = self.catalog.get(name)?;
        let data = record.layout.data_blocks();

        let fat_links = match &record.layout {
            FileLayout::Linked { blocks } => {
                Some(blocks.windows(2).map(|w| (w[0], w[1])).collect())
            }
            _ => None,
        };
        let (index_block, index_entries) = match &record.layout {
            FileLayout::Indexed {
                index_block,
                data_blocks,
            } => (Some(*index_block), Some(data_blocks.len())),
            _ => (None, None),
        };

        Some(FileDescription {
            name: record.name.clone(),
            method: record.method,
            size_blocks: record.size,
            size_bytes: record.size * BLOCK_SIZE_BYTES,
            first_block: data.first().copied(),
            last_block: data.last().copied(),
            fragmentation_pct: fragmentation_percent(&data),
            layout: record.layout.clone(),
            fat_links,
            index_block,
            index_entries,
        })
    }

    /// Rounded fragmentation percentage of a file's data-block layout, or
    /// `None` if the name is unknown.
    ///
    /// Counts adjacent block pairs that are not consecutive indices, over
    /// `block_count - 1`; 0 for files of one block. Contiguous files are
    /// always 0%.
    pub fn fragmentation(&self, name: &str) -> Option<u8> {
        let record = self.catalog.get(name)?;
        Some(fragmentation_percent(&record.layout.data_blocks()))
    }

    /// Chain listing of a linked file, derived by walking the FAT table from
    /// the start block. `None` for unknown names and non-linked files.
    ///
    /// Always equals the stored block list on a consistent device.
    pub fn chain(&self, name: &str) -> Option<Vec<usize>> {
        let record = self.catalog.get(name)?;
        let FileLayout::Linked { blocks } = &record.layout else {
            return None;
        };
        let mut chain = Vec::with_capacity(record.size);
        let mut current = *blocks.first()?;
        loop {
            chain.push(current);
            match self.device.next(current).ok()? {
                // Bounded by the recorded size so a cycle cannot hang a read
                NextPointer::Next(n) if chain.len() < record.size => current = n,
                _ => break,
            }
        }
        Some(chain)
    }

    /// Per-block render view of the whole device.
    pub fn block_map(&self) -> Vec<BlockView> {
        (0..self.device.total_blocks())
            .map(|index| {
                let owner = self.device.owner(index);
                BlockView {
                    index,
                    file: owner.map(|o| o.file.clone()),
                    role: owner.map(|o| o.role),
                    next: self.device.next(index).unwrap_or_default(),
                }
            })
            .collect()
    }
}

fn summary_of(record: &FileRecord) -> FileSummary {
    let index_block = match &record.layout {
        FileLayout::Indexed { index_block, .. } => Some(*index_block),
        _ => None,
    };
    FileSummary {
        name: record.name.clone(),
        method: record.method,
        size: record.size,
        blocks: record.layout.data_blocks(),
        index_block,
    }
}

/// Share of adjacent block pairs that are not consecutive, as a rounded
/// percentage. Zero when there is no adjacent pair to compare.
fn fragmentation_percent(blocks: &[usize]) -> u8 {
    if blocks.len() <= 1 {
        return 0;
    }
    let gaps = blocks.windows(2).filter(|w| w[1] != w[0] + 1).count();
    ((gaps as f64 / (blocks.len() - 1) as f64) * 100.0).round() as u8
}
