//! File catalog
//!
//! Maps file names to their records: chosen allocation method, requested
//! size, and the block layout produced by the allocator.

use crate::alloc::AllocationMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Method-specific block layout of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind")]
pub enum FileLayout {
    /// One unbroken run of `len` blocks starting at `start`.
    Contiguous { start: usize, len: usize },
    /// FAT chain; `blocks` is the chain in allocation order, the first
    /// element being the start block.
    Linked { blocks: Vec<usize> },
    /// Index block plus the data blocks it lists, in allocation order.
    Indexed {
        index_block: usize,
        data_blocks: Vec<usize>,
    },
}

impl FileLayout {
    /// Allocation method this layout belongs to.
    pub fn method(&self) -> AllocationMethod {
        match self {
            FileLayout::Contiguous { .. } => AllocationMethod::Contiguous,
            FileLayout::Linked { .. } => AllocationMethod::Linked,
            FileLayout::Indexed { .. } => AllocationMethod::Indexed,
        }
    }

    /// Data blocks in allocation order (excludes the index block).
    pub fn data_blocks(&self) -> Vec<usize> {
        match self {
            FileLayout::Contiguous { start, len } => (*start..*start + *len).collect(),
            FileLayout::Linked { blocks } => blocks.clone(),
            FileLayout::Indexed { data_blocks, .. } => data_blocks.clone(),
        }
    }

    /// Every block the file occupies, index block included.
    pub fn all_blocks(&self) -> Vec<usize> {
        match self {
            FileLayout::Indexed {
                index_block,
                data_blocks,
            } => {
                let mut all = Vec::with_capacity(data_blocks.len() + 1);
                all.push(*index_block);
                all.extend_from_slice(data_blocks);
                all
            }
            _ => self.data_blocks(),
        }
    }

    /// First data block, if any.
    pub fn first_block(&self) -> Option<usize> {
        self.data_blocks().first().copied()
    }

    /// Last data block, if any.
    pub fn last_block(&self) -> Option<usize> {
        self.data_blocks().last().copied()
    }
}

/// Catalog entry for one simulated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Unique file name.
    pub name: String,
    /// Requested size in data blocks.
    pub size: usize,
    /// Allocation method used.
    pub method: AllocationMethod,
    /// Block layout produced by the allocator.
    pub layout: FileLayout,
}

impl FileRecord {
    pub fn new(name: impl Into<String>, size: usize, layout: FileLayout) -> Self {
        let method = layout.method();
        FileRecord {
            name: name.into(),
            size,
            method,
            layout,
        }
    }
}

/// Name -> record mapping; names are unique keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    files: BTreeMap<String, FileRecord>,
}

impl Catalog {
    pub fn new() -> Self {
        Catalog::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&FileRecord> {
        self.files.get(name)
    }

    /// Insert a record under its name. The caller checks for duplicates
    /// before allocating, so an existing entry is never silently replaced.
    pub fn insert(&mut self, record: FileRecord) {
        self.files.insert(record.name.clone(), record);
    }

    pub fn remove(&mut self, name: &str) -> Option<FileRecord> {
        self.files.remove(name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Records in name order.
    pub fn iter(&self) -> impl Iterator<Item = &FileRecord> {
        self.files.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_layout_blocks() {
        let layout = FileLayout::Contiguous { start: 3, len: 4 };
        assert_eq!(layout.data_blocks(), vec![3, 4, 5, 6]);
        assert_eq!(layout.all_blocks(), vec![3, 4, 5, 6]);
        assert_eq!(layout.first_block(), Some(3));
        assert_eq!(layout.last_block(), Some(6));
        assert_eq!(layout.method(), AllocationMethod::Contiguous);
    }

    #[test]
    fn test_indexed_layout_includes_index_block() {
        let layout = FileLayout::Indexed {
            index_block: 0,
            data_blocks: vec![1, 2, 3],
        };
        assert_eq!(layout.data_blocks(), vec![1, 2, 3]);
        assert_eq!(layout.all_blocks(), vec![0, 1, 2, 3]);
        assert_eq!(layout.method(), AllocationMethod::Indexed);
    }

    #[test]
    fn test_catalog_insert_get_remove() {
        let mut catalog = Catalog::new();
        assert!(catalog.is_empty());

        catalog.insert(FileRecord::new(
            "report",
            2,
            FileLayout::Linked { blocks: vec![5, 9] },
        ));
        assert!(catalog.contains("report"));
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("report").unwrap().size, 2);

        let record = catalog.remove("report").unwrap();
        assert_eq!(record.method, AllocationMethod::Linked);
        assert!(!catalog.contains("report"));
    }

    #[test]
    fn test_catalog_iterates_in_name_order() {
        let mut catalog = Catalog::new();
        for name in ["zeta", "alpha", "mid"] {
            catalog.insert(FileRecord::new(
                name,
                1,
                FileLayout::Contiguous { start: 0, len: 1 },
            ));
        }
        let names: Vec<&str> = catalog.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_record_serialization() {
        let record = FileRecord::new(
            "notes",
            3,
            FileLayout::Indexed {
                index_block: 7,
                data_blocks: vec![8, 9, 10],
            },
        );
        let json = serde_json::to_string(&record).unwrap();
        let back: FileRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
