//! File-backed mapping with a self-describing header.
//!
//! Layout on disk:
//!
//! ```text
//! ┌──────────┬─────────┬─────────┬──────────────┬─────────────┬─────────┬──────┐
//! │ "CHLR"   │ version │ 3 pad   │ json len u32 │ layout JSON │ padding │ data │
//! └──────────┴─────────┴─────────┴──────────────┴─────────────┴─────────┴──────┘
//! ```
//!
//! Data starts at the first 64-byte boundary after the JSON. Array offsets in
//! the layout are relative to the start of the data.

use std::fs::{self, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use memmap2::MmapRaw;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::shared::{Element, ElementType, SharedArray, SharedError};

/// Magic bytes for file format identification.
const MAGIC: &[u8; 4] = b"CHLR";

/// Current format version.
const VERSION: u8 = 1;

/// Magic, version, padding and JSON length.
const FIXED_HEADER: usize = 12;

/// Alignment of the data section and of every array in it.
const ALIGN: usize = 64;

const fn align_up(n: usize) -> usize {
    n.div_ceil(ALIGN) * ALIGN
}

/// Placement of one array inside the data section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrayLayout {
    /// Lookup name.
    pub name: String,
    /// Element type.
    pub element: ElementType,
    /// Shape, outermost dimension first.
    pub shape: Vec<usize>,
    /// Byte offset from the start of the data section.
    pub offset: usize,
}

impl ArrayLayout {
    /// Number of elements, or `None` if the shape overflows.
    #[must_use]
    pub fn len(&self) -> Option<usize> {
        checked_len(&self.shape)
    }

    /// Whether the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.contains(&0)
    }

    /// Size in bytes, or `None` if it overflows.
    #[must_use]
    pub fn byte_len(&self) -> Option<usize> {
        self.len()?.checked_mul(self.element.size())
    }

    /// Offset one past the last byte, or `None` if it overflows.
    #[must_use]
    pub fn end(&self) -> Option<usize> {
        self.offset.checked_add(self.byte_len()?)
    }
}

/// Product of `shape`, or `None` on overflow.
pub(crate) fn checked_len(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
}

/// Named arrays making up a region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionLayout {
    arrays: Vec<ArrayLayout>,
}

impl RegionLayout {
    /// Empty layout.
    #[must_use]
    pub const fn new() -> Self {
        Self { arrays: Vec::new() }
    }

    /// Append an array, aligned after the previous one.
    ///
    /// Sizes are not checked here; [`SharedRegion::create`] rejects a layout
    /// that overflows.
    #[must_use]
    pub fn with_array(mut self, name: &str, element: ElementType, shape: &[usize]) -> Self {
        let offset = self
            .data_len()
            .ok()
            .and_then(|len| len.checked_next_multiple_of(ALIGN))
            .unwrap_or(usize::MAX);
        self.arrays.push(ArrayLayout {
            name: name.to_string(),
            element,
            shape: shape.to_vec(),
            offset,
        });
        self
    }

    /// Arrays in declaration order.
    #[must_use]
    pub fn arrays(&self) -> &[ArrayLayout] {
        &self.arrays
    }

    /// Look up an array by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ArrayLayout> {
        self.arrays.iter().find(|a| a.name == name)
    }

    /// Bytes needed for the data section.
    ///
    /// # Errors
    ///
    /// Returns [`SharedError::Oversized`] if an array's extent overflows.
    pub fn data_len(&self) -> Result<usize, SharedError> {
        self.arrays.iter().try_fold(0, |len, a| {
            a.end()
                .map(|end| len.max(end))
                .ok_or_else(|| SharedError::Oversized(a.name.clone()))
        })
    }

    /// Total file size for a data section starting at `data_start`.
    fn total_len(&self, data_start: usize) -> Result<usize, SharedError> {
        data_start
            .checked_add(self.data_len()?)
            .ok_or_else(|| SharedError::Oversized("data section".to_string()))
    }
}

/// A mapped region shared between a writer and any number of readers.
#[derive(Debug)]
pub struct SharedRegion {
    path: PathBuf,
    map: Arc<MmapRaw>,
    layout: RegionLayout,
    /// Byte offset of the data section.
    data_start: usize,
}

impl SharedRegion {
    /// Create (or truncate) the file at `path` and map it with `layout`.
    ///
    /// The data section starts zeroed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or mapped.
    pub fn create(path: &Path, layout: RegionLayout) -> Result<Self, SharedError> {
        let json = serde_json::to_vec(&layout)?;
        let json_len = u32::try_from(json.len()).map_err(|_| SharedError::HeaderTooLarge(json.len()))?;
        let data_start = align_up(FIXED_HEADER + json.len());
        let total = layout.total_len(data_start)?;

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.write_all(MAGIC)?;
        file.write_all(&[VERSION, 0, 0, 0])?;
        file.write_all(&json_len.to_le_bytes())?;
        file.write_all(&json)?;
        file.set_len(total as u64)?;

        let map = MmapRaw::map_raw(&file)?;
        debug!(path = %path.display(), bytes = total, "created shared region");
        Ok(Self {
            path: path.to_path_buf(),
            map: Arc::new(map),
            layout,
            data_start,
        })
    }

    /// Map an existing region, reading its layout from the header.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, has the wrong magic or
    /// version, or is shorter than its layout says.
    pub fn attach(path: &Path) -> Result<Self, SharedError> {
        let mut file = OpenOptions::new().read(true).write(true).open(path)?;

        let mut fixed = [0u8; FIXED_HEADER];
        file.read_exact(&mut fixed)?;
        if &fixed[..4] != MAGIC {
            return Err(SharedError::BadMagic);
        }
        if fixed[4] != VERSION {
            return Err(SharedError::UnsupportedVersion(fixed[4]));
        }
        let json_len = u32::from_le_bytes([fixed[8], fixed[9], fixed[10], fixed[11]]) as usize;
        let actual = file.metadata()?.len();
        if actual < (FIXED_HEADER + json_len) as u64 {
            return Err(SharedError::Truncated {
                expected: FIXED_HEADER + json_len,
                actual,
            });
        }

        let mut json = vec![0u8; json_len];
        file.read_exact(&mut json)?;
        let layout: RegionLayout = serde_json::from_slice(&json)?;

        let data_start = align_up(FIXED_HEADER + json_len);
        let expected = layout.total_len(data_start)?;
        if actual < expected as u64 {
            return Err(SharedError::Truncated { expected, actual });
        }

        let map = MmapRaw::map_raw(&file)?;
        debug!(path = %path.display(), arrays = layout.arrays.len(), "attached shared region");
        Ok(Self {
            path: path.to_path_buf(),
            map: Arc::new(map),
            layout,
            data_start,
        })
    }

    /// Backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Layout read from or written to the header.
    #[must_use]
    pub const fn layout(&self) -> &RegionLayout {
        &self.layout
    }

    /// Typed handle to the array called `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if there is no such array or it holds another type.
    pub fn array<T: Element>(&self, name: &str) -> Result<SharedArray<T>, SharedError> {
        let entry = self
            .layout
            .get(name)
            .ok_or_else(|| SharedError::MissingArray(name.to_string()))?;
        if entry.element != T::TYPE {
            return Err(SharedError::ElementMismatch {
                name: name.to_string(),
                expected: T::TYPE,
                found: entry.element,
            });
        }
        SharedArray::new(
            Arc::clone(&self.map),
            self.data_start + entry.offset,
            entry.shape.clone(),
        )
    }

    /// Flush the mapping to its file.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush fails.
    pub fn flush(&self) -> Result<(), SharedError> {
        self.map.flush()?;
        Ok(())
    }

    /// Unmap and delete the backing file.
    ///
    /// Handles obtained from [`SharedRegion::array`] stay valid until dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be removed.
    pub fn remove(self) -> Result<(), SharedError> {
        let path = self.path;
        drop(self.map);
        fs::remove_file(&path)?;
        Ok(())
    }
}
