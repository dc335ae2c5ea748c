//! Typed views into a mapped region.

use std::marker::PhantomData;
use std::ptr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU32};

use memmap2::MmapRaw;
use serde::{Deserialize, Serialize};

use crate::shared::SharedError;
use crate::shared::region::checked_len;

/// Element type of a shared array, as recorded in the region header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    /// Unsigned byte (board cells, flags).
    U8,
    /// Unsigned 32-bit integer, native endian (histories, balances).
    U32,
}

impl ElementType {
    /// Size of one element in bytes.
    #[must_use]
    pub const fn size(self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U32 => 4,
        }
    }
}

#[allow(unreachable_pub)]
mod sealed {
    pub trait Sealed {}
    impl Sealed for u8 {}
    impl Sealed for u32 {}
}

/// Element types that can live in a shared region.
pub trait Element: Copy + Default + sealed::Sealed + Send + Sync + 'static {
    /// Tag stored in the region header.
    const TYPE: ElementType;

    /// Atomic counterpart used for control words.
    type Atomic: Sync + 'static;

    /// View an element slot as an atomic.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid and aligned for `'a`.
    unsafe fn as_atomic<'a>(ptr: *mut Self) -> &'a Self::Atomic;
}

impl Element for u8 {
    const TYPE: ElementType = ElementType::U8;
    type Atomic = AtomicU8;

    unsafe fn as_atomic<'a>(ptr: *mut Self) -> &'a AtomicU8 {
        // SAFETY: Caller guarantees validity; u8 has alignment 1
        unsafe { AtomicU8::from_ptr(ptr) }
    }
}

impl Element for u32 {
    const TYPE: ElementType = ElementType::U32;
    type Atomic = AtomicU32;

    unsafe fn as_atomic<'a>(ptr: *mut Self) -> &'a AtomicU32 {
        // SAFETY: Caller guarantees validity and 4-byte alignment
        unsafe { AtomicU32::from_ptr(ptr) }
    }
}

/// A typed, shaped array inside a shared region.
///
/// Handles are cheap to clone and keep the mapping alive. Element reads and
/// writes, bulk copies included, are volatile since another process may be
/// touching the same bytes; control words go through [`SharedArray::atomic`].
#[derive(Debug, Clone)]
pub struct SharedArray<T: Element> {
    map: Arc<MmapRaw>,
    /// Byte offset of element 0 from the start of the mapping.
    offset: usize,
    shape: Vec<usize>,
    len: usize,
    _marker: PhantomData<T>,
}

impl<T: Element> SharedArray<T> {
    /// Wrap `shape` elements starting at `offset` bytes into `map`.
    pub(crate) fn new(map: Arc<MmapRaw>, offset: usize, shape: Vec<usize>) -> Result<Self, SharedError> {
        let oversized = || SharedError::Oversized(format!("array of shape {shape:?}"));
        let len = checked_len(&shape).ok_or_else(oversized)?;
        let end = len
            .checked_mul(T::TYPE.size())
            .and_then(|bytes| offset.checked_add(bytes))
            .ok_or_else(oversized)?;
        if end > map.len() {
            return Err(SharedError::Truncated {
                expected: end,
                actual: map.len() as u64,
            });
        }
        // Element sizes are powers of two
        if offset & (T::TYPE.size() - 1) != 0 {
            return Err(SharedError::Misaligned { offset });
        }
        Ok(Self {
            map,
            offset,
            shape,
            len,
            _marker: PhantomData,
        })
    }

    /// Number of elements.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the array has no elements.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Array shape, outermost dimension first.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Flat index of a multi-dimensional coordinate.
    #[must_use]
    pub fn index_of(&self, coords: &[usize]) -> Option<usize> {
        if coords.len() != self.shape.len() {
            return None;
        }
        coords
            .iter()
            .zip(&self.shape)
            .try_fold(0, |acc, (&c, &dim)| (c < dim).then_some(acc * dim + c))
    }

    fn base(&self) -> *mut T {
        // SAFETY: offset + len * size was checked against the mapping in new()
        unsafe { self.map.as_mut_ptr().add(self.offset).cast::<T>() }
    }

    fn check(&self, index: usize) -> Result<(), SharedError> {
        if index < self.len {
            Ok(())
        } else {
            Err(SharedError::OutOfRange { index, len: self.len })
        }
    }

    /// Read one element.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<T> {
        self.check(index).ok()?;
        // SAFETY: index is in bounds and the slot is aligned
        Some(unsafe { ptr::read_volatile(self.base().add(index)) })
    }

    /// Write one element.
    ///
    /// # Errors
    ///
    /// Returns [`SharedError::OutOfRange`] if `index` is past the end.
    pub fn set(&self, index: usize, value: T) -> Result<(), SharedError> {
        self.check(index)?;
        // SAFETY: index is in bounds and the slot is aligned
        unsafe { ptr::write_volatile(self.base().add(index), value) };
        Ok(())
    }

    /// Overwrite the whole array from `src`.
    ///
    /// # Errors
    ///
    /// Returns [`SharedError::LengthMismatch`] if `src` is not exactly `len()` long.
    pub fn write_from(&self, src: &[T]) -> Result<(), SharedError> {
        if src.len() != self.len {
            return Err(SharedError::LengthMismatch {
                expected: self.len,
                actual: src.len(),
            });
        }
        let base = self.base();
        for (i, &value) in src.iter().enumerate() {
            // SAFETY: i < len, and offset + len * size was checked in new()
            unsafe { ptr::write_volatile(base.add(i), value) };
        }
        Ok(())
    }

    /// Copy the whole array into `dst`.
    ///
    /// # Errors
    ///
    /// Returns [`SharedError::LengthMismatch`] if `dst` is not exactly `len()` long.
    pub fn read_into(&self, dst: &mut [T]) -> Result<(), SharedError> {
        if dst.len() != self.len {
            return Err(SharedError::LengthMismatch {
                expected: self.len,
                actual: dst.len(),
            });
        }
        let base = self.base();
        for (i, slot) in dst.iter_mut().enumerate() {
            // SAFETY: i < len, and offset + len * size was checked in new()
            *slot = unsafe { ptr::read_volatile(base.add(i)) };
        }
        Ok(())
    }

    /// Copy the whole array out.
    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        let mut out = vec![T::default(); self.len];
        // Lengths match by construction
        let _ = self.read_into(&mut out);
        out
    }

    /// Atomic view of one element.
    #[must_use]
    pub fn atomic(&self, index: usize) -> Option<&T::Atomic> {
        self.check(index).ok()?;
        // SAFETY: in bounds, aligned (offsets are aligned to the element size
        // and the mapping is page aligned) and borrowed no longer than self,
        // which keeps the mapping alive
        Some(unsafe { T::as_atomic(self.base().add(index)) })
    }
}
