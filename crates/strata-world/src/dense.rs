//! Dense per-chunk component arrays
//!
//! A `ChunkArray<T>` holds one `T` for each of the 4096 cells of a chunk and
//! lives as a component on the chunk entity. A slot equal to `T::default()`
//! reads as absent, so writing the default and clearing a slot are the same
//! operation.

use std::fmt;

use strata_core::{BlockPos, CHUNK_BITS, CHUNK_MASK, CHUNK_SIZE, CHUNK_VOLUME};
use strata_ecs::Component;

use crate::error::WorldError;

/// Component types that can be stored densely: plain copyable values with a
/// default that stands for "nothing here".
pub trait DenseValue: Component + Copy + Default + PartialEq {}

impl<T: Component + Copy + Default + PartialEq> DenseValue for T {}

/// Fixed array of one component type for every cell in a chunk.
#[derive(Clone)]
pub struct ChunkArray<T> {
    values: Box<[T]>,
    non_default: usize,
}

/// Slot index of a chunk-relative position: `x | y << 4 | z << 8`.
///
/// Range is only checked in debug builds. In release builds an out-of-range
/// position either panics on the slice access or lands on another cell.
#[inline]
fn index(rel: BlockPos) -> usize {
    debug_assert!(rel.is_chunk_rel(), "{rel} is not chunk-relative");
    (rel.x | (rel.y << CHUNK_BITS) | (rel.z << (2 * CHUNK_BITS))) as usize
}

fn position(index: usize) -> BlockPos {
    let index = index as i32;
    BlockPos::new(
        index & CHUNK_MASK,
        (index >> CHUNK_BITS) & CHUNK_MASK,
        index >> (2 * CHUNK_BITS),
    )
}

fn check_range(rel: BlockPos) -> Result<(), WorldError> {
    for (axis, value) in [('x', rel.x), ('y', rel.y), ('z', rel.z)] {
        if !(0..CHUNK_SIZE).contains(&value) {
            return Err(WorldError::OutOfRange { axis, value });
        }
    }
    Ok(())
}

impl<T: DenseValue> ChunkArray<T> {
    pub fn new() -> Self {
        Self {
            values: vec![T::default(); CHUNK_VOLUME].into_boxed_slice(),
            non_default: 0,
        }
    }

    /// The value at `rel`, or `None` if the slot holds the default.
    pub fn get(&self, rel: BlockPos) -> Option<&T> {
        let value = &self.values[index(rel)];
        (*value != T::default()).then_some(value)
    }

    /// The raw slot at `rel`, default included.
    pub fn get_direct(&self, rel: BlockPos) -> T {
        self.values[index(rel)]
    }

    /// Write `value` at `rel` (`None` writes the default), returning the previous value.
    pub fn set(&mut self, rel: BlockPos, value: Option<T>) -> Option<T> {
        let previous = self.set_direct(rel, value.unwrap_or_default());
        (previous != T::default()).then_some(previous)
    }

    /// Write the raw slot at `rel`, returning the raw previous slot.
    pub fn set_direct(&mut self, rel: BlockPos, value: T) -> T {
        let slot = &mut self.values[index(rel)];
        let previous = std::mem::replace(slot, value);
        let default = T::default();
        match (previous == default, value == default) {
            (true, false) => self.non_default += 1,
            (false, true) => self.non_default -= 1,
            _ => {}
        }
        previous
    }

    /// `get` with the range check performed in every build.
    pub fn try_get(&self, rel: BlockPos) -> Result<Option<&T>, WorldError> {
        check_range(rel)?;
        Ok(self.get(rel))
    }

    /// `set` with the range check performed in every build.
    pub fn try_set(&mut self, rel: BlockPos, value: Option<T>) -> Result<Option<T>, WorldError> {
        check_range(rel)?;
        Ok(self.set(rel, value))
    }

    /// Number of slots not holding the default.
    pub fn non_default_count(&self) -> usize {
        self.non_default
    }

    /// Whether every slot holds the default.
    pub fn is_empty(&self) -> bool {
        self.non_default == 0
    }

    /// Iterate over the non-default slots as `(chunk-relative position, value)`.
    pub fn iter(&self) -> impl Iterator<Item = (BlockPos, &T)> + '_ {
        let default = T::default();
        self.values
            .iter()
            .enumerate()
            .filter(move |(_, value)| **value != default)
            .map(|(i, value)| (position(i), value))
    }

    /// Reset every slot to the default.
    pub fn clear(&mut self) {
        self.values.fill(T::default());
        self.non_default = 0;
    }
}

impl<T: DenseValue> Default for ChunkArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ChunkArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkArray")
            .field("type", &std::any::type_name::<T>())
            .field("non_default", &self.non_default)
            .finish()
    }
}
