//! Core grid types used throughout the Strata engine

use std::fmt;
use std::ops::{Add, Neg, Sub};

use glam::IVec3;
use serde::{Deserialize, Serialize};

use crate::facing::Facing;

/// Number of bits of a block coordinate that address a cell inside its chunk.
pub const CHUNK_BITS: u32 = 4;
/// Edge length of a chunk, in blocks.
pub const CHUNK_SIZE: i32 = 1 << CHUNK_BITS;
/// Mask selecting the chunk-relative part of a block coordinate.
pub const CHUNK_MASK: i32 = CHUNK_SIZE - 1;
/// Number of cells in one chunk.
pub const CHUNK_VOLUME: usize = (CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE) as usize;

/// Position of a single block in the unbounded world grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub const ORIGIN: BlockPos = BlockPos::new(0, 0, 0);

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Offset this position by the given amounts on each axis.
    /// Coordinates wrap at the `i32` range.
    pub const fn offset(self, x: i32, y: i32, z: i32) -> Self {
        Self::new(
            self.x.wrapping_add(x),
            self.y.wrapping_add(y),
            self.z.wrapping_add(z),
        )
    }

    /// Move `distance` blocks in the direction of `facing`, wrapping like `offset`
    pub fn offset_facing(self, facing: Facing, distance: i32) -> Self {
        let (dx, dy, dz) = facing.offsets();
        self.offset(
            dx.wrapping_mul(distance),
            dy.wrapping_mul(distance),
            dz.wrapping_mul(distance),
        )
    }

    /// The chunk containing this block.
    ///
    /// Uses an arithmetic shift so negative coordinates floor towards
    /// negative infinity: block `-1` lives in chunk `-1`, not chunk `0`.
    pub const fn chunk_pos(self) -> ChunkPos {
        ChunkPos::new(
            self.x >> CHUNK_BITS,
            self.y >> CHUNK_BITS,
            self.z >> CHUNK_BITS,
        )
    }

    /// Position of this block relative to its chunk's origin; every axis is in `[0, 16)`.
    pub const fn chunk_rel(self) -> BlockPos {
        BlockPos::new(self.x & CHUNK_MASK, self.y & CHUNK_MASK, self.z & CHUNK_MASK)
    }

    /// Whether every axis lies inside a single chunk, i.e. in `[0, CHUNK_SIZE)`.
    pub const fn is_chunk_rel(self) -> bool {
        (self.x & !CHUNK_MASK) == 0 && (self.y & !CHUNK_MASK) == 0 && (self.z & !CHUNK_MASK) == 0
    }
}

impl Add for BlockPos {
    type Output = BlockPos;

    fn add(self, rhs: BlockPos) -> BlockPos {
        self.offset(rhs.x, rhs.y, rhs.z)
    }
}

impl Sub for BlockPos {
    type Output = BlockPos;

    fn sub(self, rhs: BlockPos) -> BlockPos {
        self.offset(-rhs.x, -rhs.y, -rhs.z)
    }
}

impl Neg for BlockPos {
    type Output = BlockPos;

    fn neg(self) -> BlockPos {
        BlockPos::new(-self.x, -self.y, -self.z)
    }
}

impl From<IVec3> for BlockPos {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<BlockPos> for IVec3 {
    fn from(pos: BlockPos) -> Self {
        IVec3::new(pos.x, pos.y, pos.z)
    }
}

impl fmt::Display for BlockPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.x, self.y, self.z)
    }
}

/// Grid coordinate of a chunk (a 16³ group of blocks)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ChunkPos {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// The block at the minimum corner of this chunk
    pub const fn origin(self) -> BlockPos {
        BlockPos::new(
            self.x << CHUNK_BITS,
            self.y << CHUNK_BITS,
            self.z << CHUNK_BITS,
        )
    }

    /// Convert a chunk-relative position back into a world block position
    pub const fn block(self, rel: BlockPos) -> BlockPos {
        let origin = self.origin();
        BlockPos::new(
            origin.x | (rel.x & CHUNK_MASK),
            origin.y | (rel.y & CHUNK_MASK),
            origin.z | (rel.z & CHUNK_MASK),
        )
    }
}

impl From<IVec3> for ChunkPos {
    fn from(v: IVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}

impl From<ChunkPos> for IVec3 {
    fn from(pos: ChunkPos) -> Self {
        IVec3::new(pos.x, pos.y, pos.z)
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.x, self.y, self.z)
    }
}
