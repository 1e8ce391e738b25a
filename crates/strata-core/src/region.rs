//! Axis-aligned boxes of blocks

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::facing::Facing;
use crate::types::BlockPos;

/// A half-open box of blocks: `min` is inclusive, `max` is exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockRegion {
    min: BlockPos,
    max: BlockPos,
}

impl BlockRegion {
    pub const ZERO: BlockRegion = BlockRegion {
        min: BlockPos::ORIGIN,
        max: BlockPos::ORIGIN,
    };

    /// Create a region, failing if `max` is below `min` on any axis
    pub fn new(min: BlockPos, max: BlockPos) -> Result<Self, CoreError> {
        if max.x < min.x || max.y < min.y || max.z < min.z {
            return Err(CoreError::InvertedRegion { min, max });
        }
        Ok(Self { min, max })
    }

    /// The smallest region containing every given position, or `None` if there are none
    pub fn from_enclosing(positions: impl IntoIterator<Item = BlockPos>) -> Option<Self> {
        let mut positions = positions.into_iter();
        let first = positions.next()?;
        let (min, max) = positions.fold((first, first), |(min, max), pos| {
            (
                BlockPos::new(min.x.min(pos.x), min.y.min(pos.y), min.z.min(pos.z)),
                BlockPos::new(max.x.max(pos.x), max.y.max(pos.y), max.z.max(pos.z)),
            )
        });
        Some(Self {
            min,
            max: max.offset(1, 1, 1),
        })
    }

    /// A cube reaching `radius` blocks from `center` in every direction
    pub fn from_center(center: BlockPos, radius: u32) -> Self {
        let r = radius as i32;
        Self {
            min: center.offset(-r, -r, -r),
            max: center.offset(r + 1, r + 1, r + 1),
        }
    }

    pub fn min(&self) -> BlockPos {
        self.min
    }

    pub fn max(&self) -> BlockPos {
        self.max
    }

    /// Extent along each axis
    pub fn size(&self) -> BlockPos {
        self.max - self.min
    }

    /// Number of blocks inside the region
    pub fn volume(&self) -> u64 {
        let size = self.size();
        size.x as u64 * size.y as u64 * size.z as u64
    }

    pub fn is_empty(&self) -> bool {
        self.volume() == 0
    }

    pub fn contains(&self, pos: BlockPos) -> bool {
        pos.x >= self.min.x
            && pos.y >= self.min.y
            && pos.z >= self.min.z
            && pos.x < self.max.x
            && pos.y < self.max.y
            && pos.z < self.max.z
    }

    pub fn contains_region(&self, other: &BlockRegion) -> bool {
        other.min.x >= self.min.x
            && other.min.y >= self.min.y
            && other.min.z >= self.min.z
            && other.max.x <= self.max.x
            && other.max.y <= self.max.y
            && other.max.z <= self.max.z
    }

    /// Whether the two regions share at least one block
    pub fn intersects(&self, other: &BlockRegion) -> bool {
        other.max.x > self.min.x
            && other.min.x < self.max.x
            && other.max.y > self.min.y
            && other.min.y < self.max.y
            && other.max.z > self.min.z
            && other.min.z < self.max.z
    }

    pub fn offset(&self, by: BlockPos) -> Self {
        Self {
            min: self.min + by,
            max: self.max + by,
        }
    }

    pub fn offset_facing(&self, facing: Facing, distance: i32) -> Self {
        self.offset(BlockPos::ORIGIN.offset_facing(facing, distance))
    }

    /// Grow the region by `amount` blocks on every side
    pub fn expand(&self, amount: u32) -> Self {
        let a = amount as i32;
        Self {
            min: self.min.offset(-a, -a, -a),
            max: self.max.offset(a, a, a),
        }
    }

    /// Iterate over every block in the region, x fastest, then y, then z
    pub fn blocks(&self) -> impl Iterator<Item = BlockPos> + '_ {
        let (min, max) = (self.min, self.max);
        (min.z..max.z).flat_map(move |z| {
            (min.y..max.y).flat_map(move |y| (min.x..max.x).map(move |x| BlockPos::new(x, y, z)))
        })
    }
}

impl fmt::Display for BlockRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.min, self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_inverted() {
        let err = BlockRegion::new(BlockPos::new(0, 0, 0), BlockPos::new(-1, 5, 5));
        assert!(matches!(err, Err(CoreError::InvertedRegion { .. })));
    }

    #[test]
    fn enclosing() {
        let region = BlockRegion::from_enclosing([
            BlockPos::new(3, -2, 0),
            BlockPos::new(-1, 4, 0),
        ])
        .unwrap();
        assert_eq!(region.min(), BlockPos::new(-1, -2, 0));
        assert_eq!(region.max(), BlockPos::new(4, 5, 1));
        assert!(BlockRegion::from_enclosing(std::iter::empty()).is_none());
    }

    #[test]
    fn center_and_contains() {
        let region = BlockRegion::from_center(BlockPos::ORIGIN, 1);
        assert_eq!(region.volume(), 27);
        assert!(region.contains(BlockPos::new(1, 1, 1)));
        assert!(region.contains(BlockPos::new(-1, -1, -1)));
        assert!(!region.contains(BlockPos::new(2, 0, 0)));
        assert!(region.expand(1).contains_region(&region));
        assert!(!region.contains_region(&region.expand(1)));
    }

    #[test]
    fn intersection() {
        let a = BlockRegion::new(BlockPos::new(0, 0, 0), BlockPos::new(4, 4, 4)).unwrap();
        let b = a.offset(BlockPos::new(3, 3, 3));
        let c = a.offset(BlockPos::new(4, 0, 0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.offset_facing(Facing::East, 4) == c);
    }

    #[test]
    fn block_iteration_covers_volume() {
        let region = BlockRegion::new(BlockPos::new(-1, 0, 0), BlockPos::new(1, 2, 3)).unwrap();
        let blocks: Vec<_> = region.blocks().collect();
        assert_eq!(blocks.len() as u64, region.volume());
        assert_eq!(blocks[0], BlockPos::new(-1, 0, 0));
        assert_eq!(blocks[1], BlockPos::new(0, 0, 0));
        assert!(blocks.iter().all(|pos| region.contains(*pos)));
    }
}
