//! Position tags and per-chunk bookkeeping components
//!
//! `Block` and `Chunk` are placed on the entities the grid creates, and are
//! also synthesized for any position on read. Neither can be written through
//! the grid API.

use std::collections::HashMap;

use strata_core::{BlockPos, ChunkPos};
use strata_ecs::Entity;

/// The block at `pos` exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Block {
    pub pos: BlockPos,
}

impl Block {
    pub fn new(pos: BlockPos) -> Self {
        Self { pos }
    }

    /// The chunk containing this block.
    pub fn chunk(self) -> Chunk {
        Chunk::new(self.pos.chunk_pos())
    }
}

/// The chunk at `pos` exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Chunk {
    pub pos: ChunkPos,
}

impl Chunk {
    pub fn new(pos: ChunkPos) -> Self {
        Self { pos }
    }
}

/// Which of the grid's synthesized tags a component type is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntheticTag {
    Block,
    Chunk,
}

impl SyntheticTag {
    pub fn type_name(self) -> &'static str {
        match self {
            SyntheticTag::Block => std::any::type_name::<Block>(),
            SyntheticTag::Chunk => std::any::type_name::<Chunk>(),
        }
    }
}

/// Per-chunk map from chunk-relative position to the entity holding that
/// cell's sparse components. Lives on the chunk entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CellEntities {
    cells: HashMap<BlockPos, Entity>,
}

impl CellEntities {
    pub fn get(&self, rel: BlockPos) -> Option<Entity> {
        self.cells.get(&rel).copied()
    }

    pub(crate) fn insert(&mut self, rel: BlockPos, entity: Entity) -> Option<Entity> {
        debug_assert!(rel.is_chunk_rel(), "{rel} is not chunk-relative");
        self.cells.insert(rel, entity)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over `(chunk-relative position, cell entity)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (BlockPos, Entity)> + '_ {
        self.cells.iter().map(|(rel, entity)| (*rel, *entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_chunk_tag() {
        let block = Block::new(BlockPos::new(-1, 17, 32));
        assert_eq!(block.chunk(), Chunk::new(ChunkPos::new(-1, 1, 2)));
    }

    #[test]
    fn test_cell_entities() {
        let mut cells = CellEntities::default();
        assert!(cells.is_empty());
        let e = Entity::from_raw(7).unwrap();
        assert_eq!(cells.insert(BlockPos::new(1, 2, 3), e), None);
        assert_eq!(cells.get(BlockPos::new(1, 2, 3)), Some(e));
        assert_eq!(cells.get(BlockPos::new(3, 2, 1)), None);
        assert_eq!(cells.len(), 1);
        assert_eq!(cells.iter().collect::<Vec<_>>(), vec![(BlockPos::new(1, 2, 3), e)]);
    }

    #[test]
    fn test_synthetic_tag_names() {
        assert!(SyntheticTag::Block.type_name().ends_with("Block"));
        assert!(SyntheticTag::Chunk.type_name().ends_with("Chunk"));
    }
}
