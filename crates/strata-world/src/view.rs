//! Position-bound views into a `ChunkManager`

use strata_core::{BlockPos, ChunkPos, Facing};
use strata_ecs::{AnyComponent, Component, Entity};

use crate::error::WorldError;
use crate::manager::ChunkManager;
use crate::tags::{Block, Chunk};

/// Read access to one block.
#[derive(Clone, Copy)]
pub struct BlockRef<'g> {
    grid: &'g ChunkManager,
    tag: Block,
}

impl<'g> BlockRef<'g> {
    pub(crate) fn new(grid: &'g ChunkManager, pos: BlockPos) -> Self {
        Self {
            grid,
            tag: Block::new(pos),
        }
    }

    pub fn pos(&self) -> BlockPos {
        self.tag.pos
    }

    /// The block's own tag. Always present.
    pub fn block(&self) -> Block {
        self.tag
    }

    /// The tag of the containing chunk. Always present.
    pub fn chunk(&self) -> Chunk {
        self.tag.chunk()
    }

    /// The block `distance` steps towards `facing`.
    pub fn neighbor(&self, facing: Facing, distance: i32) -> BlockRef<'g> {
        BlockRef::new(self.grid, self.tag.pos.offset_facing(facing, distance))
    }

    /// The cell entity holding this block's sparse components, if one was created.
    pub fn entity(&self) -> Result<Option<Entity>, WorldError> {
        self.grid.cell_entity(self.tag.pos)
    }

    pub fn chunk_entity(&self) -> Option<Entity> {
        self.grid.get_chunk_entity(self.tag.pos.chunk_pos())
    }

    pub fn get<T: Component>(&self) -> Result<Option<T>, WorldError> {
        self.grid.get_block::<T>(self.tag.pos)
    }

    pub fn has<T: Component>(&self) -> Result<bool, WorldError> {
        self.grid.has_block::<T>(self.tag.pos)
    }

    /// The `Block` tag, then every non-default dense value at this cell, then
    /// the components stored on the cell entity. Prototype values are not included.
    pub fn components(&self) -> Result<Vec<&dyn AnyComponent>, WorldError> {
        let mut out: Vec<&dyn AnyComponent> = vec![&self.tag];
        if let Some(chunk) = self.chunk_entity() {
            let rel = self.tag.pos.chunk_rel();
            for value in self.grid.storage().dense_values(self.grid.world(), chunk, rel) {
                out.push(value?);
            }
        }
        if let Some(cell) = self.entity()? {
            out.extend(
                self.grid
                    .world()
                    .get_all(cell)?
                    .filter(|component| !component.is::<Block>()),
            );
        }
        Ok(out)
    }
}

/// Read and write access to one block.
pub struct BlockMut<'g> {
    grid: &'g mut ChunkManager,
    pos: BlockPos,
}

impl<'g> BlockMut<'g> {
    pub(crate) fn new(grid: &'g mut ChunkManager, pos: BlockPos) -> Self {
        Self { grid, pos }
    }

    pub fn view(&self) -> BlockRef<'_> {
        BlockRef::new(&*self.grid, self.pos)
    }

    pub fn pos(&self) -> BlockPos {
        self.pos
    }

    pub fn get<T: Component>(&self) -> Result<Option<T>, WorldError> {
        self.grid.get_block::<T>(self.pos)
    }

    /// Set the `T` of this block, returning the previous value.
    pub fn set<T: Component>(&mut self, value: T) -> Result<Option<T>, WorldError> {
        self.grid.set_block(self.pos, Some(value))
    }

    /// Clear the `T` of this block, returning the previous value.
    pub fn remove<T: Component>(&mut self) -> Result<Option<T>, WorldError> {
        self.grid.set_block::<T>(self.pos, None)
    }

    /// The cell entity of this block, created if needed.
    pub fn entity(&mut self) -> Result<Entity, WorldError> {
        self.grid.get_or_create_cell_entity(self.pos)
    }
}

/// Read access to one chunk.
#[derive(Clone, Copy)]
pub struct ChunkRef<'g> {
    grid: &'g ChunkManager,
    tag: Chunk,
}

impl<'g> ChunkRef<'g> {
    pub(crate) fn new(grid: &'g ChunkManager, pos: ChunkPos) -> Self {
        Self {
            grid,
            tag: Chunk::new(pos),
        }
    }

    pub fn pos(&self) -> ChunkPos {
        self.tag.pos
    }

    /// The chunk's own tag. Always present.
    pub fn chunk(&self) -> Chunk {
        self.tag
    }

    pub fn entity(&self) -> Option<Entity> {
        self.grid.get_chunk_entity(self.tag.pos)
    }

    /// View of the block at `rel` inside this chunk.
    pub fn block(&self, rel: BlockPos) -> BlockRef<'g> {
        BlockRef::new(self.grid, self.tag.pos.block(rel))
    }

    pub fn get<T: Component>(&self) -> Result<Option<T>, WorldError> {
        self.grid.get_chunk::<T>(self.tag.pos)
    }

    pub fn has<T: Component>(&self) -> Result<bool, WorldError> {
        self.grid.has_chunk::<T>(self.tag.pos)
    }

    /// The `Chunk` tag followed by the components stored on the chunk entity.
    pub fn components(&self) -> Result<Vec<&dyn AnyComponent>, WorldError> {
        let mut out: Vec<&dyn AnyComponent> = vec![&self.tag];
        if let Some(chunk) = self.entity() {
            out.extend(
                self.grid
                    .world()
                    .get_all(chunk)?
                    .filter(|component| !component.is::<Chunk>()),
            );
        }
        Ok(out)
    }
}

/// Read and write access to one chunk.
pub struct ChunkMut<'g> {
    grid: &'g mut ChunkManager,
    pos: ChunkPos,
}

impl<'g> ChunkMut<'g> {
    pub(crate) fn new(grid: &'g mut ChunkManager, pos: ChunkPos) -> Self {
        Self { grid, pos }
    }

    pub fn view(&self) -> ChunkRef<'_> {
        ChunkRef::new(&*self.grid, self.pos)
    }

    pub fn pos(&self) -> ChunkPos {
        self.pos
    }

    pub fn get<T: Component>(&self) -> Result<Option<T>, WorldError> {
        self.grid.get_chunk::<T>(self.pos)
    }

    pub fn set<T: Component>(&mut self, value: T) -> Result<Option<T>, WorldError> {
        self.grid.set_chunk(self.pos, Some(value))
    }

    pub fn remove<T: Component>(&mut self) -> Result<Option<T>, WorldError> {
        self.grid.set_chunk::<T>(self.pos, None)
    }

    /// The chunk entity, created if needed.
    pub fn entity(&mut self) -> Result<Entity, WorldError> {
        self.grid.get_or_create_chunk_entity(self.pos)
    }
}
