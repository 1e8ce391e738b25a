//! Chunk-based block grid
//!
//! Maps the unbounded block grid onto entities of an owned `World`. Each
//! chunk that was ever written is an entity tagged with `Chunk`; each cell
//! that was ever given a sparse component is an entity tagged with `Block`.
//! Neither kind of entity is removed again once created.

use std::any::Any;
use std::collections::HashMap;

use strata_core::{BlockPos, ChunkPos};
use strata_ecs::{Component, Entity, World};
use tracing::debug;

use crate::dense::{ChunkArray, DenseValue};
use crate::error::WorldError;
use crate::storage::{DenseHandle, StorageKind, StorageRegistry};
use crate::tags::{Block, CellEntities, Chunk, SyntheticTag};
use crate::view::{BlockMut, BlockRef, ChunkMut, ChunkRef};

/// Owns the entity world and the chunk index laid over it.
pub struct ChunkManager {
    world: World,
    /// Chunk position to chunk entity
    chunks: HashMap<ChunkPos, Entity>,
    storage: StorageRegistry,
}

impl ChunkManager {
    pub fn new() -> Self {
        Self::with_world(World::new())
    }

    /// Lay a grid over an existing world.
    pub fn with_world(mut world: World) -> Self {
        world.mark_personal_only::<Block>();
        world.mark_personal_only::<Chunk>();
        world.mark_personal_only::<CellEntities>();
        Self {
            world,
            chunks: HashMap::new(),
            storage: StorageRegistry::new(),
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn into_world(self) -> World {
        self.world
    }

    pub fn storage(&self) -> &StorageRegistry {
        &self.storage
    }

    /// Store `T` in per-chunk arrays instead of on per-cell entities.
    pub fn register_dense<T: DenseValue>(&mut self) -> Result<DenseHandle<T>, WorldError> {
        let handle = self.storage.register_dense::<T>()?;
        self.world.mark_personal_only::<ChunkArray<T>>();
        Ok(handle)
    }

    // ---- Chunk index ----

    pub fn chunk_pos(pos: BlockPos) -> ChunkPos {
        pos.chunk_pos()
    }

    pub fn chunk_rel_pos(pos: BlockPos) -> BlockPos {
        pos.chunk_rel()
    }

    pub fn get_chunk_entity(&self, pos: ChunkPos) -> Option<Entity> {
        self.chunks
            .get(&pos)
            .copied()
            .filter(|entity| self.world.exists(*entity))
    }

    /// The chunk entity at `pos`, spawned and tagged on first use.
    pub fn get_or_create_chunk_entity(&mut self, pos: ChunkPos) -> Result<Entity, WorldError> {
        if let Some(entity) = self.get_chunk_entity(pos) {
            return Ok(entity);
        }
        let entity = self.world.spawn();
        self.world.insert(entity, Chunk::new(pos))?;
        self.chunks.insert(pos, entity);
        debug!("created {} for chunk {}", entity, pos);
        Ok(entity)
    }

    /// Number of chunks that have an entity.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Iterate over `(chunk position, chunk entity)` pairs.
    pub fn chunks(&self) -> impl Iterator<Item = (ChunkPos, Entity)> + '_ {
        self.chunks.iter().map(|(pos, entity)| (*pos, *entity))
    }

    /// The entity holding the sparse components of the block at `pos`, if any.
    pub fn cell_entity(&self, pos: BlockPos) -> Result<Option<Entity>, WorldError> {
        let Some(chunk) = self.get_chunk_entity(pos.chunk_pos()) else {
            return Ok(None);
        };
        Ok(self
            .world
            .get_personal::<CellEntities>(chunk)?
            .and_then(|cells| cells.get(pos.chunk_rel()))
            .filter(|entity| self.world.exists(*entity)))
    }

    /// The cell entity of the block at `pos`, spawned and tagged on first use.
    pub fn get_or_create_cell_entity(&mut self, pos: BlockPos) -> Result<Entity, WorldError> {
        if let Some(entity) = self.cell_entity(pos)? {
            return Ok(entity);
        }
        let chunk = self.get_or_create_chunk_entity(pos.chunk_pos())?;
        let entity = self.world.spawn();
        self.world.insert(entity, Block::new(pos))?;
        self.world
            .get_or_insert_with(chunk, CellEntities::default)?
            .insert(pos.chunk_rel(), entity);
        debug!("created {} for block {}", entity, pos);
        Ok(entity)
    }

    /// The cell entities of the chunk at `pos`.
    pub fn cells(&self, pos: ChunkPos) -> Result<Option<&CellEntities>, WorldError> {
        match self.get_chunk_entity(pos) {
            Some(chunk) => Ok(self.world.get_personal::<CellEntities>(chunk)?),
            None => Ok(None),
        }
    }

    // ---- Block access ----

    /// The `T` of the block at `pos`.
    ///
    /// Dense types read their chunk's array, where the default value reads as
    /// absent. Sparse types resolve on the cell entity, prototypes included.
    pub fn get_block<T: Component>(&self, pos: BlockPos) -> Result<Option<T>, WorldError> {
        match self.storage.lookup::<T>() {
            StorageKind::Synthetic(tag) => Ok(synthesize_block(tag, pos)),
            StorageKind::Dense => {
                let Some(chunk) = self.get_chunk_entity(pos.chunk_pos()) else {
                    return Ok(None);
                };
                Ok(self
                    .storage
                    .read_dense::<T>(&self.world, chunk, pos.chunk_rel())?
                    .cloned())
            }
            StorageKind::Sparse => match self.cell_entity(pos)? {
                Some(cell) => Ok(self.world.get::<T>(cell)?.cloned()),
                None => Ok(None),
            },
        }
    }

    /// Set or clear the `T` of the block at `pos`, returning the previous value.
    ///
    /// Writing a dense type creates the chunk entity. Writing a sparse value
    /// creates the chunk and cell entities; clearing one never creates them.
    pub fn set_block<T: Component>(
        &mut self,
        pos: BlockPos,
        value: Option<T>,
    ) -> Result<Option<T>, WorldError> {
        match self.storage.lookup::<T>() {
            StorageKind::Synthetic(tag) => Err(WorldError::InvalidMutation {
                type_name: tag.type_name(),
            }),
            StorageKind::Dense => {
                let chunk = self.get_or_create_chunk_entity(pos.chunk_pos())?;
                self.storage
                    .write_dense(&mut self.world, chunk, pos.chunk_rel(), value)
            }
            StorageKind::Sparse => match value {
                Some(value) => {
                    let cell = self.get_or_create_cell_entity(pos)?;
                    Ok(self.world.insert(cell, value)?)
                }
                None => match self.cell_entity(pos)? {
                    Some(cell) => Ok(self.world.remove::<T>(cell)?),
                    None => Ok(None),
                },
            },
        }
    }

    pub fn has_block<T: Component>(&self, pos: BlockPos) -> Result<bool, WorldError> {
        self.get_block::<T>(pos).map(|value| value.is_some())
    }

    // ---- Chunk access ----

    /// The `T` of the chunk entity at `pos`, prototypes included.
    pub fn get_chunk<T: Component>(&self, pos: ChunkPos) -> Result<Option<T>, WorldError> {
        if let StorageKind::Synthetic(tag) = self.storage.lookup::<T>() {
            return Ok(synthesize_chunk(tag, pos));
        }
        match self.get_chunk_entity(pos) {
            Some(chunk) => Ok(self.world.get::<T>(chunk)?.cloned()),
            None => Ok(None),
        }
    }

    /// Set or clear the `T` of the chunk entity at `pos`, returning the previous value.
    pub fn set_chunk<T: Component>(
        &mut self,
        pos: ChunkPos,
        value: Option<T>,
    ) -> Result<Option<T>, WorldError> {
        if let StorageKind::Synthetic(tag) = self.storage.lookup::<T>() {
            return Err(WorldError::InvalidMutation {
                type_name: tag.type_name(),
            });
        }
        match value {
            Some(value) => {
                let chunk = self.get_or_create_chunk_entity(pos)?;
                Ok(self.world.insert(chunk, value)?)
            }
            None => match self.get_chunk_entity(pos) {
                Some(chunk) => Ok(self.world.remove::<T>(chunk)?),
                None => Ok(None),
            },
        }
    }

    pub fn has_chunk<T: Component>(&self, pos: ChunkPos) -> Result<bool, WorldError> {
        self.get_chunk::<T>(pos).map(|value| value.is_some())
    }

    // ---- Views ----

    pub fn block(&self, pos: BlockPos) -> BlockRef<'_> {
        BlockRef::new(self, pos)
    }

    pub fn block_mut(&mut self, pos: BlockPos) -> BlockMut<'_> {
        BlockMut::new(self, pos)
    }

    pub fn chunk(&self, pos: ChunkPos) -> ChunkRef<'_> {
        ChunkRef::new(self, pos)
    }

    pub fn chunk_mut(&mut self, pos: ChunkPos) -> ChunkMut<'_> {
        ChunkMut::new(self, pos)
    }
}

impl Default for ChunkManager {
    fn default() -> Self {
        Self::new()
    }
}

fn downcast_tag<T: Component>(tag: Box<dyn Any>) -> Option<T> {
    tag.downcast::<T>().ok().map(|tag| *tag)
}

fn synthesize_block<T: Component>(tag: SyntheticTag, pos: BlockPos) -> Option<T> {
    match tag {
        SyntheticTag::Block => downcast_tag(Box::new(Block::new(pos))),
        SyntheticTag::Chunk => downcast_tag(Box::new(Block::new(pos).chunk())),
    }
}

fn synthesize_chunk<T: Component>(tag: SyntheticTag, pos: ChunkPos) -> Option<T> {
    match tag {
        SyntheticTag::Block => None,
        SyntheticTag::Chunk => downcast_tag(Box::new(Chunk::new(pos))),
    }
}
