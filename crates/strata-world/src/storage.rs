//! Per-type storage strategy for grid components
//!
//! Component types registered as dense live in a `ChunkArray` on the chunk
//! entity. `Block` and `Chunk` are synthesized from the position. Every other
//! type is sparse and lives on a per-cell entity.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;

use strata_core::BlockPos;
use strata_ecs::{AnyComponent, Component, Entity, World};
use tracing::debug;

use crate::dense::{ChunkArray, DenseValue};
use crate::error::WorldError;
use crate::tags::{Block, Chunk, SyntheticTag};

/// How a component type is stored in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Dense,
    Sparse,
    Synthetic(SyntheticTag),
}

/// Typed handle to the dense arrays of component type `T`.
pub struct DenseHandle<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for DenseHandle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for DenseHandle<T> {}

impl<T: DenseValue> DenseHandle<T> {
    fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    /// The array of `chunk`, if one was created.
    pub fn get<'w>(
        &self,
        world: &'w World,
        chunk: Entity,
    ) -> Result<Option<&'w ChunkArray<T>>, WorldError> {
        Ok(world.get_personal::<ChunkArray<T>>(chunk)?)
    }

    /// The array of `chunk`, created empty on first use.
    pub fn get_or_insert<'w>(
        &self,
        world: &'w mut World,
        chunk: Entity,
    ) -> Result<&'w mut ChunkArray<T>, WorldError> {
        Ok(world.get_or_insert_with(chunk, ChunkArray::<T>::new)?)
    }
}

/// Type-erased access to the dense arrays of one component type.
trait DenseStorage {
    fn read<'w>(
        &self,
        world: &'w World,
        chunk: Entity,
        rel: BlockPos,
    ) -> Result<Option<&'w dyn AnyComponent>, WorldError>;

    /// Write the slot at `rel`. `value` must be of the registered type.
    fn write(
        &self,
        world: &mut World,
        chunk: Entity,
        rel: BlockPos,
        value: Option<&dyn Any>,
    ) -> Result<Option<Box<dyn Any>>, WorldError>;
}

impl<T: DenseValue> DenseStorage for DenseHandle<T> {
    fn read<'w>(
        &self,
        world: &'w World,
        chunk: Entity,
        rel: BlockPos,
    ) -> Result<Option<&'w dyn AnyComponent>, WorldError> {
        Ok(self
            .get(world, chunk)?
            .and_then(|array| array.get(rel))
            .map(|value| value as &dyn AnyComponent))
    }

    fn write(
        &self,
        world: &mut World,
        chunk: Entity,
        rel: BlockPos,
        value: Option<&dyn Any>,
    ) -> Result<Option<Box<dyn Any>>, WorldError> {
        let value = value.and_then(|v| v.downcast_ref::<T>()).copied();
        let previous = self.get_or_insert(world, chunk)?.set(rel, value);
        Ok(previous.map(|v| Box::new(v) as Box<dyn Any>))
    }
}

enum Strategy {
    Dense(Box<dyn DenseStorage>),
    Synthetic(SyntheticTag),
}

/// Records the storage strategy of each component type used in the grid.
pub struct StorageRegistry {
    strategies: HashMap<TypeId, Strategy>,
}

impl StorageRegistry {
    pub fn new() -> Self {
        let mut strategies = HashMap::new();
        strategies.insert(TypeId::of::<Block>(), Strategy::Synthetic(SyntheticTag::Block));
        strategies.insert(TypeId::of::<Chunk>(), Strategy::Synthetic(SyntheticTag::Chunk));
        Self { strategies }
    }

    /// Store `T` densely from now on.
    ///
    /// Fails with `DuplicateRegistration` if `T` already has a strategy.
    pub fn register_dense<T: DenseValue>(&mut self) -> Result<DenseHandle<T>, WorldError> {
        let type_name = std::any::type_name::<T>();
        if self.strategies.contains_key(&TypeId::of::<T>()) {
            return Err(WorldError::DuplicateRegistration { type_name });
        }
        let handle = DenseHandle::<T>::new();
        self.strategies
            .insert(TypeId::of::<T>(), Strategy::Dense(Box::new(handle)));
        debug!("registered dense storage for {}", type_name);
        Ok(handle)
    }

    pub fn lookup<T: Component>(&self) -> StorageKind {
        match self.strategies.get(&TypeId::of::<T>()) {
            Some(Strategy::Dense(_)) => StorageKind::Dense,
            Some(Strategy::Synthetic(tag)) => StorageKind::Synthetic(*tag),
            None => StorageKind::Sparse,
        }
    }

    /// The typed dense handle of `T`, if `T` is registered dense.
    pub fn dense<T: DenseValue>(&self) -> Option<DenseHandle<T>> {
        matches!(self.strategies.get(&TypeId::of::<T>()), Some(Strategy::Dense(_)))
            .then(DenseHandle::new)
    }

    pub fn is_dense<T: Component>(&self) -> bool {
        self.lookup::<T>() == StorageKind::Dense
    }

    /// Read the dense slot of `T` at `rel`, treating the default as absent.
    ///
    /// `Ok(None)` also when `T` is not dense or the chunk has no array for it.
    pub(crate) fn read_dense<'w, T: Component>(
        &self,
        world: &'w World,
        chunk: Entity,
        rel: BlockPos,
    ) -> Result<Option<&'w T>, WorldError> {
        let Some(Strategy::Dense(storage)) = self.strategies.get(&TypeId::of::<T>()) else {
            return Ok(None);
        };
        Ok(storage
            .read(world, chunk, rel)?
            .and_then(|value| value.downcast_ref::<T>()))
    }

    /// Write the dense slot of `T` at `rel`, creating the chunk's array if needed.
    pub(crate) fn write_dense<T: Component>(
        &self,
        world: &mut World,
        chunk: Entity,
        rel: BlockPos,
        value: Option<T>,
    ) -> Result<Option<T>, WorldError> {
        let Some(Strategy::Dense(storage)) = self.strategies.get(&TypeId::of::<T>()) else {
            return Ok(None);
        };
        let previous = storage.write(world, chunk, rel, value.as_ref().map(|v| v as &dyn Any))?;
        Ok(previous.and_then(|v| v.downcast::<T>().ok()).map(|v| *v))
    }

    /// Every dense value stored at `rel` of `chunk`, across all dense types.
    pub(crate) fn dense_values<'w>(
        &'w self,
        world: &'w World,
        chunk: Entity,
        rel: BlockPos,
    ) -> impl Iterator<Item = Result<&'w dyn AnyComponent, WorldError>> + 'w {
        self.strategies
            .values()
            .filter_map(move |strategy| match strategy {
                Strategy::Dense(storage) => storage.read(world, chunk, rel).transpose(),
                Strategy::Synthetic(_) => None,
            })
    }
}

impl Default for StorageRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    struct Light(u8);

    #[derive(Debug, Clone, PartialEq)]
    struct Label(String);

    #[test]
    fn test_register_and_lookup() {
        let mut registry = StorageRegistry::new();
        assert_eq!(registry.lookup::<Light>(), StorageKind::Sparse);
        assert!(registry.dense::<Light>().is_none());

        registry.register_dense::<Light>().unwrap();
        assert_eq!(registry.lookup::<Light>(), StorageKind::Dense);
        assert!(registry.is_dense::<Light>());
        assert!(registry.dense::<Light>().is_some());
        assert_eq!(registry.lookup::<Label>(), StorageKind::Sparse);
    }

    #[test]
    fn test_duplicate_registration() {
        let mut registry = StorageRegistry::new();
        registry.register_dense::<Light>().unwrap();
        assert!(matches!(
            registry.register_dense::<Light>(),
            Err(WorldError::DuplicateRegistration { .. })
        ));
    }

    #[test]
    fn test_tags_are_synthetic() {
        let registry = StorageRegistry::new();
        assert_eq!(
            registry.lookup::<Block>(),
            StorageKind::Synthetic(SyntheticTag::Block)
        );
        assert_eq!(
            registry.lookup::<Chunk>(),
            StorageKind::Synthetic(SyntheticTag::Chunk)
        );
    }

    #[test]
    fn test_dense_roundtrip_through_world() {
        let mut registry = StorageRegistry::new();
        let handle = registry.register_dense::<Light>().unwrap();
        let mut world = World::new();
        let chunk = world.spawn();
        let rel = BlockPos::new(3, 4, 5);

        assert!(handle.get(&world, chunk).unwrap().is_none());
        assert_eq!(registry.read_dense::<Light>(&world, chunk, rel).unwrap(), None);

        assert_eq!(
            registry.write_dense(&mut world, chunk, rel, Some(Light(7))).unwrap(),
            None
        );
        assert_eq!(
            registry.read_dense::<Light>(&world, chunk, rel).unwrap(),
            Some(&Light(7))
        );
        assert_eq!(handle.get(&world, chunk).unwrap().unwrap().non_default_count(), 1);

        let values: Vec<_> = registry
            .dense_values(&world, chunk, rel)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].downcast_ref::<Light>(), Some(&Light(7)));

        assert_eq!(
            registry.write_dense::<Light>(&mut world, chunk, rel, None).unwrap(),
            Some(Light(7))
        );
        assert!(handle.get(&world, chunk).unwrap().unwrap().is_empty());
    }
}
