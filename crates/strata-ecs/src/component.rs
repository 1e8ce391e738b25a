use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use crate::entity::Entity;
use crate::error::EcsError;
use crate::world::World;

/// Marker trait for types that can be stored as components.
///
/// Components are cloned when change notifications need a snapshot of the
/// new value, and formatted with `Debug` when enumerated type-erased.
pub trait Component: Any + Clone + fmt::Debug {}

/// Blanket implementation: any `'static + Clone + Debug` type is a valid component.
impl<T: Any + Clone + fmt::Debug> Component for T {}

/// Type-erased view of a component value.
pub trait AnyComponent: Any + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    /// `TypeId` of the concrete component type.
    fn component_type(&self) -> TypeId;

    /// Name of the concrete component type, for diagnostics.
    fn type_name(&self) -> &'static str;
}

impl<T: Component> AnyComponent for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn component_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl<'a> dyn AnyComponent + 'a {
    /// Whether the erased value is a `T`.
    pub fn is<T: Component>(&self) -> bool {
        self.component_type() == TypeId::of::<T>()
    }

    /// Downcast the erased value to a concrete component type.
    pub fn downcast_ref<T: Component>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

/// Removes every component of one type from an entity, firing the usual events.
pub(crate) type Remover = fn(&mut World, Entity) -> Result<(), EcsError>;

/// Type-erased component storage interface.
pub(crate) trait ComponentStorage: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn get_erased(&self, entity: Entity) -> Option<&dyn AnyComponent>;
    fn has(&self, entity: Entity) -> bool;
    fn remover(&self) -> Remover;
}

/// Map from entity to the single value of one component type it holds.
///
/// Absence is tracked by the map itself, so a value equal to `T::default()`
/// is still a present value.
pub(crate) struct ComponentMap<T> {
    values: HashMap<Entity, T>,
}

impl<T: Component> ComponentMap<T> {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Insert or replace the value for an entity, returning the previous one.
    pub fn insert(&mut self, entity: Entity, value: T) -> Option<T> {
        self.values.insert(entity, value)
    }

    pub fn remove(&mut self, entity: Entity) -> Option<T> {
        self.values.remove(&entity)
    }

    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.values.get(&entity)
    }

    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        self.values.get_mut(&entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.values.contains_key(&entity)
    }

    /// Iterate over all (entity, &component) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> {
        self.values.iter().map(|(entity, value)| (*entity, value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

fn remove_component<T: Component>(world: &mut World, entity: Entity) -> Result<(), EcsError> {
    world.remove::<T>(entity).map(drop)
}

impl<T: Component> ComponentStorage for ComponentMap<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn get_erased(&self, entity: Entity) -> Option<&dyn AnyComponent> {
        self.get(entity).map(|value| value as &dyn AnyComponent)
    }

    fn has(&self, entity: Entity) -> bool {
        self.contains(entity)
    }

    fn remover(&self) -> Remover {
        remove_component::<T>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(id: u32) -> Entity {
        Entity::from_raw(id).unwrap()
    }

    #[test]
    fn insert_and_get() {
        let mut map = ComponentMap::new();
        assert_eq!(map.insert(entity(5), 42i32), None);
        assert_eq!(map.get(entity(5)), Some(&42));
        assert_eq!(map.get(entity(1)), None);
    }

    #[test]
    fn overwrite_returns_previous() {
        let mut map = ComponentMap::new();
        map.insert(entity(1), 1i32);
        assert_eq!(map.insert(entity(1), 2), Some(1));
        assert_eq!(map.get(entity(1)), Some(&2));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn default_value_is_present() {
        let mut map = ComponentMap::new();
        map.insert(entity(3), 0u8);
        assert!(map.contains(entity(3)));
        assert_eq!(map.remove(entity(3)), Some(0));
        assert!(!map.contains(entity(3)));
    }

    #[test]
    fn erased_access() {
        let mut map = ComponentMap::new();
        map.insert(entity(2), 'x');
        let storage: &dyn ComponentStorage = &map;
        let erased = storage.get_erased(entity(2)).unwrap();
        assert!(erased.is::<char>());
        assert_eq!(erased.downcast_ref::<char>(), Some(&'x'));
        assert_eq!(erased.type_name(), "char");
        assert!(storage.get_erased(entity(3)).is_none());
    }
}
