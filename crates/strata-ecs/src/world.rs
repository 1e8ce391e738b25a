use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::trace;

use crate::builder::EntityBuilder;
use crate::component::{AnyComponent, Component, ComponentMap, ComponentStorage};
use crate::entity::{Entity, EntityRegistry};
use crate::error::EcsError;
use crate::events::{ComponentEvent, EntityEvent, EventHandlers};
use crate::prototype::{self, Prototype, PrototypeDerived};

/// The central ECS container. Owns all entities, their components and the
/// handlers observing them.
pub struct World {
    pub(crate) entities: EntityRegistry,
    pub(crate) components: HashMap<TypeId, Box<dyn ComponentStorage>>,
    /// Component types that never resolve through a prototype.
    personal_only: HashSet<TypeId>,
    events: EventHandlers,
}

impl World {
    pub fn new() -> Self {
        let mut world = Self {
            entities: EntityRegistry::new(),
            components: HashMap::new(),
            personal_only: HashSet::new(),
            events: EventHandlers::default(),
        };
        world.mark_personal_only::<Prototype>();
        world.mark_personal_only::<PrototypeDerived>();
        prototype::install(&mut world);
        world
    }

    // ---- Entity management ----

    /// Spawn a new entity with no components.
    pub fn spawn(&mut self) -> Entity {
        let entity = self.entities.allocate();
        trace!("spawned {}", entity);
        for handler in self.events.entity() {
            handler(self, EntityEvent::Added(entity));
        }
        entity
    }

    /// Spawn a new entity and apply every component in `builder` to it.
    pub fn spawn_with(&mut self, builder: EntityBuilder) -> Result<Entity, EcsError> {
        builder.spawn(self)
    }

    /// Despawn an entity.
    ///
    /// Its components are removed one by one first, so their Removed and
    /// Changed events fire while the entity still exists.
    pub fn despawn(&mut self, entity: Entity) -> Result<(), EcsError> {
        self.ensure_exists(entity)?;
        let removers: Vec<_> = self
            .components
            .values()
            .filter(|storage| storage.has(entity))
            .map(|storage| storage.remover())
            .collect();
        for remove in removers {
            remove(self, entity)?;
        }
        self.entities.deallocate(entity);
        trace!("despawned {}", entity);
        for handler in self.events.entity() {
            handler(self, EntityEvent::Removed(entity));
        }
        Ok(())
    }

    /// Check whether an entity is alive.
    pub fn exists(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of alive entities.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// Iterate over all alive entities, in no particular order.
    pub fn entities(&self) -> impl Iterator<Item = Entity> + '_ {
        self.entities.iter()
    }

    fn ensure_exists(&self, entity: Entity) -> Result<(), EcsError> {
        if self.entities.is_alive(entity) {
            Ok(())
        } else {
            Err(EcsError::EntityNotFound(entity))
        }
    }

    // ---- Component storage ----

    fn storage_mut<T: Component>(&mut self) -> &mut ComponentMap<T> {
        self.components
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(ComponentMap::<T>::new()))
            .as_any_mut()
            .downcast_mut::<ComponentMap<T>>()
            .expect("component type mismatch")
    }

    pub(crate) fn storage<T: Component>(&self) -> Option<&ComponentMap<T>> {
        self.components
            .get(&TypeId::of::<T>())
            .and_then(|s| s.as_any().downcast_ref::<ComponentMap<T>>())
    }

    /// Stop `T` from resolving through prototypes in `get` and in derived enumeration.
    pub fn mark_personal_only<T: Component>(&mut self) {
        self.personal_only.insert(TypeId::of::<T>());
    }

    pub fn is_personal_only<T: Component>(&self) -> bool {
        self.personal_only.contains(&TypeId::of::<T>())
    }

    // ---- Component access ----

    /// The component stored directly on `entity`, ignoring its prototype.
    pub fn get_personal<T: Component>(&self, entity: Entity) -> Result<Option<&T>, EcsError> {
        self.ensure_exists(entity)?;
        Ok(self.storage::<T>().and_then(|s| s.get(entity)))
    }

    /// Mutable access to the component stored directly on `entity`.
    ///
    /// Changes made through the returned reference do not fire events.
    pub fn get_personal_mut<T: Component>(
        &mut self,
        entity: Entity,
    ) -> Result<Option<&mut T>, EcsError> {
        self.ensure_exists(entity)?;
        Ok(self
            .components
            .get_mut(&TypeId::of::<T>())
            .and_then(|s| s.as_any_mut().downcast_mut::<ComponentMap<T>>())
            .and_then(|s| s.get_mut(entity)))
    }

    /// The component of `entity`, falling back along its prototype chain.
    ///
    /// The chain is followed without cycle detection: a prototype cycle in
    /// which no entity holds `T` recurses until the stack is exhausted.
    pub fn get<T: Component>(&self, entity: Entity) -> Result<Option<&T>, EcsError> {
        self.ensure_exists(entity)?;
        Ok(self.resolve::<T>(entity))
    }

    fn resolve<T: Component>(&self, entity: Entity) -> Option<&T> {
        if let Some(value) = self.storage::<T>().and_then(|s| s.get(entity)) {
            return Some(value);
        }
        if self.is_personal_only::<T>() {
            return None;
        }
        let prototype = self.storage::<Prototype>()?.get(entity)?;
        self.resolve::<T>(prototype.entity())
    }

    /// Whether `entity` has a `T`, either directly or through its prototype chain.
    pub fn has<T: Component>(&self, entity: Entity) -> Result<bool, EcsError> {
        self.get::<T>(entity).map(|value| value.is_some())
    }

    /// Whether `entity` holds a `T` directly.
    pub fn has_personal<T: Component>(&self, entity: Entity) -> Result<bool, EcsError> {
        self.get_personal::<T>(entity).map(|value| value.is_some())
    }

    /// Set or clear the component `T` on `entity`, returning the previous personal value.
    ///
    /// Setting a value hides the prototype's value; clearing it reveals it again.
    pub fn set<T: Component>(
        &mut self,
        entity: Entity,
        value: Option<T>,
    ) -> Result<Option<T>, EcsError> {
        self.ensure_exists(entity)?;
        let previous = match value {
            Some(value) => self.storage_mut::<T>().insert(entity, value),
            None => self
                .components
                .get_mut(&TypeId::of::<T>())
                .and_then(|s| s.as_any_mut().downcast_mut::<ComponentMap<T>>())
                .and_then(|s| s.remove(entity)),
        };
        self.notify(entity, previous.as_ref());
        Ok(previous)
    }

    /// Shorthand for `set(entity, Some(value))`.
    pub fn insert<T: Component>(&mut self, entity: Entity, value: T) -> Result<Option<T>, EcsError> {
        self.set(entity, Some(value))
    }

    /// Shorthand for `set::<T>(entity, None)`.
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Result<Option<T>, EcsError> {
        self.set::<T>(entity, None)
    }

    /// The personal `T` of `entity`, inserting `default()` first if it has none.
    pub fn get_or_insert_with<T: Component>(
        &mut self,
        entity: Entity,
        default: impl FnOnce() -> T,
    ) -> Result<&mut T, EcsError> {
        self.ensure_exists(entity)?;
        if !self.storage::<T>().is_some_and(|s| s.contains(entity)) {
            self.storage_mut::<T>().insert(entity, default());
            self.notify::<T>(entity, None);
        }
        self.storage_mut::<T>()
            .get_mut(entity)
            .ok_or(EcsError::InsertionInterrupted {
                entity,
                type_name: std::any::type_name::<T>(),
            })
    }

    /// The components stored directly on `entity`.
    ///
    /// Unlike `get`, this does not include values inherited from the prototype chain.
    pub fn get_all(
        &self,
        entity: Entity,
    ) -> Result<impl Iterator<Item = &dyn AnyComponent> + '_, EcsError> {
        self.ensure_exists(entity)?;
        Ok(self
            .components
            .values()
            .filter_map(move |storage| storage.get_erased(entity)))
    }

    // ---- Events ----

    /// Observe Added/Removed/Changed events for component type `T`.
    pub fn on_component<T: Component>(
        &mut self,
        handler: impl Fn(&mut World, &ComponentEvent<'_, T>) + 'static,
    ) {
        self.events.add_typed::<T>(Rc::new(handler));
    }

    /// Observe Added/Removed/Changed events for every component type.
    pub fn on_any_component(
        &mut self,
        handler: impl Fn(&mut World, &ComponentEvent<'_, dyn AnyComponent>) + 'static,
    ) {
        self.events.add_global(Rc::new(handler));
    }

    /// Observe entities being spawned and despawned.
    pub fn on_entity(&mut self, handler: impl Fn(&mut World, EntityEvent) + 'static) {
        self.events.add_entity(Rc::new(handler));
    }

    fn notify<T: Component>(&mut self, entity: Entity, previous: Option<&T>) {
        let typed = self.events.typed::<T>();
        let global = self.events.global();
        if typed.is_empty() && global.is_empty() {
            return;
        }

        let current = self.storage::<T>().and_then(|s| s.get(entity)).cloned();
        let transition = match (previous, current.as_ref()) {
            (None, Some(value)) => Some(ComponentEvent::Added { entity, value }),
            (Some(value), None) => Some(ComponentEvent::Removed { entity, value }),
            _ => None,
        };
        let changed = ComponentEvent::Changed {
            entity,
            previous,
            current: current.as_ref(),
        };

        for event in transition.iter().chain(std::iter::once(&changed)) {
            for handler in &typed {
                handler(self, event);
            }
            let erased = event.erased();
            for handler in &global {
                handler(self, &erased);
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Debug, Clone, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Name(String);

    #[derive(Debug, Clone, Copy, Default, PartialEq)]
    struct Count(u32);

    #[test]
    fn spawn_and_despawn() {
        let mut world = World::new();
        let e = world.spawn();
        assert!(world.exists(e));
        assert_eq!(world.entity_count(), 1);
        assert_eq!(world.get_all(e).unwrap().count(), 0);
        world.despawn(e).unwrap();
        assert!(!world.exists(e));
        assert_eq!(world.entity_count(), 0);
        assert_eq!(world.entities().count(), 0);
    }

    #[test]
    fn despawn_missing_entity_fails() {
        let mut world = World::new();
        let e = world.spawn();
        world.despawn(e).unwrap();
        assert_eq!(world.despawn(e), Err(EcsError::EntityNotFound(e)));
    }

    #[test]
    fn set_get_remove_component() {
        let mut world = World::new();
        let e = world.spawn();
        assert_eq!(world.insert(e, Position { x: 1.0, y: 2.0 }).unwrap(), None);
        assert_eq!(
            world.get::<Position>(e).unwrap(),
            Some(&Position { x: 1.0, y: 2.0 })
        );
        assert!(world.has::<Position>(e).unwrap());
        assert_eq!(
            world.remove::<Position>(e).unwrap(),
            Some(Position { x: 1.0, y: 2.0 })
        );
        assert_eq!(world.get::<Position>(e).unwrap(), None);
        assert!(!world.has::<Position>(e).unwrap());
    }

    #[test]
    fn default_value_is_not_absence() {
        let mut world = World::new();
        let e = world.spawn();
        world.insert(e, Count::default()).unwrap();
        assert_eq!(world.get::<Count>(e).unwrap(), Some(&Count(0)));
    }

    #[test]
    fn operations_on_missing_entity_fail() {
        let mut world = World::new();
        let e = world.spawn();
        world.despawn(e).unwrap();
        assert!(matches!(world.get::<Count>(e), Err(EcsError::EntityNotFound(_))));
        assert!(matches!(world.set(e, Some(Count(1))), Err(EcsError::EntityNotFound(_))));
        assert!(matches!(world.get_all(e), Err(EcsError::EntityNotFound(_))));
        // nothing was written before the check
        assert!(world.storage::<Count>().is_none());
    }

    #[test]
    fn get_all_lists_personal_types() {
        let mut world = World::new();
        let e = world.spawn();
        world.insert(e, Position { x: 0.0, y: 0.0 }).unwrap();
        world.insert(e, Name("crate".into())).unwrap();
        let mut names: Vec<_> = world.get_all(e).unwrap().map(|c| c.type_name()).collect();
        names.sort();
        assert_eq!(names.len(), 2);
        assert!(names.iter().any(|n| n.ends_with("Position")));
        assert!(names.iter().any(|n| n.ends_with("Name")));

        world.remove::<Name>(e).unwrap();
        let all: Vec<_> = world.get_all(e).unwrap().collect();
        assert_eq!(all.len(), 1);
        assert!(all[0].is::<Position>());
    }

    #[test]
    fn despawn_removes_components() {
        let mut world = World::new();
        let e = world.spawn();
        world.insert(e, Count(3)).unwrap();
        world.despawn(e).unwrap();
        assert_eq!(world.storage::<Count>().map(|s| s.len()), Some(0));
    }

    #[test]
    fn get_or_insert_with_creates_once() {
        let mut world = World::new();
        let e = world.spawn();
        world.get_or_insert_with(e, || Count(1)).unwrap().0 += 1;
        world.get_or_insert_with(e, || Count(100)).unwrap().0 += 1;
        assert_eq!(world.get::<Count>(e).unwrap(), Some(&Count(3)));
    }

    #[test]
    fn event_order_type_scoped_before_global() {
        let mut world = World::new();
        let log = Rc::new(RefCell::new(Vec::<String>::new()));

        let typed_log = log.clone();
        world.on_component::<Count>(move |_, event| {
            let kind = match event {
                ComponentEvent::Added { .. } => "added",
                ComponentEvent::Removed { .. } => "removed",
                ComponentEvent::Changed { .. } => "changed",
            };
            typed_log.borrow_mut().push(format!("typed {kind}"));
        });
        let global_log = log.clone();
        world.on_any_component(move |_, event| {
            let kind = match event {
                ComponentEvent::Added { .. } => "added",
                ComponentEvent::Removed { .. } => "removed",
                ComponentEvent::Changed { .. } => "changed",
            };
            global_log.borrow_mut().push(format!("global {kind}"));
        });

        let e = world.spawn();
        world.insert(e, Count(1)).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["typed added", "global added", "typed changed", "global changed"]
        );

        log.borrow_mut().clear();
        world.insert(e, Count(2)).unwrap();
        assert_eq!(*log.borrow(), vec!["typed changed", "global changed"]);

        log.borrow_mut().clear();
        world.remove::<Count>(e).unwrap();
        assert_eq!(
            *log.borrow(),
            vec!["typed removed", "global removed", "typed changed", "global changed"]
        );

        // Changed fires even when nothing was there to remove.
        log.borrow_mut().clear();
        world.remove::<Count>(e).unwrap();
        assert_eq!(*log.borrow(), vec!["typed changed", "global changed"]);
    }

    #[test]
    fn changed_event_carries_previous_and_current() {
        let mut world = World::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        world.on_component::<Count>(move |_, event| {
            if let ComponentEvent::Changed { previous, current, .. } = event {
                sink.borrow_mut().push((previous.copied(), current.copied()));
            }
        });
        let e = world.spawn();
        world.insert(e, Count(1)).unwrap();
        world.insert(e, Count(2)).unwrap();
        world.remove::<Count>(e).unwrap();
        assert_eq!(
            *seen.borrow(),
            vec![
                (None, Some(Count(1))),
                (Some(Count(1)), Some(Count(2))),
                (Some(Count(2)), None),
            ]
        );
    }

    #[test]
    fn handlers_may_reenter_the_world() {
        let mut world = World::new();
        // Mirror every Count into a Name on the same entity.
        world.on_component::<Count>(|world, event| {
            if let ComponentEvent::Changed { entity, current, .. } = *event {
                let name = current.map(|count| Name(format!("#{}", count.0)));
                world.set(entity, name).unwrap();
            }
        });
        let e = world.spawn();
        world.insert(e, Count(7)).unwrap();
        assert_eq!(world.get::<Name>(e).unwrap(), Some(&Name("#7".into())));
        world.remove::<Count>(e).unwrap();
        assert_eq!(world.get::<Name>(e).unwrap(), None);
    }

    #[test]
    fn entity_events_fire() {
        let mut world = World::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        world.on_entity(move |_, event| sink.borrow_mut().push(event));
        let e = world.spawn();
        world.despawn(e).unwrap();
        assert_eq!(
            *log.borrow(),
            vec![EntityEvent::Added(e), EntityEvent::Removed(e)]
        );
    }

    #[test]
    fn despawn_fires_component_removal_first() {
        let mut world = World::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let component_log = log.clone();
        world.on_component::<Count>(move |world, event| {
            if let ComponentEvent::Removed { entity, .. } = *event {
                // the entity is still alive while its components are removed
                component_log.borrow_mut().push(("component", world.exists(entity)));
            }
        });
        let entity_log = log.clone();
        world.on_entity(move |world, event| {
            if let EntityEvent::Removed(entity) = event {
                entity_log.borrow_mut().push(("entity", world.exists(entity)));
            }
        });
        let e = world.spawn();
        world.insert(e, Count(1)).unwrap();
        world.despawn(e).unwrap();
        assert_eq!(*log.borrow(), vec![("component", true), ("entity", false)]);
    }
}
