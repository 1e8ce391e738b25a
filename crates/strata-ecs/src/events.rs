//! Synchronous change notification for entities and components
//!
//! Handlers run on the calling thread before the triggering operation
//! returns, and receive `&mut World` so they may call back into the store.
//! For a component write the order is: type-scoped Added/Removed, global
//! Added/Removed, type-scoped Changed, global Changed.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::rc::Rc;

use crate::component::{AnyComponent, Component};
use crate::entity::Entity;
use crate::world::World;

/// A notification about one component on one entity.
#[derive(Debug)]
pub enum ComponentEvent<'a, T: ?Sized> {
    /// A value became present where there was none.
    Added { entity: Entity, value: &'a T },
    /// A present value was removed.
    Removed { entity: Entity, value: &'a T },
    /// Fired for every write, including overwrites and no-op removals.
    Changed {
        entity: Entity,
        previous: Option<&'a T>,
        current: Option<&'a T>,
    },
}

impl<'a, T: ?Sized> ComponentEvent<'a, T> {
    pub fn entity(&self) -> Entity {
        match *self {
            ComponentEvent::Added { entity, .. }
            | ComponentEvent::Removed { entity, .. }
            | ComponentEvent::Changed { entity, .. } => entity,
        }
    }
}

impl<'a, T: Component> ComponentEvent<'a, T> {
    /// The same event with the value type erased, as seen by global handlers.
    pub fn erased(&self) -> ComponentEvent<'a, dyn AnyComponent> {
        match *self {
            ComponentEvent::Added { entity, value } => ComponentEvent::Added {
                entity,
                value: value as &dyn AnyComponent,
            },
            ComponentEvent::Removed { entity, value } => ComponentEvent::Removed {
                entity,
                value: value as &dyn AnyComponent,
            },
            ComponentEvent::Changed {
                entity,
                previous,
                current,
            } => ComponentEvent::Changed {
                entity,
                previous: previous.map(|v| v as &dyn AnyComponent),
                current: current.map(|v| v as &dyn AnyComponent),
            },
        }
    }
}

/// Entity lifecycle notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityEvent {
    Added(Entity),
    Removed(Entity),
}

pub type ComponentHandler<T> = Rc<dyn Fn(&mut World, &ComponentEvent<'_, T>)>;
pub type GlobalComponentHandler = Rc<dyn Fn(&mut World, &ComponentEvent<'_, dyn AnyComponent>)>;
pub type EntityHandler = Rc<dyn Fn(&mut World, EntityEvent)>;

/// Registered handlers. Dispatch works on a snapshot of the handler list, so
/// handlers added while an event is being delivered only see later events.
#[derive(Default)]
pub(crate) struct EventHandlers {
    /// `TypeId` of `T` to `Vec<ComponentHandler<T>>`.
    typed: HashMap<TypeId, Box<dyn Any>>,
    global: Vec<GlobalComponentHandler>,
    entity: Vec<EntityHandler>,
}

impl EventHandlers {
    pub fn add_typed<T: Component>(&mut self, handler: ComponentHandler<T>) {
        self.typed
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Vec::<ComponentHandler<T>>::new()))
            .downcast_mut::<Vec<ComponentHandler<T>>>()
            .expect("handler type mismatch")
            .push(handler);
    }

    pub fn typed<T: Component>(&self) -> Vec<ComponentHandler<T>> {
        self.typed
            .get(&TypeId::of::<T>())
            .and_then(|list| list.downcast_ref::<Vec<ComponentHandler<T>>>())
            .cloned()
            .unwrap_or_default()
    }

    pub fn add_global(&mut self, handler: GlobalComponentHandler) {
        self.global.push(handler);
    }

    pub fn global(&self) -> Vec<GlobalComponentHandler> {
        self.global.clone()
    }

    pub fn add_entity(&mut self, handler: EntityHandler) {
        self.entity.push(handler);
    }

    pub fn entity(&self) -> Vec<EntityHandler> {
        self.entity.clone()
    }
}
