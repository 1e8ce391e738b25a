use crate::component::Component;
use crate::entity::Entity;
use crate::error::EcsError;
use crate::prototype::Prototype;
use crate::world::World;

/// One deferred step applied to a freshly spawned entity.
type ApplyFn = Box<dyn FnOnce(&mut World, Entity) -> Result<(), EcsError>>;

/// Collects components for a new entity, each closed over its own concrete type.
///
/// ```ignore
/// let wall = EntityBuilder::new().with(Blocking).with(Glyph('#')).spawn(&mut world)?;
/// let segment = EntityBuilder::new().with_prototype(wall).with(Position(4, 4)).spawn(&mut world)?;
/// ```
#[derive(Default)]
pub struct EntityBuilder {
    steps: Vec<ApplyFn>,
}

impl EntityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component to set on the entity.
    pub fn with<T: Component>(mut self, component: T) -> Self {
        self.steps.push(Box::new(move |world: &mut World, entity: Entity| {
            world.insert(entity, component).map(drop)
        }));
        self
    }

    /// Make the entity fall back to `prototype` for components it does not hold.
    pub fn with_prototype(self, prototype: Entity) -> Self {
        self.with(Prototype::new(prototype))
    }

    /// Add an arbitrary setup step.
    pub fn with_fn(
        mut self,
        apply: impl FnOnce(&mut World, Entity) -> Result<(), EcsError> + 'static,
    ) -> Self {
        self.steps.push(Box::new(apply));
        self
    }

    /// Number of pending steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Spawn the entity and apply every step in the order they were added.
    pub fn spawn(self, world: &mut World) -> Result<Entity, EcsError> {
        let entity = world.spawn();
        for apply in self.steps {
            apply(world, entity)?;
        }
        Ok(entity)
    }
}
