use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroU32;

/// An opaque entity identity. Id `0` is reserved for "no entity", so
/// `Option<Entity>` is the same size as `Entity`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(NonZeroU32);

impl Entity {
    /// Create an entity handle from a raw id. Returns `None` for the reserved id `0`.
    pub fn from_raw(id: u32) -> Option<Self> {
        NonZeroU32::new(id).map(Self)
    }

    /// The raw id of this entity.
    pub fn id(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({:X})", self.id())
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Entity {:X}]", self.id())
    }
}

/// Hands out entity ids from a monotonically increasing counter and tracks which are alive.
///
/// The counter wraps around after `u32::MAX`, skipping only `0`. Once it has
/// wrapped, a freshly allocated id may equal one that is still alive; the two
/// entities then share every component. This is a known limitation.
pub struct EntityRegistry {
    alive: HashSet<Entity>,
    next_id: u32,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self {
            alive: HashSet::new(),
            next_id: 1,
        }
    }

    /// Allocate a fresh entity id.
    pub fn allocate(&mut self) -> Entity {
        let entity = match Entity::from_raw(self.next_id) {
            Some(entity) => entity,
            None => Entity(NonZeroU32::MIN),
        };
        self.next_id = entity.id().wrapping_add(1);
        self.alive.insert(entity);
        entity
    }

    /// Release an entity id. Returns `true` if it was alive.
    pub fn deallocate(&mut self, entity: Entity) -> bool {
        self.alive.remove(&entity)
    }

    /// Check if an entity is currently alive.
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.alive.contains(&entity)
    }

    /// Iterate over all alive entities, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive.iter().copied()
    }

    /// Number of currently alive entities.
    pub fn len(&self) -> usize {
        self.alive.len()
    }

    /// Whether there are no alive entities.
    pub fn is_empty(&self) -> bool {
        self.alive.is_empty()
    }
}

impl Default for EntityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_sequential() {
        let mut registry = EntityRegistry::new();
        let e1 = registry.allocate();
        let e2 = registry.allocate();
        assert_eq!(e1.id(), 1);
        assert_eq!(e2.id(), 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn ids_are_not_reused_immediately() {
        let mut registry = EntityRegistry::new();
        let e1 = registry.allocate();
        assert!(registry.deallocate(e1));
        let e2 = registry.allocate();
        assert_ne!(e1, e2);
        assert!(!registry.is_alive(e1));
        assert!(registry.is_alive(e2));
    }

    #[test]
    fn double_deallocate_fails() {
        let mut registry = EntityRegistry::new();
        let e = registry.allocate();
        assert!(registry.deallocate(e));
        assert!(!registry.deallocate(e));
    }

    #[test]
    fn wraparound_skips_zero_and_may_collide() {
        let mut registry = EntityRegistry::new();
        let first = registry.allocate();
        registry.next_id = u32::MAX;
        let last = registry.allocate();
        assert_eq!(last.id(), u32::MAX);
        // 0 is reserved, so the counter lands on 1 even though it is alive
        let wrapped = registry.allocate();
        assert_eq!(wrapped, first);
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.allocate().id(), 2);
    }

    #[test]
    fn zero_is_not_an_entity() {
        assert!(Entity::from_raw(0).is_none());
        assert_eq!(std::mem::size_of::<Option<Entity>>(), 4);
    }
}
