//! Prototype inheritance
//!
//! An entity holding `Prototype(p)` falls back to `p`'s components when it
//! has none of its own. The reverse index, `PrototypeDerived` on `p`, is kept
//! in sync by a handler on `Prototype` changes installed in every `World`.

use std::collections::HashSet;

use tracing::warn;

use crate::entity::Entity;
use crate::events::ComponentEvent;
use crate::world::World;

/// Names the entity to fall back to for components this entity does not hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Prototype(Entity);

impl Prototype {
    pub fn new(entity: Entity) -> Self {
        Self(entity)
    }

    pub fn entity(self) -> Entity {
        self.0
    }
}

/// The entities whose `Prototype` currently points at the entity holding this.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrototypeDerived {
    derived: HashSet<Entity>,
}

impl PrototypeDerived {
    pub fn has(&self, entity: Entity) -> bool {
        self.derived.contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.derived.len()
    }

    pub fn is_empty(&self) -> bool {
        self.derived.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.derived.iter().copied()
    }
}

pub(crate) fn install(world: &mut World) {
    world.on_component::<Prototype>(on_prototype_changed);
}

fn on_prototype_changed(world: &mut World, event: &ComponentEvent<'_, Prototype>) {
    let &ComponentEvent::Changed {
        entity,
        previous,
        current,
    } = event
    else {
        return;
    };
    if previous == current {
        return;
    }
    if let Some(previous) = previous {
        unlink(world, previous.entity(), entity);
    }
    if let Some(current) = current {
        link(world, current.entity(), entity);
    }
}

fn unlink(world: &mut World, prototype: Entity, derived: Entity) {
    if !world.exists(prototype) {
        return;
    }
    let now_empty = match world.get_personal_mut::<PrototypeDerived>(prototype) {
        Ok(Some(index)) => {
            index.derived.remove(&derived);
            index.is_empty()
        }
        _ => false,
    };
    if now_empty {
        if let Err(err) = world.remove::<PrototypeDerived>(prototype) {
            warn!("failed to drop empty prototype index of {}: {}", prototype, err);
        }
    }
}

fn link(world: &mut World, prototype: Entity, derived: Entity) {
    if !world.exists(prototype) {
        warn!("{} uses {} as prototype, which does not exist", derived, prototype);
        return;
    }
    if let Ok(Some(index)) = world.get_personal_mut::<PrototypeDerived>(prototype) {
        index.derived.insert(derived);
        return;
    }
    let index = PrototypeDerived {
        derived: HashSet::from([derived]),
    };
    if let Err(err) = world.insert(prototype, index) {
        warn!("failed to index {} under prototype {}: {}", derived, prototype, err);
    }
}

impl World {
    /// The entities currently deriving from `prototype`, if any do.
    pub fn derived_of(&self, prototype: Entity) -> Result<Option<&PrototypeDerived>, crate::EcsError> {
        self.get_personal::<PrototypeDerived>(prototype)
    }

    /// Whether any entity currently uses `entity` as its prototype.
    pub fn is_prototype(&self, entity: Entity) -> bool {
        self.storage::<PrototypeDerived>()
            .and_then(|s| s.get(entity))
            .is_some_and(|derived| !derived.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EntityBuilder;

    #[derive(Debug, Clone, PartialEq)]
    struct Health(u32);

    #[derive(Debug, Clone, PartialEq)]
    struct Glyph(char);

    #[test]
    fn fallback_to_prototype() {
        let mut world = World::new();
        let prototype = EntityBuilder::new().with(Health(10)).spawn(&mut world).unwrap();
        let derived = EntityBuilder::new()
            .with_prototype(prototype)
            .spawn(&mut world)
            .unwrap();
        assert_eq!(world.get::<Health>(derived).unwrap(), Some(&Health(10)));
        assert_eq!(world.get_personal::<Health>(derived).unwrap(), None);
    }

    #[test]
    fn fallback_through_long_chain() {
        let mut world = World::new();
        let root = EntityBuilder::new().with(Health(10)).spawn(&mut world).unwrap();
        let mut last = root;
        for _ in 0..3 {
            last = EntityBuilder::new().with_prototype(last).spawn(&mut world).unwrap();
        }
        assert_eq!(world.get::<Health>(last).unwrap(), Some(&Health(10)));
    }

    #[test]
    fn override_hides_without_mutating() {
        let mut world = World::new();
        let prototype = EntityBuilder::new().with(Health(10)).spawn(&mut world).unwrap();
        let derived = EntityBuilder::new()
            .with_prototype(prototype)
            .spawn(&mut world)
            .unwrap();
        world.insert(derived, Health(20)).unwrap();
        assert_eq!(world.get::<Health>(prototype).unwrap(), Some(&Health(10)));
        assert_eq!(world.get::<Health>(derived).unwrap(), Some(&Health(20)));

        // removing the override reveals the prototype's value again
        world.remove::<Health>(derived).unwrap();
        assert_eq!(world.get::<Health>(derived).unwrap(), Some(&Health(10)));
    }

    #[test]
    fn get_all_does_not_follow_prototype() {
        let mut world = World::new();
        let prototype = EntityBuilder::new()
            .with(Health(10))
            .with(Glyph('#'))
            .spawn(&mut world)
            .unwrap();
        let derived = EntityBuilder::new()
            .with_prototype(prototype)
            .spawn(&mut world)
            .unwrap();
        let all: Vec<_> = world.get_all(derived).unwrap().collect();
        assert_eq!(all.len(), 1);
        assert!(all[0].is::<Prototype>());
    }

    #[test]
    fn prototype_component_is_not_inherited() {
        let mut world = World::new();
        let root = world.spawn();
        let middle = EntityBuilder::new().with_prototype(root).spawn(&mut world).unwrap();
        let leaf = EntityBuilder::new().with_prototype(middle).spawn(&mut world).unwrap();
        assert_eq!(
            world.get::<Prototype>(leaf).unwrap(),
            Some(&Prototype::new(middle))
        );
        assert_eq!(world.get::<Prototype>(root).unwrap(), None);
        // the derived index belongs to each prototype alone
        assert!(world.get::<PrototypeDerived>(leaf).unwrap().is_none());
    }

    #[test]
    fn derived_index_tracks_children() {
        let mut world = World::new();
        let prototype = EntityBuilder::new().with(Health(10)).spawn(&mut world).unwrap();
        let children: Vec<_> = (0..3)
            .map(|_| {
                EntityBuilder::new()
                    .with_prototype(prototype)
                    .spawn(&mut world)
                    .unwrap()
            })
            .collect();

        let derived = world.derived_of(prototype).unwrap().unwrap();
        assert_eq!(derived.len(), 3);
        assert!(children.iter().all(|child| derived.has(*child)));
        assert!(world.is_prototype(prototype));

        world.despawn(children[0]).unwrap();
        world.despawn(children[1]).unwrap();

        let derived = world.derived_of(prototype).unwrap().unwrap();
        assert_eq!(derived.len(), 1);
        assert!(!derived.has(children[0]));
        assert!(!derived.has(children[1]));
        assert!(derived.has(children[2]));
    }

    #[test]
    fn derived_index_follows_retargeting() {
        let mut world = World::new();
        let a = world.spawn();
        let b = world.spawn();
        let child = EntityBuilder::new().with_prototype(a).spawn(&mut world).unwrap();
        assert!(world.derived_of(a).unwrap().unwrap().has(child));

        world.insert(child, Prototype::new(b)).unwrap();
        assert!(world.derived_of(a).unwrap().is_none());
        assert!(!world.is_prototype(a));
        assert!(world.derived_of(b).unwrap().unwrap().has(child));

        world.remove::<Prototype>(child).unwrap();
        assert!(world.derived_of(b).unwrap().is_none());
    }

    #[test]
    fn dangling_prototype_resolves_to_nothing() {
        let mut world = World::new();
        let prototype = EntityBuilder::new().with(Health(10)).spawn(&mut world).unwrap();
        let child = EntityBuilder::new()
            .with_prototype(prototype)
            .spawn(&mut world)
            .unwrap();
        world.despawn(prototype).unwrap();
        assert_eq!(world.get::<Health>(child).unwrap(), None);
        assert_eq!(
            world.get::<Prototype>(child).unwrap(),
            Some(&Prototype::new(prototype))
        );
    }
}
