use std::collections::HashSet;

use crate::component::{Component, ComponentMap};
use crate::entity::Entity;
use crate::prototype::PrototypeDerived;
use crate::world::World;

/// How `World::entries` treats values reachable through prototypes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LookupMode {
    /// Only values stored directly on an entity.
    #[default]
    Personal,
    /// Each entity holding its own value, overrides included, once. Entities
    /// that only inherit are left out; their ancestor's entry covers them.
    Concrete,
    /// The effective value of every entity that resolves one, templates included.
    All,
}

/// Iterator returned by `World::entries`. Yields `(Entity, &T)` once per entity.
pub struct Entries<'w, T> {
    inner: std::vec::IntoIter<(Entity, &'w T)>,
}

impl<'w, T> Iterator for Entries<'w, T> {
    type Item = (Entity, &'w T);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> ExactSizeIterator for Entries<'_, T> {}

impl World {
    /// Enumerate `(entity, value)` pairs of component type `T`.
    ///
    /// In `All` mode, every entity holding `T` directly also contributes its
    /// value to each entity deriving from it, recursively, until a derived
    /// entity that holds its own `T` is reached. That entity contributes its
    /// own value instead.
    pub fn entries<T: Component>(&self, mode: LookupMode) -> Entries<'_, T> {
        let Some(storage) = self.storage::<T>() else {
            return Entries {
                inner: Vec::new().into_iter(),
            };
        };

        let mut out: Vec<(Entity, &T)> = Vec::with_capacity(storage.len());
        match mode {
            LookupMode::Personal | LookupMode::Concrete => out.extend(storage.iter()),
            LookupMode::All => {
                let inherit = !self.is_personal_only::<T>();
                let mut visited = HashSet::new();
                for (entity, value) in storage.iter() {
                    if visited.insert(entity) {
                        out.push((entity, value));
                    }
                    if inherit {
                        self.collect_derived(entity, value, storage, &mut visited, &mut out);
                    }
                }
            }
        }
        Entries {
            inner: out.into_iter(),
        }
    }

    /// Walk the derived graph below `source`, tagging every non-overriding
    /// descendant with `value`.
    fn collect_derived<'w, T: Component>(
        &'w self,
        source: Entity,
        value: &'w T,
        storage: &ComponentMap<T>,
        visited: &mut HashSet<Entity>,
        out: &mut Vec<(Entity, &'w T)>,
    ) {
        let Some(index) = self.storage::<PrototypeDerived>() else {
            return;
        };
        let mut stack = vec![source];
        while let Some(parent) = stack.pop() {
            let Some(derived) = index.get(parent) else {
                continue;
            };
            for child in derived.iter() {
                // an override is reported when its own holder is visited
                if storage.contains(child) || !visited.insert(child) {
                    continue;
                }
                out.push((child, value));
                stack.push(child);
            }
        }
    }
}
