//! Strata ECS - Entity Component System
//!
//! Entities are plain ids, components are any `'static + Clone + Debug` value
//! stored one-per-type per entity. An entity can name another as its
//! `Prototype` and read the prototype's components for types it does not
//! hold itself. Every write raises synchronous change events.

mod builder;
mod component;
mod entity;
mod error;
mod events;
mod prototype;
mod query;
mod world;

pub use builder::EntityBuilder;
pub use component::{AnyComponent, Component};
pub use entity::{Entity, EntityRegistry};
pub use error::EcsError;
pub use events::{ComponentEvent, ComponentHandler, EntityEvent, EntityHandler, GlobalComponentHandler};
pub use prototype::{Prototype, PrototypeDerived};
pub use query::{Entries, LookupMode};
pub use world::World;
