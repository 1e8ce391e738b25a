use thiserror::Error;

use crate::entity::Entity;

/// Errors raised by entity and component operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    #[error("{0} does not exist")]
    EntityNotFound(Entity),

    #[error("{type_name} on {entity} was removed by a handler while it was being inserted")]
    InsertionInterrupted {
        entity: Entity,
        type_name: &'static str,
    },
}
