use strata_ecs::EcsError;

/// Errors raised by the block grid.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    #[error(transparent)]
    Ecs(#[from] EcsError),

    #[error("dense storage for {type_name} is already registered")]
    DuplicateRegistration { type_name: &'static str },

    #[error("{type_name} is derived from the grid position and cannot be written")]
    InvalidMutation { type_name: &'static str },

    #[error("chunk-relative {axis} coordinate {value} is outside 0..16")]
    OutOfRange { axis: char, value: i32 },
}
