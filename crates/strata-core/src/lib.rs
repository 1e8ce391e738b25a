//! Strata Core - Grid types shared by the Strata crates
//!
//! This crate provides the spatial vocabulary used throughout the engine:
//! - Block and chunk positions with floor-correct conversion between them
//! - The six grid directions
//! - Half-open block regions

pub mod error;
pub mod facing;
pub mod region;
pub mod types;

pub use error::CoreError;
pub use facing::Facing;
pub use glam::IVec3;
pub use region::BlockRegion;
pub use types::{BlockPos, ChunkPos, CHUNK_BITS, CHUNK_MASK, CHUNK_SIZE, CHUNK_VOLUME};
