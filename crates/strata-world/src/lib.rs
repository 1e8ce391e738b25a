//! Strata World - Chunked block grid over the entity model
//!
//! Provides the chunk index, per-type dense or sparse block storage, the
//! synthesized `Block`/`Chunk` tags, and block and chunk views.

pub mod dense;
pub mod error;
pub mod manager;
pub mod storage;
pub mod tags;
pub mod view;

pub use dense::{ChunkArray, DenseValue};
pub use error::WorldError;
pub use manager::ChunkManager;
pub use storage::{DenseHandle, StorageKind, StorageRegistry};
pub use tags::{Block, CellEntities, Chunk, SyntheticTag};
pub use view::{BlockMut, BlockRef, ChunkMut, ChunkRef};
