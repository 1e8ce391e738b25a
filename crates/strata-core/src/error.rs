use thiserror::Error;

use crate::types::BlockPos;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("region max ({max}) is smaller than min ({min})")]
    InvertedRegion { min: BlockPos, max: BlockPos },
}
