use crate::types::SlotId;
use thiserror::Error;

/// Failures reported by a persistence backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("duplicate record: {0}")]
    Duplicate(String),

    /// The store could not complete the operation. A write that fails this way
    /// has an unknown outcome.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Every non-success outcome of a scheduling operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulingError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("slot {0} not found")]
    SlotNotFound(SlotId),

    #[error("block {0} not found")]
    BlockNotFound(String),

    #[error("slot {0} is already reserved")]
    AlreadyReserved(SlotId),

    #[error("slot {0} is not reserved")]
    NotReserved(SlotId),

    #[error("candidate of slot {0} is already checked in")]
    AlreadyCheckedIn(SlotId),

    #[error("block with id {0} already exists")]
    DuplicateBlock(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// Slot ids could not be allocated for a new block. The block record was
    /// deleted again unless `rollback_complete` is false.
    #[error("failed to allocate slot ids for block {block_id}: {reason}")]
    AllocationFailed {
        block_id: String,
        reason: String,
        rollback_complete: bool,
    },

    /// A slot of a new block could not be persisted. Already persisted slots and
    /// the block record were deleted again unless `rollback_complete` is false.
    #[error("failed to persist slots of block {block_id}: {reason}")]
    SlotPersistFailed {
        block_id: String,
        reason: String,
        rollback_complete: bool,
    },
}

impl SchedulingError {
    /// Legitimate state conflicts; retrying makes sense after re-reading state.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyReserved(_)
                | Self::NotReserved(_)
                | Self::AlreadyCheckedIn(_)
                | Self::DuplicateBlock(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SlotNotFound(_) | Self::BlockNotFound(_))
    }

    /// Whether the same request may succeed when sent again unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StoreUnavailable(_) | Self::AllocationFailed { .. } | Self::SlotPersistFailed { .. }
        )
    }
}

impl From<StoreError> for SchedulingError {
    fn from(err: StoreError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}
