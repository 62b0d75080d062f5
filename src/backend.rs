use crate::error::StoreResult;
use crate::slot_lifecycle::SlotTransition;
use crate::types::{Block, Slot, SlotId};

pub trait SlotStore: Send + Sync + 'static {
    /// All slots, ordered by ascending id.
    fn slots(&self) -> StoreResult<Vec<Slot>>;
    fn slot(&self, id: SlotId) -> StoreResult<Option<Slot>>;
    /// Slots of one block, ordered by ascending id.
    fn block_slots(&self, block_id: &str) -> StoreResult<Vec<Slot>>;
    /// Fails with `StoreError::Duplicate` if the id is taken.
    fn insert_slot(&self, slot: &Slot) -> StoreResult<()>;
    /// Applies `transition` only if its precondition holds for the current record,
    /// as one indivisible step. `None` if no record matched.
    fn update_slot_if(&self, id: SlotId, transition: &SlotTransition)
        -> StoreResult<Option<Slot>>;
    fn remove_block_slots(&self, block_id: &str) -> StoreResult<usize>;
}

pub trait BlockStore: Send + Sync + 'static {
    /// All blocks, ordered by block id.
    fn blocks(&self) -> StoreResult<Vec<Block>>;
    fn block(&self, block_id: &str) -> StoreResult<Option<Block>>;
    /// Fails with `StoreError::Duplicate` if the block id is taken.
    fn insert_block(&self, block: &Block) -> StoreResult<()>;
    fn remove_block(&self, block_id: &str) -> StoreResult<bool>;
}

pub trait CounterStore: Send + Sync + 'static {
    /// Atomically adds `delta` to the named counter and returns its value from
    /// before the increment. A missing counter starts at 1.
    fn increment_and_get(&self, key: &str, delta: i64) -> StoreResult<i64>;
}

pub trait Backend: SlotStore + BlockStore + CounterStore + Clone {}

impl<T> Backend for T where T: SlotStore + BlockStore + CounterStore + Clone {}
