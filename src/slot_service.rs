use crate::backend::Backend;
use crate::block_generator::{BlockGenerator, BlockPolicy};
use crate::error::SchedulingError;
use crate::slot_lifecycle::SlotLifecycle;
use crate::types::{Block, BlockWithSlots, NewBlock, Slot, SlotId};

/// Operations offered to the request layer.
#[cfg_attr(test, mockall::automock)]
pub trait SlotService: Send + Sync + 'static {
    /// All slots, ordered by ascending id.
    fn list_slots(&self) -> Result<Vec<Slot>, SchedulingError>;
    fn get_slot(&self, id: SlotId) -> Result<Slot, SchedulingError>;
    fn reserve_slot(&self, id: SlotId, candidate_name: String) -> Result<Slot, SchedulingError>;
    fn check_in_slot(&self, id: SlotId) -> Result<Slot, SchedulingError>;
    fn cancel_slot(&self, id: SlotId) -> Result<Slot, SchedulingError>;
    fn create_block(&self, request: NewBlock) -> Result<BlockWithSlots, SchedulingError>;
    fn list_blocks(&self) -> Result<Vec<Block>, SchedulingError>;
    fn get_block(&self, block_id: String) -> Result<BlockWithSlots, SchedulingError>;
}

#[derive(Debug, Clone)]
pub struct Scheduler<B> {
    backend: B,
    lifecycle: SlotLifecycle<B>,
    generator: BlockGenerator<B>,
}

impl<B: Backend> Scheduler<B> {
    pub fn new(backend: B, policy: BlockPolicy) -> Self {
        Self {
            lifecycle: SlotLifecycle::new(backend.clone()),
            generator: BlockGenerator::new(backend.clone(), policy),
            backend,
        }
    }
}

impl<B: Backend> SlotService for Scheduler<B> {
    fn list_slots(&self) -> Result<Vec<Slot>, SchedulingError> {
        Ok(self.backend.slots()?)
    }

    fn get_slot(&self, id: SlotId) -> Result<Slot, SchedulingError> {
        self.backend
            .slot(id)?
            .ok_or(SchedulingError::SlotNotFound(id))
    }

    fn reserve_slot(&self, id: SlotId, candidate_name: String) -> Result<Slot, SchedulingError> {
        self.lifecycle.reserve(id, &candidate_name)
    }

    fn check_in_slot(&self, id: SlotId) -> Result<Slot, SchedulingError> {
        self.lifecycle.check_in(id)
    }

    fn cancel_slot(&self, id: SlotId) -> Result<Slot, SchedulingError> {
        self.lifecycle.cancel(id)
    }

    fn create_block(&self, request: NewBlock) -> Result<BlockWithSlots, SchedulingError> {
        self.generator.create_block(&request)
    }

    fn list_blocks(&self) -> Result<Vec<Block>, SchedulingError> {
        Ok(self.backend.blocks()?)
    }

    fn get_block(&self, block_id: String) -> Result<BlockWithSlots, SchedulingError> {
        let block = self
            .backend
            .block(&block_id)?
            .ok_or(SchedulingError::BlockNotFound(block_id))?;
        let slots = self.backend.block_slots(&block.block_id)?;
        Ok(BlockWithSlots { block, slots })
    }
}
