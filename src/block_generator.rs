use crate::backend::Backend;
use crate::error::{SchedulingError, StoreError};
use crate::id_allocator::IdAllocator;
use crate::types::{Block, BlockWithSlots, NewBlock, Slot};
use chrono::{DateTime, Duration, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{error, info, warn};

lazy_static! {
    static ref BLOCK_ID_PATTERN: Regex = Regex::new(r"^[A-Za-z0-9_.\-]{1,64}$").unwrap();
}

pub fn is_valid_block_id(block_id: &str) -> bool {
    BLOCK_ID_PATTERN.is_match(block_id)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockPolicy {
    /// Accept `start_time == end_time` and create a block without slots.
    pub allow_empty_blocks: bool,
    pub max_slots_per_block: usize,
}

impl Default for BlockPolicy {
    fn default() -> Self {
        Self {
            allow_empty_blocks: false,
            max_slots_per_block: 500,
        }
    }
}

/// Number of slots of length `slot_length` starting in `[start, end)`.
pub fn slot_count(start: DateTime<Utc>, end: DateTime<Utc>, slot_length: Duration) -> usize {
    let window = (end - start).num_milliseconds();
    let step = slot_length.num_milliseconds();
    if window <= 0 || step <= 0 {
        return 0;
    }
    ((window + step - 1) / step) as usize
}

/// Start instants `start, start + slot_length, ...` strictly before `end`.
pub fn slot_times(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    slot_length: Duration,
) -> Vec<DateTime<Utc>> {
    let mut times = Vec::with_capacity(slot_count(start, end, slot_length));
    if slot_length <= Duration::zero() {
        return times;
    }
    let mut current = start;
    while current < end {
        times.push(current);
        current = current + slot_length;
    }
    times
}

/// Creates a block and its slots as one logical unit.
///
/// The store offers single-record atomicity only, so a failure after the block
/// record was written is compensated by deleting what was written. The
/// compensation is best effort: if a delete fails too, the returned error
/// reports `rollback_complete: false`. Allocated ids are never reclaimed.
#[derive(Debug, Clone)]
pub struct BlockGenerator<B> {
    backend: B,
    ids: IdAllocator<B>,
    policy: BlockPolicy,
}

impl<B: Backend> BlockGenerator<B> {
    pub fn new(backend: B, policy: BlockPolicy) -> Self {
        Self {
            ids: IdAllocator::new(backend.clone()),
            backend,
            policy,
        }
    }

    pub fn create_block(&self, request: &NewBlock) -> Result<BlockWithSlots, SchedulingError> {
        let block = Block::from(request);
        let times = self.validate(&block)?;

        if let Err(err) = self.backend.insert_block(&block) {
            return Err(match err {
                StoreError::Duplicate(_) => {
                    warn!(block_id = %block.block_id, "Block already exists");
                    SchedulingError::DuplicateBlock(block.block_id)
                }
                err => {
                    error!(?err, block_id = %block.block_id, "Failed to persist block");
                    err.into()
                }
            });
        }

        let slots = if times.is_empty() {
            Vec::new()
        } else {
            let range = match self.ids.allocate(times.len()) {
                Ok(range) => range,
                Err(err) => {
                    let rollback_complete = self.roll_back(&block.block_id, false);
                    return Err(SchedulingError::AllocationFailed {
                        block_id: block.block_id,
                        reason: err.to_string(),
                        rollback_complete,
                    });
                }
            };

            let mut slots = Vec::with_capacity(times.len());
            for (id, time) in range.ids().zip(times) {
                let slot = Slot::open(id, Some(block.block_id.clone()), time);
                if let Err(err) = self.backend.insert_slot(&slot) {
                    error!(?err, block_id = %block.block_id, slot_id = id, "Failed to persist slot");
                    let rollback_complete = self.roll_back(&block.block_id, true);
                    return Err(SchedulingError::SlotPersistFailed {
                        block_id: block.block_id,
                        reason: err.to_string(),
                        rollback_complete,
                    });
                }
                slots.push(slot);
            }
            slots
        };

        info!(
            block_id = %block.block_id,
            interviewer = %block.interviewer_name,
            slots = slots.len(),
            "Block created"
        );
        Ok(BlockWithSlots { block, slots })
    }

    fn validate(&self, block: &Block) -> Result<Vec<DateTime<Utc>>, SchedulingError> {
        if block.block_id.is_empty() {
            return Err(SchedulingError::InvalidInput("blockId is required".into()));
        }
        if !is_valid_block_id(&block.block_id) {
            return Err(SchedulingError::InvalidInput(
                "blockId may only contain letters, digits, '_', '.' and '-' (at most 64)".into(),
            ));
        }
        if block.interviewer_name.is_empty() {
            return Err(SchedulingError::InvalidInput(
                "interviewerName is required".into(),
            ));
        }
        if block.slot_length <= 0 {
            return Err(SchedulingError::InvalidInput(
                "slotLength must be a positive number".into(),
            ));
        }
        let empty_allowed =
            self.policy.allow_empty_blocks && block.start_time == block.end_time;
        if block.start_time >= block.end_time && !empty_allowed {
            return Err(SchedulingError::InvalidInput(
                "endTime must be after startTime".into(),
            ));
        }

        let slot_length = Duration::minutes(i64::from(block.slot_length));
        let count = slot_count(block.start_time, block.end_time, slot_length);
        if count > self.policy.max_slots_per_block {
            return Err(SchedulingError::InvalidInput(format!(
                "window would produce {count} slots, at most {} are allowed",
                self.policy.max_slots_per_block
            )));
        }
        Ok(slot_times(block.start_time, block.end_time, slot_length))
    }

    /// Compensating deletes. Returns whether every delete succeeded.
    fn roll_back(&self, block_id: &str, slots_written: bool) -> bool {
        let mut complete = true;
        if slots_written {
            match self.backend.remove_block_slots(block_id) {
                Ok(removed) => warn!(block_id, removed, "Rolled back slots of failed block"),
                Err(err) => {
                    error!(?err, block_id, "Failed to roll back slots of failed block");
                    complete = false;
                }
            }
        }
        match self.backend.remove_block(block_id) {
            Ok(_) => warn!(block_id, "Rolled back failed block"),
            Err(err) => {
                error!(?err, block_id, "Failed to roll back failed block");
                complete = false;
            }
        }
        complete
    }
}
