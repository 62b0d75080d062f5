use crate::backend::CounterStore;
use crate::error::SchedulingError;
use crate::types::SlotId;
use tracing::{debug, error};

/// Name of the persisted counter that hands out slot ids.
pub const SLOT_ID_COUNTER: &str = "seq";

/// A contiguous range of ids owned exclusively by one caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdRange {
    pub start: SlotId,
    pub count: usize,
}

impl IdRange {
    pub fn ids(&self) -> impl Iterator<Item = SlotId> {
        (self.start..).take(self.count)
    }
}

/// Reserves id ranges through a single atomic increment of a persisted counter.
/// Ranges of abandoned allocations are never handed out again.
#[derive(Debug, Clone)]
pub struct IdAllocator<C> {
    counter: C,
    key: String,
}

impl<C: CounterStore> IdAllocator<C> {
    pub fn new(counter: C) -> Self {
        Self::with_key(counter, SLOT_ID_COUNTER)
    }

    pub fn with_key(counter: C, key: impl Into<String>) -> Self {
        Self {
            counter,
            key: key.into(),
        }
    }

    pub fn allocate(&self, count: usize) -> Result<IdRange, SchedulingError> {
        if count == 0 {
            return Err(SchedulingError::InvalidInput(
                "id allocation count must be positive".into(),
            ));
        }
        let delta = i64::try_from(count).map_err(|_| {
            SchedulingError::InvalidInput(format!("cannot allocate {count} ids at once"))
        })?;

        let start = self
            .counter
            .increment_and_get(&self.key, delta)
            .map_err(|err| {
                error!(?err, counter = %self.key, count, "Id allocation failed");
                SchedulingError::from(err)
            })?;
        debug!(counter = %self.key, start, count, "Allocated id range");
        Ok(IdRange { start, count })
    }
}
