use crate::backend::{BlockStore, CounterStore, SlotStore};
use crate::error::{StoreError, StoreResult};
use crate::slot_lifecycle::SlotTransition;
use crate::types::{Block, Slot, SlotId};
use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard},
};

/// Non-persistent backend. Every operation holds one lock for its whole
/// read-modify-write, which gives the same single-record atomicity a database
/// provides.
#[derive(Debug, Clone, Default)]
pub struct LocalStore {
    slots: Arc<Mutex<BTreeMap<SlotId, Slot>>>,
    blocks: Arc<Mutex<BTreeMap<String, Block>>>,
    counters: Arc<Mutex<HashMap<String, i64>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> StoreResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("local store lock poisoned".into()))
}

impl SlotStore for LocalStore {
    fn slots(&self) -> StoreResult<Vec<Slot>> {
        Ok(lock(&self.slots)?.values().cloned().collect())
    }

    fn slot(&self, id: SlotId) -> StoreResult<Option<Slot>> {
        Ok(lock(&self.slots)?.get(&id).cloned())
    }

    fn block_slots(&self, block_id: &str) -> StoreResult<Vec<Slot>> {
        Ok(lock(&self.slots)?
            .values()
            .filter(|slot| slot.block_id.as_deref() == Some(block_id))
            .cloned()
            .collect())
    }

    fn insert_slot(&self, slot: &Slot) -> StoreResult<()> {
        let mut slots = lock(&self.slots)?;
        if slots.contains_key(&slot.id) {
            return Err(StoreError::Duplicate(format!("slot id {}", slot.id)));
        }
        slots.insert(slot.id, slot.clone());
        Ok(())
    }

    fn update_slot_if(
        &self,
        id: SlotId,
        transition: &SlotTransition,
    ) -> StoreResult<Option<Slot>> {
        let mut slots = lock(&self.slots)?;
        match slots.get_mut(&id) {
            Some(slot) if transition.permits(slot) => {
                transition.apply(slot);
                Ok(Some(slot.clone()))
            }
            _ => Ok(None),
        }
    }

    fn remove_block_slots(&self, block_id: &str) -> StoreResult<usize> {
        let mut slots = lock(&self.slots)?;
        let before = slots.len();
        slots.retain(|_, slot| slot.block_id.as_deref() != Some(block_id));
        Ok(before - slots.len())
    }
}

impl BlockStore for LocalStore {
    fn blocks(&self) -> StoreResult<Vec<Block>> {
        Ok(lock(&self.blocks)?.values().cloned().collect())
    }

    fn block(&self, block_id: &str) -> StoreResult<Option<Block>> {
        Ok(lock(&self.blocks)?.get(block_id).cloned())
    }

    fn insert_block(&self, block: &Block) -> StoreResult<()> {
        let mut blocks = lock(&self.blocks)?;
        if blocks.contains_key(&block.block_id) {
            return Err(StoreError::Duplicate(format!("block id {}", block.block_id)));
        }
        blocks.insert(block.block_id.clone(), block.clone());
        Ok(())
    }

    fn remove_block(&self, block_id: &str) -> StoreResult<bool> {
        Ok(lock(&self.blocks)?.remove(block_id).is_some())
    }
}

impl CounterStore for LocalStore {
    fn increment_and_get(&self, key: &str, delta: i64) -> StoreResult<i64> {
        let mut counters = lock(&self.counters)?;
        let next_value = counters.entry(key.to_string()).or_insert(1);
        let previous = *next_value;
        *next_value = previous
            .checked_add(delta)
            .ok_or_else(|| StoreError::Unavailable(format!("counter {key} overflowed")))?;
        Ok(previous)
    }
}
