use crate::{
    backend::{BlockStore, CounterStore, SlotStore},
    error::{StoreError, StoreResult},
    local_store::LocalStore,
    slot_lifecycle::SlotTransition,
    types::{Block, Slot, SlotId},
};
use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Arc,
};

pub struct MockBackendInner {
    pub store: LocalStore,
    pub fail_block_insert: AtomicBool,
    pub fail_counter: AtomicBool,
    /// Number of slot inserts that succeed before every further one fails.
    pub slot_inserts_before_failure: AtomicUsize,
    pub fail_removals: AtomicBool,
    pub calls_to_insert_block: AtomicU64,
    pub calls_to_increment_and_get: AtomicU64,
    pub calls_to_insert_slot: AtomicU64,
    pub calls_to_remove_block_slots: AtomicU64,
    pub calls_to_remove_block: AtomicU64,
}

/// Wraps a `LocalStore` and fails selected operations on demand.
#[derive(Clone)]
pub struct MockBackend(pub Arc<MockBackendInner>);

impl MockBackendInner {
    fn new() -> Self {
        Self {
            store: LocalStore::default(),
            fail_block_insert: AtomicBool::new(false),
            fail_counter: AtomicBool::new(false),
            slot_inserts_before_failure: AtomicUsize::new(usize::MAX),
            fail_removals: AtomicBool::new(false),
            calls_to_insert_block: AtomicU64::default(),
            calls_to_increment_and_get: AtomicU64::default(),
            calls_to_insert_slot: AtomicU64::default(),
            calls_to_remove_block_slots: AtomicU64::default(),
            calls_to_remove_block: AtomicU64::default(),
        }
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self(Arc::new(MockBackendInner::new()))
    }

    pub fn store(&self) -> &LocalStore {
        &self.0.store
    }

    fn result(fail: &AtomicBool) -> StoreResult<()> {
        match fail.load(Ordering::SeqCst) {
            true => Err(StoreError::Unavailable("Supposed to fail".into())),
            false => Ok(()),
        }
    }
}

impl SlotStore for MockBackend {
    fn slots(&self) -> StoreResult<Vec<Slot>> {
        self.0.store.slots()
    }

    fn slot(&self, id: SlotId) -> StoreResult<Option<Slot>> {
        self.0.store.slot(id)
    }

    fn block_slots(&self, block_id: &str) -> StoreResult<Vec<Slot>> {
        self.0.store.block_slots(block_id)
    }

    fn insert_slot(&self, slot: &Slot) -> StoreResult<()> {
        self.0.calls_to_insert_slot.fetch_add(1, Ordering::SeqCst);
        let remaining = self.0.slot_inserts_before_failure.load(Ordering::SeqCst);
        if remaining == 0 {
            return Err(StoreError::Unavailable("Supposed to fail".into()));
        }
        if remaining != usize::MAX {
            self.0
                .slot_inserts_before_failure
                .store(remaining - 1, Ordering::SeqCst);
        }
        self.0.store.insert_slot(slot)
    }

    fn update_slot_if(
        &self,
        id: SlotId,
        transition: &SlotTransition,
    ) -> StoreResult<Option<Slot>> {
        self.0.store.update_slot_if(id, transition)
    }

    fn remove_block_slots(&self, block_id: &str) -> StoreResult<usize> {
        self.0
            .calls_to_remove_block_slots
            .fetch_add(1, Ordering::SeqCst);
        Self::result(&self.0.fail_removals)?;
        self.0.store.remove_block_slots(block_id)
    }
}

impl BlockStore for MockBackend {
    fn blocks(&self) -> StoreResult<Vec<Block>> {
        self.0.store.blocks()
    }

    fn block(&self, block_id: &str) -> StoreResult<Option<Block>> {
        self.0.store.block(block_id)
    }

    fn insert_block(&self, block: &Block) -> StoreResult<()> {
        self.0.calls_to_insert_block.fetch_add(1, Ordering::SeqCst);
        Self::result(&self.0.fail_block_insert)?;
        self.0.store.insert_block(block)
    }

    fn remove_block(&self, block_id: &str) -> StoreResult<bool> {
        self.0.calls_to_remove_block.fetch_add(1, Ordering::SeqCst);
        Self::result(&self.0.fail_removals)?;
        self.0.store.remove_block(block_id)
    }
}

impl CounterStore for MockBackend {
    fn increment_and_get(&self, key: &str, delta: i64) -> StoreResult<i64> {
        self.0
            .calls_to_increment_and_get
            .fetch_add(1, Ordering::SeqCst);
        Self::result(&self.0.fail_counter)?;
        self.0.store.increment_and_get(key, delta)
    }
}
