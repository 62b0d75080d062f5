use crate::backend::{BlockStore, CounterStore, SlotStore};
use crate::error::{StoreError, StoreResult};
use crate::schema::{blocks, id_counters, slots};
use crate::slot_lifecycle::SlotTransition;
use crate::types::{Block, Slot, SlotId};
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::time::Duration;
use tracing::error;

type PgPool = Pool<ConnectionManager<PgConnection>>;

/// How long `new` and each checkout wait for a connection before giving up.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(2);

impl From<DieselError> for StoreError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                StoreError::Duplicate(info.message().to_string())
            }
            err => StoreError::Unavailable(err.to_string()),
        }
    }
}

/// PostgreSQL backend. Each operation is a single statement, so conditional
/// updates and counter increments are atomic on the database side.
#[derive(Clone)]
pub struct DatabaseInterface {
    pool: PgPool,
}

impl DatabaseInterface {
    pub fn new(database_url: &str, pool_size: u32) -> StoreResult<Self> {
        let manager = ConnectionManager::<PgConnection>::new(database_url);
        let pool = Pool::builder()
            .max_size(pool_size)
            .connection_timeout(CONNECTION_TIMEOUT)
            .build(manager)
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;
        Ok(Self { pool })
    }

    fn connection(&self) -> StoreResult<PooledConnection<ConnectionManager<PgConnection>>> {
        self.pool.get().map_err(|err| {
            error!(?err, "Failed to get database connection");
            StoreError::Unavailable(err.to_string())
        })
    }
}

impl SlotStore for DatabaseInterface {
    fn slots(&self) -> StoreResult<Vec<Slot>> {
        let mut connection = self.connection()?;
        Ok(slots::table
            .order(slots::id.asc())
            .select(Slot::as_select())
            .load(&mut connection)?)
    }

    fn slot(&self, id: SlotId) -> StoreResult<Option<Slot>> {
        let mut connection = self.connection()?;
        Ok(slots::table
            .find(id)
            .select(Slot::as_select())
            .first(&mut connection)
            .optional()?)
    }

    fn block_slots(&self, block_id: &str) -> StoreResult<Vec<Slot>> {
        let mut connection = self.connection()?;
        Ok(slots::table
            .filter(slots::block_id.eq(block_id))
            .order(slots::id.asc())
            .select(Slot::as_select())
            .load(&mut connection)?)
    }

    fn insert_slot(&self, slot: &Slot) -> StoreResult<()> {
        let mut connection = self.connection()?;
        diesel::insert_into(slots::table)
            .values(slot)
            .execute(&mut connection)?;
        Ok(())
    }

    fn update_slot_if(
        &self,
        id: SlotId,
        transition: &SlotTransition,
    ) -> StoreResult<Option<Slot>> {
        let mut connection = self.connection()?;
        let target = slots::table.filter(slots::id.eq(id));
        let updated = match transition {
            SlotTransition::Reserve { candidate_name } => {
                diesel::update(target.filter(slots::reserved.eq(false)))
                    .set((
                        slots::reserved.eq(true),
                        slots::candidate_name.eq(Some(candidate_name.as_str())),
                        slots::checked_in.eq(false),
                    ))
                    .returning(Slot::as_returning())
                    .get_result(&mut connection)
            }
            SlotTransition::CheckIn => diesel::update(
                target
                    .filter(slots::reserved.eq(true))
                    .filter(slots::checked_in.eq(false)),
            )
            .set(slots::checked_in.eq(true))
            .returning(Slot::as_returning())
            .get_result(&mut connection),
            SlotTransition::Cancel => diesel::update(target.filter(slots::reserved.eq(true)))
                .set((
                    slots::reserved.eq(false),
                    slots::candidate_name.eq(None::<String>),
                    slots::checked_in.eq(false),
                ))
                .returning(Slot::as_returning())
                .get_result(&mut connection),
        };
        Ok(updated.optional()?)
    }

    fn remove_block_slots(&self, block_id: &str) -> StoreResult<usize> {
        let mut connection = self.connection()?;
        Ok(diesel::delete(slots::table.filter(slots::block_id.eq(block_id)))
            .execute(&mut connection)?)
    }
}

impl BlockStore for DatabaseInterface {
    fn blocks(&self) -> StoreResult<Vec<Block>> {
        let mut connection = self.connection()?;
        Ok(blocks::table
            .order(blocks::block_id.asc())
            .select(Block::as_select())
            .load(&mut connection)?)
    }

    fn block(&self, block_id: &str) -> StoreResult<Option<Block>> {
        let mut connection = self.connection()?;
        Ok(blocks::table
            .find(block_id)
            .select(Block::as_select())
            .first(&mut connection)
            .optional()?)
    }

    fn insert_block(&self, block: &Block) -> StoreResult<()> {
        let mut connection = self.connection()?;
        diesel::insert_into(blocks::table)
            .values(block)
            .execute(&mut connection)?;
        Ok(())
    }

    fn remove_block(&self, block_id: &str) -> StoreResult<bool> {
        let mut connection = self.connection()?;
        let removed = diesel::delete(blocks::table.find(block_id)).execute(&mut connection)?;
        Ok(removed > 0)
    }
}

impl CounterStore for DatabaseInterface {
    fn increment_and_get(&self, key: &str, delta: i64) -> StoreResult<i64> {
        let mut connection = self.connection()?;
        let next_value: i64 = diesel::insert_into(id_counters::table)
            .values((
                id_counters::name.eq(key),
                id_counters::next_value.eq(1 + delta),
            ))
            .on_conflict(id_counters::name)
            .do_update()
            .set(id_counters::next_value.eq(id_counters::next_value + delta))
            .returning(id_counters::next_value)
            .get_result(&mut connection)?;
        Ok(next_value - delta)
    }
}
