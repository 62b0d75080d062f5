use crate::schema::{blocks, slots};
use chrono::{DateTime, Utc};
use diesel::{Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};

pub type SlotId = i64;

#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Queryable, Selectable, Insertable,
)]
#[diesel(table_name = slots)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: SlotId,
    pub block_id: Option<String>,
    pub slot_date_time: DateTime<Utc>,
    pub reserved: bool,
    pub candidate_name: Option<String>,
    pub checked_in: bool,
}

/// Lifecycle state of a slot, derived from its `reserved` and `checked_in` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotState {
    Open,
    Reserved,
    CheckedIn,
}

impl Slot {
    /// A fresh, unreserved slot as produced by block generation.
    pub fn open(id: SlotId, block_id: Option<String>, slot_date_time: DateTime<Utc>) -> Self {
        Self {
            id,
            block_id,
            slot_date_time,
            reserved: false,
            candidate_name: None,
            checked_in: false,
        }
    }

    pub fn state(&self) -> SlotState {
        match (self.reserved, self.checked_in) {
            (false, _) => SlotState::Open,
            (true, false) => SlotState::Reserved,
            (true, true) => SlotState::CheckedIn,
        }
    }
}

#[derive(
    Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Queryable, Selectable, Insertable,
)]
#[diesel(table_name = blocks)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub block_id: String,
    pub interviewer_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    /// Minutes per slot.
    pub slot_length: i32,
}

/// Parameters of a block creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBlock {
    pub block_id: String,
    pub interviewer_name: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub slot_length: i32,
}

impl From<&NewBlock> for Block {
    fn from(request: &NewBlock) -> Self {
        Self {
            block_id: request.block_id.trim().to_string(),
            interviewer_name: request.interviewer_name.trim().to_string(),
            start_time: request.start_time,
            end_time: request.end_time,
            slot_length: request.slot_length,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockWithSlots {
    pub block: Block,
    pub slots: Vec<Slot>,
}
