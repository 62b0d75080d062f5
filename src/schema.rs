diesel::table! {
    slots (id) {
        id -> Int8,
        block_id -> Nullable<Text>,
        slot_date_time -> Timestamptz,
        reserved -> Bool,
        candidate_name -> Nullable<Text>,
        checked_in -> Bool,
    }
}

diesel::table! {
    blocks (block_id) {
        block_id -> Text,
        interviewer_name -> Text,
        start_time -> Timestamptz,
        end_time -> Timestamptz,
        slot_length -> Int4,
    }
}

diesel::table! {
    id_counters (name) {
        name -> Text,
        next_value -> Int8,
    }
}

diesel::allow_tables_to_appear_in_same_query!(slots, blocks, id_counters);
