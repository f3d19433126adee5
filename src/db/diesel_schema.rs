// Table definitions matching the DDL in `schema.rs`.

diesel::table! {
    votings (id) {
        id -> Text,
        voter_type -> Text,
        voter_id -> Text,
        voteable_type -> Text,
        voteable_id -> Text,
        up_vote -> Bool,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    vote_counters (role, participant_type, participant_id) {
        role -> Text,
        participant_type -> Text,
        participant_id -> Text,
        up_votes -> BigInt,
        down_votes -> BigInt,
        updated_at -> Text,
    }
}

diesel::table! {
    schema_version (version) {
        version -> Integer,
    }
}
