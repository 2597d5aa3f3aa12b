//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the revision scripts under `migrations/`.
//! When a revision changes a table, update the matching block here.

diesel::table! {
    /// User accounts.
    users (id) {
        id -> Uuid,
        /// Lower-case, unique.
        email -> Varchar,
        /// Unique public handle.
        username -> Varchar,
        full_name -> Nullable<Varchar>,
        /// Argon2id PHC string.
        hashed_password -> Varchar,
        is_active -> Bool,
        is_superuser -> Bool,
        is_verified -> Bool,
        avatar_url -> Nullable<Varchar>,
        bio -> Nullable<Text>,
        extra_data -> Jsonb,
        created_at -> Timestamptz,
        /// Maintained by the `set_updated_at()` trigger.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Items owned by users; rows cascade when their owner is deleted.
    items (id) {
        id -> Uuid,
        title -> Varchar,
        description -> Nullable<Text>,
        /// `NUMERIC(10,2)`.
        price -> Nullable<Numeric>,
        currency -> Varchar,
        is_active -> Bool,
        category -> Nullable<Varchar>,
        tags -> Array<Text>,
        extra_data -> Jsonb,
        owner_id -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Stamped head revisions; one row per head of the applied graph.
    schema_revisions (version_num) {
        version_num -> Varchar,
    }
}

diesel::joinable!(items -> users (owner_id));

diesel::allow_tables_to_appear_in_same_query!(items, users);
