//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Update both
//! together; `diesel print-schema` can regenerate this file from a live
//! database.

diesel::table! {
    /// Idempotency leases, one row per `(operation, idempotency_key)`.
    idempotency_leases (operation, idempotency_key) {
        /// Guarded operation name, e.g. `CreateOrder`.
        operation -> Varchar,
        /// Client-supplied key (max 255 characters).
        idempotency_key -> Varchar,
        /// SHA-256 digest of the canonical payload (32 bytes).
        payload_hash -> Bytea,
        /// 0 = processing, 1 = succeeded, 2 = failed.
        status -> Int2,
        /// Recorded HTTP status; set only when succeeded.
        response_status_code -> Nullable<Int4>,
        /// Recorded response body; set only when succeeded.
        response_body -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        /// Rows with `expires_at <= now` are swept.
        expires_at -> Timestamptz,
    }
}

diesel::table! {
    /// Orders created through the guarded use case.
    orders (id) {
        id -> Uuid,
        /// Natural key, unique (max 64 characters).
        order_number -> Varchar,
        amount_cents -> Int8,
        created_at -> Timestamptz,
    }
}
