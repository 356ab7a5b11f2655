/// DDL for the three tables the engine touches. The wider relational schema
/// (users, order history, etc.) belongs to the catalog service; only what the
/// two read queries and two writes need lives here.

pub const CREATE_ITEMS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS items (
        id          BIGSERIAL PRIMARY KEY,
        sku         TEXT NOT NULL UNIQUE,
        title       TEXT NOT NULL,
        category    TEXT NOT NULL,
        price       BIGINT NOT NULL,
        stock       INTEGER NOT NULL DEFAULT 0,
        metadata    JSONB,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    );
    CREATE INDEX IF NOT EXISTS idx_items_category ON items (category);
";

pub const CREATE_EVENTS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS events (
        id          BIGSERIAL PRIMARY KEY,
        user_id     BIGINT NOT NULL,
        item_id     BIGINT NOT NULL,
        event_type  TEXT NOT NULL,
        session_id  TEXT NOT NULL DEFAULT '',
        metadata    JSONB,
        timestamp   TIMESTAMPTZ NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_events_user_id ON events (user_id);
";

pub const CREATE_MODELS_TABLE: &str = "
    CREATE TABLE IF NOT EXISTS models (
        id          BIGSERIAL PRIMARY KEY,
        model_name  TEXT NOT NULL,
        version     TEXT NOT NULL,
        model_type  TEXT NOT NULL,
        metrics     JSONB NOT NULL,
        config      JSONB NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL DEFAULT now()
    );
";

/// Statements in application order
pub const STATEMENTS: [&str; 3] = [
    CREATE_ITEMS_TABLE,
    CREATE_EVENTS_TABLE,
    CREATE_MODELS_TABLE,
];
