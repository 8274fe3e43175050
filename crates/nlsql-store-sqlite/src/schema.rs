//! SQL DDL for the knowledge store and the relational database.

/// Knowledge store schema; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const KNOWLEDGE_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Documents are insert-or-ignore on id and never updated.
CREATE TABLE IF NOT EXISTS knowledge_documents (
    id            TEXT PRIMARY KEY,
    content       TEXT NOT NULL,
    metadata_json TEXT NOT NULL DEFAULT '{}',  -- flattened, scalar-only
    kind          TEXT,                        -- copy of metadata.type
    embedding     BLOB NOT NULL,               -- little-endian f32s
    dimensions    INTEGER NOT NULL,
    embedder      TEXT NOT NULL,
    created_at    TEXT NOT NULL                -- ISO 8601 UTC
);

CREATE INDEX IF NOT EXISTS knowledge_kind_idx ON knowledge_documents(kind);

PRAGMA user_version = 1;
";

/// Audit log of generated statements, kept in the relational database.
pub const HISTORY_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS query_history (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    natural_query TEXT NOT NULL,
    generated_sql TEXT NOT NULL,
    status        VARCHAR(16) NOT NULL DEFAULT 'success',
    created_at    TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
";

/// Sample `users` / `orders` tables.
pub const SAMPLE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS users (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    name       VARCHAR(100),
    email      VARCHAR(100),
    age        INTEGER,
    city       VARCHAR(50)
);

CREATE TABLE IF NOT EXISTS orders (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id    INTEGER REFERENCES users(id),
    product    VARCHAR(100),
    amount     DECIMAL(10,2),
    order_date DATE
);
";

/// Rows inserted by `seed_sample_data` when `users` is empty.
pub const SAMPLE_ROWS: &str = "
INSERT INTO users (name, email, age, city) VALUES
    ('John Doe',    'john@email.com', 25, 'New York'),
    ('Jane Smith',  'jane@email.com', 30, 'Los Angeles'),
    ('Bob Johnson', 'bob@email.com',  35, 'Chicago');

INSERT INTO orders (user_id, product, amount, order_date) VALUES
    (1, 'Laptop', 999.99, '2024-01-15'),
    (2, 'Phone',  599.99, '2024-01-16'),
    (1, 'Mouse',   29.99, '2024-01-17');
";
