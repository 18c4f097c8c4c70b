use rusqlite::Connection;
use tracing::info;

use crate::StoreError;

pub fn run(conn: &Connection) -> Result<(), StoreError> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (items table)");
        conn.execute_batch(
            "
            CREATE TABLE items (
                pk          TEXT NOT NULL,
                sk          TEXT NOT NULL,
                body        TEXT NOT NULL,
                expires_at  INTEGER,
                PRIMARY KEY (pk, sk)
            ) WITHOUT ROWID;

            CREATE INDEX idx_items_expires_at
                ON items(expires_at) WHERE expires_at IS NOT NULL;

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    Ok(())
}
