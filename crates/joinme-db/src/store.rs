use chrono::{DateTime, TimeZone, Utc};
use rusqlite::{OptionalExtension, Row, params};

use crate::{Database, StoreError};

/// One row of the keyed store. `body` is the JSON-encoded record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    pub pk: String,
    pub sk: String,
    pub body: String,
    /// Store-side expiry. Rows past it are reaped eventually, not immediately.
    pub expires_at: Option<DateTime<Utc>>,
}

/// Generic ordered keyed store: a partition key selects a group of rows, the
/// sort key orders them and can be scanned by prefix.
///
/// Every call is a single logical read or write against the store's native
/// per-row atomicity; `batch_put` is the only multi-row write.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, pk: &str, sk: &str) -> Result<Option<Item>, StoreError>;

    fn put(&self, item: &Item) -> Result<(), StoreError>;

    fn batch_put(&self, items: &[Item]) -> Result<(), StoreError>;

    /// Deleting a missing row is not an error.
    fn delete(&self, pk: &str, sk: &str) -> Result<(), StoreError>;

    /// All rows in `pk` whose sort key starts with `sk_prefix`, ordered by sort key.
    fn query_prefix(&self, pk: &str, sk_prefix: &str) -> Result<Vec<Item>, StoreError>;

    /// Returns the number of rows removed.
    fn delete_prefix(&self, pk: &str, sk_prefix: &str) -> Result<usize, StoreError>;

    /// Removes rows whose expiry is before `now`. Returns the number removed.
    fn reap_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError>;
}

const UPSERT: &str = "INSERT INTO items (pk, sk, body, expires_at) VALUES (?1, ?2, ?3, ?4)
     ON CONFLICT (pk, sk) DO UPDATE SET body = excluded.body, expires_at = excluded.expires_at";

impl KeyValueStore for Database {
    fn get(&self, pk: &str, sk: &str) -> Result<Option<Item>, StoreError> {
        self.with_conn(|conn| {
            let item = conn
                .query_row(
                    "SELECT pk, sk, body, expires_at FROM items WHERE pk = ?1 AND sk = ?2",
                    params![pk, sk],
                    item_from_row,
                )
                .optional()?;
            Ok(item)
        })
    }

    fn put(&self, item: &Item) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute(
                UPSERT,
                params![item.pk, item.sk, item.body, item.expires_at.map(to_millis)],
            )?;
            Ok(())
        })
    }

    fn batch_put(&self, items: &[Item]) -> Result<(), StoreError> {
        if items.is_empty() {
            return Ok(());
        }

        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            {
                let mut stmt = tx.prepare_cached(UPSERT)?;
                for item in items {
                    stmt.execute(params![
                        item.pk,
                        item.sk,
                        item.body,
                        item.expires_at.map(to_millis)
                    ])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    fn delete(&self, pk: &str, sk: &str) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.execute("DELETE FROM items WHERE pk = ?1 AND sk = ?2", params![pk, sk])?;
            Ok(())
        })
    }

    fn query_prefix(&self, pk: &str, sk_prefix: &str) -> Result<Vec<Item>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare_cached(
                "SELECT pk, sk, body, expires_at FROM items
                 WHERE pk = ?1 AND substr(sk, 1, length(?2)) = ?2
                 ORDER BY sk",
            )?;
            let items = stmt
                .query_map(params![pk, sk_prefix], item_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(items)
        })
    }

    fn delete_prefix(&self, pk: &str, sk_prefix: &str) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM items WHERE pk = ?1 AND substr(sk, 1, length(?2)) = ?2",
                params![pk, sk_prefix],
            )?;
            Ok(removed)
        })
    }

    fn reap_expired(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM items WHERE expires_at IS NOT NULL AND expires_at < ?1",
                [to_millis(now)],
            )?;
            Ok(removed)
        })
    }
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    let expires_at: Option<i64> = row.get(3)?;
    Ok(Item {
        pk: row.get(0)?,
        sk: row.get(1)?,
        body: row.get(2)?,
        expires_at: expires_at.and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
    })
}

fn to_millis(at: DateTime<Utc>) -> i64 {
    at.timestamp_millis()
}
