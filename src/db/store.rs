//! SQLite binding of the relational store.
//!
//! Every engine operation runs inside one [`StoreTx`]. Id-list writes are
//! compare-and-swap on the serialized value read earlier in the same
//! transaction; a miss surfaces as `ConcurrentModification` and the caller
//! repeats the whole read-modify-write from a fresh transaction.

use std::str::FromStr;
use std::time::Duration;

use lookbook_assoc::SetColumn;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{debug, info};

use crate::db::columns::SetColumnRef;
use crate::db::models::TableRow;
use crate::db::schema::SQLITE_INIT;
use crate::error::LookbookError;

/// Cloneable store handle. Cheap to clone; connections are leased from the
/// pool per transaction and returned when the transaction ends.
#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if missing) the database and applies the schema.
    pub async fn connect(database_url: &str) -> Result<Self, LookbookError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5))
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .acquire_timeout(Duration::from_secs(5))
            .connect_with(connect_opts)
            .await?;

        apply_schema(&pool).await?;

        info!(database_url, "SqliteStore initialized");
        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Starts a unit of work. Dropping the returned transaction without
    /// [`StoreTx::commit`] rolls it back.
    pub async fn begin(&self) -> Result<StoreTx, LookbookError> {
        let tx = self.pool.begin().await?;
        Ok(StoreTx { tx })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

pub struct StoreTx {
    tx: Transaction<'static, Sqlite>,
}

impl StoreTx {
    /// Raw connection for statements that are specific to one operation.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> Result<(), LookbookError> {
        self.tx.commit().await?;
        Ok(())
    }

    pub async fn rollback(self) -> Result<(), LookbookError> {
        self.tx.rollback().await?;
        Ok(())
    }

    pub async fn fetch_row<T: TableRow>(&mut self, key: i64) -> Result<Option<T>, LookbookError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?",
            T::COLUMNS,
            T::TABLE.name()
        );
        let row = sqlx::query_as::<_, T>(&sql)
            .bind(key)
            .fetch_optional(&mut *self.tx)
            .await?;
        Ok(row)
    }

    /// Like [`StoreTx::fetch_row`], with a missing row as `NotFound`.
    pub async fn require_row<T: TableRow>(&mut self, key: i64) -> Result<T, LookbookError> {
        self.fetch_row::<T>(key)
            .await?
            .ok_or_else(|| LookbookError::not_found(T::TABLE.entity(), key))
    }

    /// Raw value of one id-list column: `Ok(None)` is SQL NULL, a missing row
    /// is `NotFound`.
    pub async fn fetch_column(
        &mut self,
        col: SetColumnRef,
        key: i64,
    ) -> Result<Option<String>, LookbookError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = ?",
            col.column(),
            col.table().name()
        );
        let raw = sqlx::query_scalar::<_, Option<String>>(&sql)
            .bind(key)
            .fetch_optional(&mut *self.tx)
            .await?;
        raw.ok_or_else(|| LookbookError::not_found(col.table().entity(), key))
    }

    /// Writes `value` only if the column still holds `expected` (NULL reads
    /// as the empty string).
    pub async fn update_column(
        &mut self,
        col: SetColumnRef,
        key: i64,
        expected: &str,
        value: &str,
    ) -> Result<(), LookbookError> {
        let sql = format!(
            "UPDATE {table} SET {column} = ? WHERE id = ? AND IFNULL({column}, '') = ?",
            table = col.table().name(),
            column = col.column(),
        );
        let res = sqlx::query(&sql)
            .bind(value)
            .bind(key)
            .bind(expected)
            .execute(&mut *self.tx)
            .await?;

        let affected = res.rows_affected();
        debug!(column = %col, key, affected, "set column write");

        if affected == 0 {
            return Err(LookbookError::ConcurrentModification {
                target: format!("{col}#{key}"),
            });
        }
        Ok(())
    }

    /// Full scan of `T`'s table in id order.
    pub async fn scan_rows<T: TableRow>(&mut self) -> Result<Vec<T>, LookbookError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY id",
            T::COLUMNS,
            T::TABLE.name()
        );
        let rows = sqlx::query_as::<_, T>(&sql)
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    pub async fn load_set(
        &mut self,
        col: SetColumnRef,
        key: i64,
    ) -> Result<LoadedSet, LookbookError> {
        let raw = self.fetch_column(col, key).await?;
        Ok(LoadedSet::from_raw(col, key, raw.as_deref()))
    }

    /// Persists `loaded` if its encoding differs from what was read. Returns
    /// whether a write happened.
    pub async fn store_set(&mut self, loaded: &LoadedSet) -> Result<bool, LookbookError> {
        let encoded = loaded.set.encode();
        if encoded == loaded.raw {
            return Ok(false);
        }
        self.update_column(loaded.column, loaded.key, &loaded.raw, &encoded)
            .await?;
        Ok(true)
    }
}

/// A decoded id list together with the raw value it came from, so the write
/// can be skipped when nothing changed and guarded when something did.
#[derive(Debug, Clone)]
pub struct LoadedSet {
    pub column: SetColumnRef,
    pub key: i64,
    raw: String,
    pub set: SetColumn,
}

impl LoadedSet {
    pub fn from_raw(column: SetColumnRef, key: i64, raw: Option<&str>) -> Self {
        Self {
            column,
            key,
            raw: raw.unwrap_or_default().to_owned(),
            set: SetColumn::decode(raw),
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }
}

async fn apply_schema(pool: &SqlitePool) -> Result<(), LookbookError> {
    for stmt in SQLITE_INIT.split(';') {
        let s = stmt.trim();
        if s.is_empty() {
            continue;
        }
        sqlx::query(s).execute(pool).await?;
    }
    Ok(())
}
