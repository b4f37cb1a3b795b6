//! SQLite-backed record store.
//!
//! Every read and write the core performs happens inside a [`Tx`] obtained
//! from [`Store::write`] or [`Store::read`]. The closure's `Ok` commits; an
//! `Err` (or a panic) drops the transaction, which rolls it back. A panic
//! inside a closure therefore leaves the database consistent, and the next
//! caller takes the connection over from the poisoned mutex.
//!
//! Write transactions begin `IMMEDIATE` while holding the connection mutex,
//! so a write transaction owns the database write lock from its first
//! statement to commit. Any row read inside it, such as a leave approval
//! about to be decided, cannot change underneath it.

mod attendance;
mod employees;
mod leave;
mod schema;

use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, Row, Transaction, TransactionBehavior};
use tracing::debug;

use crate::error::HrResult;

/// Path value that selects a private in-memory database.
pub const IN_MEMORY: &str = ":memory:";

/// Handle to the record store. Cheap to clone.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Opens (creating if needed) the database at `path`.
    ///
    /// `":memory:"` opens a private in-memory database.
    pub fn open(path: &str) -> HrResult<Self> {
        let conn = if path == IN_MEMORY {
            Connection::open_in_memory()?
        } else {
            Connection::open(path)?
        };
        conn.busy_timeout(Duration::from_secs(5))?;
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> HrResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> HrResult<Self> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(schema::SCHEMA)?;
        debug!("record store schema ready");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Runs `f` inside an exclusive write transaction.
    ///
    /// # Example
    ///
    /// ```
    /// use hr_backoffice::models::LeaveType;
    /// use hr_backoffice::store::Store;
    ///
    /// let store = Store::open_in_memory()?;
    /// store.write(|tx| {
    ///     tx.upsert_leave_type(&LeaveType { name: "casual".into(), active: true })
    /// })?;
    /// let found = store.read(|tx| tx.leave_type("casual"))?;
    /// assert!(found.is_some());
    /// # Ok::<(), hr_backoffice::error::HrError>(())
    /// ```
    pub fn write<T, F>(&self, f: F) -> HrResult<T>
    where
        F: FnOnce(&Tx<'_>) -> HrResult<T>,
    {
        self.run(TransactionBehavior::Immediate, f)
    }

    /// Runs `f` inside a read transaction, giving it a consistent snapshot.
    pub fn read<T, F>(&self, f: F) -> HrResult<T>
    where
        F: FnOnce(&Tx<'_>) -> HrResult<T>,
    {
        self.run(TransactionBehavior::Deferred, f)
    }

    fn run<T, F>(&self, behavior: TransactionBehavior, f: F) -> HrResult<T>
    where
        F: FnOnce(&Tx<'_>) -> HrResult<T>,
    {
        let mut conn = self.lock();
        let tx = Tx {
            inner: conn.transaction_with_behavior(behavior)?,
        };
        let value = f(&tx)?;
        tx.inner.commit()?;
        Ok(value)
    }
}

/// An open transaction. Dropping it without commit rolls back.
pub struct Tx<'c> {
    inner: Transaction<'c>,
}

impl Tx<'_> {
    fn conn(&self) -> &Connection {
        &self.inner
    }
}

fn parse_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let text: String = row.get(idx)?;
    text.parse()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn millis_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let ms: i64 = row.get(idx)?;
    DateTime::<Utc>::from_timestamp_millis(ms)
        .ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, ms))
}

fn to_millis(dt: DateTime<Utc>) -> i64 {
    dt.timestamp_millis()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HrError;
    use crate::models::LeaveType;

    fn casual() -> LeaveType {
        LeaveType {
            name: "casual".to_string(),
            active: true,
        }
    }

    #[test]
    fn test_commit_on_ok() {
        let store = Store::open_in_memory().unwrap();
        store.write(|tx| tx.upsert_leave_type(&casual())).unwrap();

        let found = store.read(|tx| tx.leave_type("casual")).unwrap();
        assert_eq!(found, Some(casual()));
    }

    #[test]
    fn test_rollback_on_err() {
        let store = Store::open_in_memory().unwrap();
        let result: HrResult<()> = store.write(|tx| {
            tx.upsert_leave_type(&casual())?;
            Err(HrError::internal("boom"))
        });
        assert!(result.is_err());

        let found = store.read(|tx| tx.leave_type("casual")).unwrap();
        assert_eq!(found, None);
    }

    #[test]
    fn test_store_usable_after_panic_in_write() {
        let store = Store::open_in_memory().unwrap();
        let handle = store.clone();
        let outcome = std::thread::spawn(move || {
            handle.write(|tx| -> HrResult<()> {
                tx.upsert_leave_type(&casual())?;
                panic!("closure failed mid-transaction");
            })
        })
        .join();
        assert!(outcome.is_err());

        let found = store.read(|tx| tx.leave_type("casual")).unwrap();
        assert_eq!(found, None);
        store.write(|tx| tx.upsert_leave_type(&casual())).unwrap();
        assert_eq!(store.read(|tx| tx.leave_type("casual")).unwrap(), Some(casual()));
    }

    #[test]
    fn test_open_memory_path() {
        let store = Store::open(IN_MEMORY).unwrap();
        let types = store.read(|tx| tx.leave_types()).unwrap();
        assert!(types.is_empty());
    }

    #[test]
    fn test_store_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Store>();
    }
}
