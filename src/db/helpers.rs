// src/db/helpers.rs

use crate::db::Database;
use crate::error::AppError;
use rusqlite::{Connection, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};

/// Lock the shared database, recovering from poisoning if necessary.
///
/// A panic while the lock was held cannot leave a half-written task behind:
/// uncommitted SQLite transactions roll back when dropped.
pub fn lock_db<'a>(db: &'a Mutex<Database>, operation: &str) -> MutexGuard<'a, Database> {
    match db.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("Database mutex was poisoned during {operation}, recovering");
            poisoned.into_inner()
        }
    }
}

/// Execute a read-only database operation with lock handling and error mapping.
///
/// # Example
/// ```ignore
/// with_connection(&db, "list tasks", |conn| Task::find_all(conn))
/// ```
pub fn with_connection<F, T>(db: &Arc<Mutex<Database>>, operation: &str, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Connection) -> rusqlite::Result<T>,
{
    let db = lock_db(db, operation);

    f(db.connection()).map_err(|e| {
        log::error!("Failed to {operation}: {e}");
        AppError::Storage(e)
    })
}

/// Execute a write inside a single transaction.
///
/// The closure's effects are committed together or not at all; an error from
/// the closure or from `COMMIT` drops the transaction, which rolls it back.
pub fn with_transaction<F, T>(db: &Arc<Mutex<Database>>, operation: &str, f: F) -> Result<T, AppError>
where
    F: FnOnce(&Transaction<'_>) -> rusqlite::Result<T>,
{
    let mut db = lock_db(db, operation);

    let run = |conn: &mut Connection| -> rusqlite::Result<T> {
        let tx = conn.transaction()?;
        let value = f(&tx)?;
        tx.commit()?;
        Ok(value)
    };

    run(db.connection_mut()).map_err(|e| {
        log::error!("Failed to {operation}: {e}");
        AppError::Storage(e)
    })
}
