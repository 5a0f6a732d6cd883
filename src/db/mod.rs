pub mod helpers;
pub mod migrations;
pub mod schema;
pub use helpers::{lock_db, with_connection, with_transaction};

use rusqlite::{Connection, Result};
use std::path::Path;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Open a private database that lives only as long as this handle.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SCHEMA_VERSION;
    use tempfile::tempdir;

    #[test]
    fn test_database_opens() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let _db = Database::open(&db_path).unwrap();
        assert!(db_path.exists());
    }

    #[test]
    fn test_migrations_run() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(&db_path).unwrap();
        migrations::run(db.connection()).unwrap();

        // Verify table exists
        let count: i32 = db
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='tasks'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_migrations_stamp_version() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(migrations::version(db.connection()).unwrap(), 0);

        migrations::run(db.connection()).unwrap();
        assert_eq!(migrations::version(db.connection()).unwrap(), SCHEMA_VERSION);
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let db = Database::open(&db_path).unwrap();

        db.connection()
            .execute_batch(schema::SCHEMA)
            .unwrap();
        db.connection()
            .execute(
                "INSERT INTO tasks (id, title, contents, date, category) VALUES (0, 'kept', '', 0, '')",
                [],
            )
            .unwrap();

        // Run migrations twice
        migrations::run(db.connection()).unwrap();
        migrations::run(db.connection()).unwrap();

        // Existing rows survive re-running the schema
        let count: i32 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1, "Running migrations twice should not touch existing tasks");
    }

    #[test]
    fn test_columns_default_to_empty_text() {
        let db = Database::open_in_memory().unwrap();
        migrations::run(db.connection()).unwrap();

        db.connection()
            .execute("INSERT INTO tasks (id, date) VALUES (3, 0)", [])
            .unwrap();

        let (title, contents, category): (String, String, String) = db
            .connection()
            .query_row(
                "SELECT title, contents, category FROM tasks WHERE id = 3",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(title, "");
        assert_eq!(contents, "");
        assert_eq!(category, "");
    }
}
