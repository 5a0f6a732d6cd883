use super::schema::SCHEMA;
use crate::constants::SCHEMA_VERSION;
use rusqlite::{Connection, Result};

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    stamp_version(conn)?;
    Ok(())
}

/// Read the schema version recorded in the database header.
pub fn version(conn: &Connection) -> Result<i32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

fn stamp_version(conn: &Connection) -> Result<()> {
    let current = version(conn)?;

    if current < SCHEMA_VERSION {
        log::info!("Migrating task database from version {current} to {SCHEMA_VERSION}");
        conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    }

    Ok(())
}
