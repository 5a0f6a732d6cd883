use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::{params, Connection, Result, Row};
use serde::{Deserialize, Serialize};

/// A to-do item carrying a one-shot reminder at `date`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub contents: String,
    /// Due date; stored with whole-second precision, matched by the minute.
    pub date: DateTime<Utc>,
    /// Free-form tag, compared by exact match when filtering.
    pub category: String,
}

impl Default for Task {
    fn default() -> Self {
        Self::new(0)
    }
}

const SELECT_COLUMNS: &str = "SELECT id, title, contents, date, category FROM tasks";

impl Task {
    /// Create a transient task (not yet saved) due now.
    pub fn new(id: i64) -> Self {
        Self {
            id,
            title: String::new(),
            contents: String::new(),
            date: Utc::now().trunc_subsecs(0),
            category: String::new(),
        }
    }

    /// Insert the task, or replace the row that already has its id.
    pub fn upsert(&self, conn: &Connection) -> Result<()> {
        conn.execute(
            "INSERT INTO tasks (id, title, contents, date, category)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(id) DO UPDATE SET
                 title = excluded.title,
                 contents = excluded.contents,
                 date = excluded.date,
                 category = excluded.category",
            params![
                self.id,
                self.title,
                self.contents,
                self.date.timestamp(),
                self.category,
            ],
        )?;
        Ok(())
    }

    /// Find a task by ID.
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id = ?1"))?;
        let mut rows = stmt.query(params![id])?;

        if let Some(row) = rows.next()? {
            Ok(Some(Self::from_row(row)?))
        } else {
            Ok(None)
        }
    }

    /// All tasks, earliest due date first. Equal dates keep allocation order.
    pub fn find_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} ORDER BY date ASC, id ASC"))?;
        let rows = stmt.query_map([], Self::from_row)?;
        rows.collect()
    }

    /// Tasks whose category equals `category` exactly, in `find_all` order.
    pub fn find_by_category(conn: &Connection, category: &str) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE category = ?1 ORDER BY date ASC, id ASC"
        ))?;
        let rows = stmt.query_map(params![category], Self::from_row)?;
        rows.collect()
    }

    /// Highest id in use, if any task exists.
    pub fn max_id(conn: &Connection) -> Result<Option<i64>> {
        conn.query_row("SELECT MAX(id) FROM tasks", [], |row| row.get(0))
    }

    /// Distinct non-empty categories, sorted.
    pub fn distinct_categories(conn: &Connection) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT DISTINCT category FROM tasks WHERE category != '' ORDER BY category",
        )?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect()
    }

    /// Delete a task from the database.
    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        let rows_affected = conn.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(rows_affected > 0)
    }

    fn from_row(row: &Row<'_>) -> Result<Self> {
        let secs: i64 = row.get(3)?;
        let date = DateTime::<Utc>::from_timestamp(secs, 0)
            .ok_or(rusqlite::Error::IntegralValueOutOfRange(3, secs))?;

        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            contents: row.get(2)?,
            date,
            category: row.get(4)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{at, setup_test_db};

    fn task(id: i64, title: &str, date: DateTime<Utc>, category: &str) -> Task {
        Task {
            id,
            title: title.to_string(),
            contents: String::new(),
            date,
            category: category.to_string(),
        }
    }

    #[test]
    fn test_new_uses_defaults() {
        let t = Task::new(4);

        assert_eq!(t.id, 4);
        assert_eq!(t.title, "");
        assert_eq!(t.contents, "");
        assert_eq!(t.category, "");
        assert_eq!(t.date.timestamp_subsec_nanos(), 0);
        assert!((Utc::now() - t.date).num_seconds() < 5);
    }

    #[test]
    fn test_upsert_and_find_by_id() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut t = task(0, "Buy milk", at(2030, 5, 1, 9, 30), "errand");
        t.contents = "2 litres".to_string();
        t.upsert(conn).unwrap();

        let found = Task::find_by_id(conn, 0).unwrap().unwrap();
        assert_eq!(found, t);

        let not_found = Task::find_by_id(conn, 99999).unwrap();
        assert!(not_found.is_none());
    }

    #[test]
    fn test_upsert_replaces_existing_row() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        let mut t = task(1, "Draft", at(2030, 5, 1, 9, 0), "work");
        t.upsert(conn).unwrap();

        t.title = "Final".to_string();
        t.category = "home".to_string();
        t.upsert(conn).unwrap();

        let all = Task::find_all(conn).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].title, "Final");
        assert_eq!(all[0].category, "home");
    }

    #[test]
    fn test_find_all_orders_by_date_then_id() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        task(0, "late", at(2030, 1, 3, 0, 0), "").upsert(conn).unwrap();
        task(1, "tie-a", at(2030, 1, 2, 0, 0), "").upsert(conn).unwrap();
        task(2, "early", at(2030, 1, 1, 0, 0), "").upsert(conn).unwrap();
        task(3, "tie-b", at(2030, 1, 2, 0, 0), "").upsert(conn).unwrap();

        let titles: Vec<String> = Task::find_all(conn)
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["early", "tie-a", "tie-b", "late"]);
    }

    #[test]
    fn test_find_by_category_is_exact_match() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        task(0, "a", at(2030, 1, 2, 0, 0), "work").upsert(conn).unwrap();
        task(1, "b", at(2030, 1, 1, 0, 0), "work").upsert(conn).unwrap();
        task(2, "c", at(2030, 1, 1, 0, 0), "Work").upsert(conn).unwrap();
        task(3, "d", at(2030, 1, 1, 0, 0), "workshop").upsert(conn).unwrap();

        let titles: Vec<String> = Task::find_by_category(conn, "work")
            .unwrap()
            .into_iter()
            .map(|t| t.title)
            .collect();
        assert_eq!(titles, vec!["b", "a"]);
    }

    #[test]
    fn test_max_id() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        assert_eq!(Task::max_id(conn).unwrap(), None);

        task(5, "", at(2030, 1, 1, 0, 0), "").upsert(conn).unwrap();
        task(2, "", at(2030, 1, 1, 0, 0), "").upsert(conn).unwrap();
        assert_eq!(Task::max_id(conn).unwrap(), Some(5));
    }

    #[test]
    fn test_distinct_categories() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        task(0, "", at(2030, 1, 1, 0, 0), "work").upsert(conn).unwrap();
        task(1, "", at(2030, 1, 1, 0, 0), "").upsert(conn).unwrap();
        task(2, "", at(2030, 1, 1, 0, 0), "errand").upsert(conn).unwrap();
        task(3, "", at(2030, 1, 1, 0, 0), "work").upsert(conn).unwrap();

        assert_eq!(Task::distinct_categories(conn).unwrap(), vec!["errand", "work"]);
    }

    #[test]
    fn test_delete() {
        let (db, _dir) = setup_test_db();
        let conn = db.connection();

        task(0, "gone", at(2030, 1, 1, 0, 0), "").upsert(conn).unwrap();

        let deleted = Task::delete(conn, 0).unwrap();
        assert!(deleted);
        assert!(Task::find_by_id(conn, 0).unwrap().is_none());

        // Deleting non-existent should return false
        let deleted_again = Task::delete(conn, 0).unwrap();
        assert!(!deleted_again);
    }

    #[test]
    fn test_deserialize_fills_missing_fields() {
        let t: Task = serde_json::from_str(r#"{"id": 9, "title": "only a title"}"#).unwrap();

        assert_eq!(t.id, 9);
        assert_eq!(t.title, "only a title");
        assert_eq!(t.contents, "");
        assert_eq!(t.category, "");
    }
}
