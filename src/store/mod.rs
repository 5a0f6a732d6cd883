use crate::db::{with_connection, with_transaction, Database};
use crate::error::AppError;
use crate::models::Task;
use std::sync::{Arc, Mutex};

/// Durable keyed storage of tasks with ordered and filtered reads.
///
/// Every read is a point-in-time query; callers re-issue it after a mutation
/// to see the new state. Each write runs in its own transaction.
pub struct TaskStore {
    db: Arc<Mutex<Database>>,
}

impl TaskStore {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    /// Next free id: one past the current maximum, or 0 for an empty store.
    ///
    /// Computed from the table on every call, so it stays correct after
    /// deletions or writes made through another handle.
    pub fn allocate_id(&self) -> Result<i64, AppError> {
        let max = with_connection(&self.db, "allocate task id", Task::max_id)?;
        match max {
            Some(id) => id.checked_add(1).ok_or_else(|| AppError::InvalidInput {
                field: "id",
                reason: "task id space exhausted".into(),
            }),
            None => Ok(0),
        }
    }

    /// Start a "new task" flow: a transient task with a fresh id and defaults.
    pub fn new_task(&self) -> Result<Task, AppError> {
        Ok(Task::new(self.allocate_id()?))
    }

    pub fn get(&self, id: i64) -> Result<Option<Task>, AppError> {
        with_connection(&self.db, "load task", |conn| Task::find_by_id(conn, id))
    }

    /// Insert the task or replace the stored record with the same id.
    pub fn save(&self, task: &Task) -> Result<(), AppError> {
        with_transaction(&self.db, "save task", |tx| task.upsert(tx))?;
        log::debug!("Saved task {}", task.id);
        Ok(())
    }

    /// Remove the task with `id`. Returns false when no such task existed.
    pub fn delete(&self, id: i64) -> Result<bool, AppError> {
        let removed = with_transaction(&self.db, "delete task", |tx| Task::delete(tx, id))?;
        if removed {
            log::debug!("Deleted task {id}");
        } else {
            log::debug!("Delete of unknown task {id} ignored");
        }
        Ok(removed)
    }

    pub fn list_all(&self) -> Result<Vec<Task>, AppError> {
        with_connection(&self.db, "list tasks", Task::find_all)
    }

    /// Tasks in exactly `category`. An empty category means no filter.
    pub fn list_by_category(&self, category: &str) -> Result<Vec<Task>, AppError> {
        if category.is_empty() {
            return self.list_all();
        }
        with_connection(&self.db, "filter tasks by category", |conn| {
            Task::find_by_category(conn, category)
        })
    }

    pub fn categories(&self) -> Result<Vec<String>, AppError> {
        with_connection(&self.db, "list categories", Task::distinct_categories)
    }
}
