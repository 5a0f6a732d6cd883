use crate::error::AppError;
use crate::models::Task;
use crate::scheduler::{CalendarTrigger, ReminderScheduler};
use crate::store::TaskStore;
use chrono::{DateTime, Local};

/// Keeps the task store and the reminder scheduler in step.
///
/// The store is always written first; the scheduler is only told about a
/// task once its write has committed.
pub struct Reminders {
    store: TaskStore,
    scheduler: ReminderScheduler,
}

impl Reminders {
    pub fn new(store: TaskStore, scheduler: ReminderScheduler) -> Self {
        Self { store, scheduler }
    }

    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn scheduler(&self) -> &ReminderScheduler {
        &self.scheduler
    }

    /// Persist `task`, then (re)schedule its reminder.
    ///
    /// A storage fault is returned and nothing is scheduled. Scheduling
    /// problems never surface here; they arrive on the scheduler's events.
    pub fn save_task(&self, task: &Task) -> Result<(), AppError> {
        self.store.save(task)?;
        self.scheduler.schedule(task);
        Ok(())
    }

    /// Delete the task, then cancel its reminder.
    ///
    /// The cancel is issued even when the row was already gone so a reminder
    /// left over from an earlier run cannot fire for a missing task.
    pub fn delete_task(&self, id: i64) -> Result<bool, AppError> {
        let removed = self.store.delete(id)?;
        self.scheduler.cancel(id);
        Ok(removed)
    }

    /// Re-register reminders for every stored task that is not yet past.
    ///
    /// Pending reminders live in memory only, so a host calls this once at
    /// startup. Returns how many schedule requests were issued.
    pub fn restore_pending(&self, now: DateTime<Local>) -> Result<usize, AppError> {
        let upcoming: Vec<Task> = self
            .store
            .list_all()?
            .into_iter()
            .filter(|task| !CalendarTrigger::once_at(task.date).has_passed(now))
            .collect();

        for task in &upcoming {
            self.scheduler.schedule(task);
        }

        log::info!("Restored {} pending reminder(s)", upcoming.len());
        Ok(upcoming.len())
    }
}
