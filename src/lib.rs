pub mod app;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod host;
pub mod models;
pub mod scheduler;
pub mod store;
#[cfg(test)]
mod test_utils;

use crate::app::Reminders;
use crate::config::AppConfig;
use crate::db::{migrations, Database};
use crate::scheduler::{LocalFacility, LogNotifier, ReminderScheduler};
use crate::store::TaskStore;
use chrono::Local;
use log::{error, info};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Error type for taskbell initialization failures
#[derive(Debug)]
pub enum InitError {
    NoProjectDirs,
    DataDirCreation(std::io::Error),
    DatabaseOpen(rusqlite::Error),
    Migration(rusqlite::Error),
    Restore(error::AppError),
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InitError::NoProjectDirs => write!(f, "Could not determine project directories"),
            InitError::DataDirCreation(e) => write!(f, "Could not create data directory: {e}"),
            InitError::DatabaseOpen(e) => write!(f, "Failed to open database: {e}"),
            InitError::Migration(e) => write!(f, "Failed to run database migrations: {e}"),
            InitError::Restore(e) => write!(f, "Failed to restore pending reminders: {e}"),
        }
    }
}

impl std::error::Error for InitError {}

fn get_db_path(config: &AppConfig) -> Result<PathBuf, InitError> {
    let path = config.resolve_db_path().ok_or(InitError::NoProjectDirs)?;
    if let Some(data_dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(data_dir).map_err(InitError::DataDirCreation)?;
    }
    Ok(path)
}

/// Open the database named by `config` and start the reminder scheduler.
pub fn open(config: &AppConfig) -> Result<Reminders, InitError> {
    let db_path = get_db_path(config)?;
    open_at(&db_path, config)
}

/// Same as [`open`], with an explicit database file.
pub fn open_at(db_path: &Path, config: &AppConfig) -> Result<Reminders, InitError> {
    let db = Database::open(db_path).map_err(|e| {
        error!("Failed to open database at {}: {e}", db_path.display());
        InitError::DatabaseOpen(e)
    })?;

    if let Err(e) = migrations::run(db.connection()) {
        error!("Failed to run migrations: {e}");
        return Err(InitError::Migration(e));
    }

    let store = TaskStore::new(Arc::new(Mutex::new(db)));
    let scheduler = ReminderScheduler::start(
        LocalFacility::new(config.max_pending),
        LogNotifier,
        config.scheduler_config(),
    );
    let reminders = Reminders::new(store, scheduler);

    reminders
        .restore_pending(Local::now())
        .map_err(InitError::Restore)?;

    info!("Task database ready at {}", db_path.display());
    Ok(reminders)
}
