use crate::constants::{DB_PATH_ENV, DEFAULT_MAX_PENDING, DEFAULT_TICK_INTERVAL_MS};
use crate::error::AppError;
use crate::scheduler::SchedulerConfig;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "config.json";
const DB_FILE: &str = "taskbell.db";

/// Runtime settings, read from `config.json` in the platform config directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Database file; defaults to `taskbell.db` in the platform data directory.
    pub db_path: Option<PathBuf>,
    pub tick_interval_ms: u64,
    pub max_pending: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            max_pending: DEFAULT_MAX_PENDING,
        }
    }
}

pub fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "taskbell", "Taskbell")
}

impl AppConfig {
    /// Load the user's config file, falling back to defaults when it is absent.
    pub fn load() -> Result<Self, AppError> {
        match project_dirs() {
            Some(dirs) => Self::from_file(&dirs.config_dir().join(CONFIG_FILE)),
            None => {
                log::warn!("Could not determine project directories, using default config");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.tick_interval_ms == 0 {
            return Err(AppError::InvalidInput {
                field: "tick_interval_ms",
                reason: "must be positive".into(),
            });
        }
        if self.max_pending == 0 {
            return Err(AppError::InvalidInput {
                field: "max_pending",
                reason: "must be positive".into(),
            });
        }
        Ok(())
    }

    /// Where the database lives: `TASKBELL_DB`, then `db_path`, then the data dir.
    pub fn resolve_db_path(&self) -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(DB_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        if let Some(path) = &self.db_path {
            return Some(path.clone());
        }
        project_dirs().map(|dirs| dirs.data_dir().join(DB_FILE))
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            tick_interval: Duration::from_millis(self.tick_interval_ms),
        }
    }
}
