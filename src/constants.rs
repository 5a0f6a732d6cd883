// src/constants.rs

/// Reminder title shown when a task has no title
pub const NO_TITLE_PLACEHOLDER: &str = "(no title)";

/// Reminder body shown when a task has no contents
pub const NO_CONTENT_PLACEHOLDER: &str = "(no content)";

/// Maximum number of pending triggers the local facility holds
pub const DEFAULT_MAX_PENDING: usize = 64;

/// How often the scheduler worker checks for due triggers (milliseconds)
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

/// Host messages are capped at 1MB (1024 * 1024 bytes)
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Current `PRAGMA user_version` of the task database
pub const SCHEMA_VERSION: i32 = 1;

/// Environment variable overriding the database path
pub const DB_PATH_ENV: &str = "TASKBELL_DB";
