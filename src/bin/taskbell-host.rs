//! Stdio host for taskbell
//!
//! Runs the task store and reminder scheduler behind the length-prefixed JSON
//! protocol in `taskbell_lib::host`. A presentation layer spawns this binary
//! and talks to it over stdin/stdout.

use std::process::ExitCode;
use std::sync::Arc;
use taskbell_lib::{config::AppConfig, host::NativeHost};

fn main() -> ExitCode {
    // Logs go to stderr only (stdout is reserved for the protocol).
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Failed to load config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let reminders = match taskbell_lib::open(&config) {
        Ok(reminders) => Arc::new(reminders),
        Err(e) => {
            log::error!("Initialization error: {e}");
            return ExitCode::FAILURE;
        }
    };

    log::info!("taskbell-host starting");
    let host = NativeHost::new(reminders);

    // Run until the presentation layer closes the connection
    match host.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            log::info!("taskbell-host exiting: input closed");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("Host error: {e}");
            ExitCode::FAILURE
        }
    }
}
