//! Reminder scheduling.
//!
//! `ReminderScheduler` maps each task id to at most one pending one-shot
//! reminder. Calls return immediately: commands are handed to a worker thread
//! that owns the trigger facility, and their outcome is published later on
//! the channels returned by [`ReminderScheduler::subscribe`]. The worker also
//! checks for due reminders every tick and delivers them through a
//! [`Notifier`].

pub mod facility;
pub mod notifier;
pub mod trigger;

pub use facility::{LocalFacility, TriggerFacility};
pub use notifier::{LogNotifier, Notifier};
pub use trigger::{identifier_for, CalendarTrigger, NotificationRequest};

use crate::constants::DEFAULT_TICK_INTERVAL_MS;
use crate::models::Task;
use chrono::{DateTime, Local};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Why the trigger facility refused a reminder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulingError {
    #[error("trigger for reminder {identifier} is already in the past")]
    TriggerInPast { identifier: String },

    #[error("trigger for reminder {identifier} is not a valid local time")]
    InvalidTrigger { identifier: String },

    #[error("too many pending reminders (limit {limit})")]
    CapacityExceeded { limit: usize },
}

/// Completion and delivery notices published by the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    Registered { id: i64 },
    Failed { id: i64, error: SchedulingError },
    Cancelled { id: i64, was_pending: bool },
    Fired(NotificationRequest),
}

pub struct SchedulerConfig {
    pub tick_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
        }
    }
}

enum Command {
    Schedule { id: i64, request: NotificationRequest },
    Cancel { id: i64 },
    Pending { reply: Sender<Vec<NotificationRequest>> },
    FireDue { now: DateTime<Local>, reply: Sender<Vec<NotificationRequest>> },
    Subscribe(Sender<SchedulerEvent>),
    Shutdown,
}

pub struct ReminderScheduler {
    commands: Sender<Command>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ReminderScheduler {
    pub fn start<F, N>(facility: F, notifier: N, config: SchedulerConfig) -> Self
    where
        F: TriggerFacility + 'static,
        N: Notifier + 'static,
    {
        let (commands, inbox) = mpsc::channel();
        let worker = Worker {
            facility: Box::new(facility),
            notifier: Box::new(notifier),
            subscribers: Vec::new(),
            tick: config.tick_interval,
        };

        let handle = thread::spawn(move || worker.run(&inbox));

        Self {
            commands,
            worker: Mutex::new(Some(handle)),
        }
    }

    /// Register (or replace) the reminder for `task`.
    ///
    /// Returns as soon as the request is queued. Success or a
    /// [`SchedulingError`] is published to subscribers later.
    pub fn schedule(&self, task: &Task) {
        let request = NotificationRequest::for_task(task);
        self.send(Command::Schedule { id: task.id, request });
    }

    /// Drop the pending reminder for `id`, if there is one.
    pub fn cancel(&self, id: i64) {
        self.send(Command::Cancel { id });
    }

    /// Snapshot of pending reminders, taken after every command issued so far.
    pub fn list_pending(&self) -> Vec<NotificationRequest> {
        let (reply, response) = mpsc::channel();
        if !self.send(Command::Pending { reply }) {
            return Vec::new();
        }
        response.recv().unwrap_or_default()
    }

    /// Run one due-check as of `now` and return what fired.
    pub fn fire_due(&self, now: DateTime<Local>) -> Vec<NotificationRequest> {
        let (reply, response) = mpsc::channel();
        if !self.send(Command::FireDue { now, reply }) {
            return Vec::new();
        }
        response.recv().unwrap_or_default()
    }

    /// Receive events for every command issued after this call.
    pub fn subscribe(&self) -> Receiver<SchedulerEvent> {
        let (sender, events) = mpsc::channel();
        self.send(Command::Subscribe(sender));
        events
    }

    /// Stop the worker and wait for it. Later calls are logged and dropped.
    pub fn shutdown(&self) {
        let handle = match self.worker.lock() {
            Ok(mut guard) => guard.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };

        if let Some(handle) = handle {
            self.send(Command::Shutdown);
            if handle.join().is_err() {
                log::error!("Reminder scheduler worker panicked");
            }
        }
    }

    fn send(&self, command: Command) -> bool {
        if self.commands.send(command).is_ok() {
            true
        } else {
            log::warn!("Reminder scheduler is not running; request dropped");
            false
        }
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}

struct Worker {
    facility: Box<dyn TriggerFacility>,
    notifier: Box<dyn Notifier>,
    subscribers: Vec<Sender<SchedulerEvent>>,
    tick: Duration,
}

impl Worker {
    fn run(mut self, inbox: &Receiver<Command>) {
        log::info!("Reminder scheduler started");
        let mut last_check = Instant::now();

        loop {
            let wait = self.tick.saturating_sub(last_check.elapsed());
            match inbox.recv_timeout(wait) {
                Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
                Ok(command) => self.handle(command),
                Err(RecvTimeoutError::Timeout) => {}
            }

            if last_check.elapsed() >= self.tick {
                self.deliver_due(Local::now());
                last_check = Instant::now();
            }
        }

        log::info!("Reminder scheduler stopped");
    }

    fn handle(&mut self, command: Command) {
        match command {
            Command::Schedule { id, request } => self.register(id, request),
            Command::Cancel { id } => {
                let was_pending = self.facility.remove(&identifier_for(id));
                log::info!("Cancelled reminder {id} (was pending: {was_pending})");
                self.publish(&SchedulerEvent::Cancelled { id, was_pending });
                self.log_pending();
            }
            Command::Pending { reply } => {
                let _ = reply.send(self.facility.pending());
            }
            Command::FireDue { now, reply } => {
                let fired = self.deliver_due(now);
                let _ = reply.send(fired);
            }
            Command::Subscribe(sender) => self.subscribers.push(sender),
            Command::Shutdown => {}
        }
    }

    fn register(&mut self, id: i64, request: NotificationRequest) {
        let identifier = request.identifier.clone();

        match self.facility.add(request, Local::now()) {
            Ok(()) => {
                log::info!("Scheduled reminder {identifier}");
                self.publish(&SchedulerEvent::Registered { id });
            }
            Err(error) => {
                log::warn!("Failed to schedule reminder {identifier}: {error}");
                // The replaced content is stale; it must not fire either
                if self.facility.remove(&identifier) {
                    log::debug!("Dropped stale reminder {identifier}");
                }
                self.publish(&SchedulerEvent::Failed { id, error });
            }
        }

        self.log_pending();
    }

    fn deliver_due(&mut self, now: DateTime<Local>) -> Vec<NotificationRequest> {
        let fired = self.facility.take_due(now);
        for request in &fired {
            self.notifier.deliver(request);
            self.publish(&SchedulerEvent::Fired(request.clone()));
        }
        fired
    }

    fn publish(&mut self, event: &SchedulerEvent) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    fn log_pending(&self) {
        let pending = self.facility.pending();
        log::debug!("{} reminder(s) pending", pending.len());
        for request in &pending {
            log::debug!(
                "Pending reminder {} '{}' at {:?}",
                request.identifier,
                request.title,
                request.trigger.fire_at()
            );
        }
    }
}
