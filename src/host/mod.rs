//! Stdio bridge for an external presentation layer.
//!
//! Messages are JSON objects framed by a 4-byte little-endian length prefix,
//! in both directions. Every request gets exactly one response; fired and
//! failed reminders are pushed as extra messages whenever they happen.

use crate::app::Reminders;
use crate::constants::MAX_MESSAGE_SIZE;
use crate::error::AppError;
use crate::models::Task;
use crate::scheduler::{NotificationRequest, SchedulerEvent};
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum IncomingMessage {
    #[serde(rename = "new_task")]
    NewTask,
    #[serde(rename = "get_task")]
    GetTask { id: i64 },
    #[serde(rename = "save_task")]
    SaveTask { task: Task },
    #[serde(rename = "delete_task")]
    DeleteTask { id: i64 },
    #[serde(rename = "list_tasks")]
    ListTasks {
        #[serde(default)]
        category: String,
    },
    #[serde(rename = "categories")]
    Categories,
    #[serde(rename = "pending_reminders")]
    PendingReminders,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum OutgoingMessage {
    #[serde(rename = "task")]
    Task { task: Option<Task> },
    #[serde(rename = "tasks")]
    Tasks { tasks: Vec<Task> },
    #[serde(rename = "saved")]
    Saved { id: i64 },
    #[serde(rename = "deleted")]
    Deleted { id: i64, removed: bool },
    #[serde(rename = "categories")]
    Categories { categories: Vec<String> },
    #[serde(rename = "pending_reminders")]
    PendingReminders { reminders: Vec<NotificationRequest> },
    #[serde(rename = "reminder_fired")]
    ReminderFired { reminder: NotificationRequest },
    #[serde(rename = "reminder_failed")]
    ReminderFailed { id: i64, reason: String },
    #[serde(rename = "error")]
    Error { message: String },
}

pub struct NativeHost {
    reminders: Arc<Reminders>,
}

impl NativeHost {
    pub fn new(reminders: Arc<Reminders>) -> Self {
        Self { reminders }
    }

    /// Serve stdin/stdout until the presentation layer closes the pipe.
    pub fn run(&self) -> io::Result<()> {
        let output = Arc::new(Mutex::new(io::stdout()));
        let _forwarder = self.forward_events(Arc::clone(&output));
        let mut input = io::stdin().lock();
        self.serve(&mut input, &output)
    }

    /// Answer framed requests from `input` until it fails or ends.
    pub fn serve<R: Read, W: Write>(&self, input: &mut R, output: &Mutex<W>) -> io::Result<()> {
        loop {
            let frame = read_frame(input)?;
            let response = match serde_json::from_slice::<IncomingMessage>(&frame) {
                Ok(message) => self.handle_message(message),
                Err(e) => {
                    log::warn!("Ignoring malformed host message: {e}");
                    OutgoingMessage::Error {
                        message: format!("malformed message: {e}"),
                    }
                }
            };
            write_locked(output, &response)?;
        }
    }

    /// Push reminder events to `output` from a background thread.
    ///
    /// The thread ends when the scheduler stops or the output breaks.
    pub fn forward_events<W: Write + Send + 'static>(&self, output: Arc<Mutex<W>>) -> JoinHandle<()> {
        let events = self.reminders.scheduler().subscribe();
        thread::spawn(move || {
            for event in events {
                let Some(message) = event_message(event) else {
                    continue;
                };
                if let Err(e) = write_locked(&output, &message) {
                    log::error!("Failed to forward reminder event: {e}");
                    break;
                }
            }
        })
    }

    pub fn handle_message(&self, message: IncomingMessage) -> OutgoingMessage {
        self.dispatch(message).unwrap_or_else(|e| OutgoingMessage::Error {
            message: e.to_string(),
        })
    }

    fn dispatch(&self, message: IncomingMessage) -> Result<OutgoingMessage, AppError> {
        let store = self.reminders.store();
        let response = match message {
            IncomingMessage::NewTask => OutgoingMessage::Task {
                task: Some(store.new_task()?),
            },
            IncomingMessage::GetTask { id } => OutgoingMessage::Task { task: store.get(id)? },
            IncomingMessage::SaveTask { task } => {
                self.reminders.save_task(&task)?;
                OutgoingMessage::Saved { id: task.id }
            }
            IncomingMessage::DeleteTask { id } => OutgoingMessage::Deleted {
                id,
                removed: self.reminders.delete_task(id)?,
            },
            IncomingMessage::ListTasks { category } => OutgoingMessage::Tasks {
                tasks: store.list_by_category(&category)?,
            },
            IncomingMessage::Categories => OutgoingMessage::Categories {
                categories: store.categories()?,
            },
            IncomingMessage::PendingReminders => OutgoingMessage::PendingReminders {
                reminders: self.reminders.scheduler().list_pending(),
            },
        };
        Ok(response)
    }
}

fn event_message(event: SchedulerEvent) -> Option<OutgoingMessage> {
    match event {
        SchedulerEvent::Fired(reminder) => Some(OutgoingMessage::ReminderFired { reminder }),
        SchedulerEvent::Failed { id, error } => Some(OutgoingMessage::ReminderFailed {
            id,
            reason: error.to_string(),
        }),
        SchedulerEvent::Registered { .. } | SchedulerEvent::Cancelled { .. } => None,
    }
}

pub fn read_frame<R: Read>(input: &mut R) -> io::Result<Vec<u8>> {
    let mut len_bytes = [0u8; 4];
    input.read_exact(&mut len_bytes)?;
    let len = usize::try_from(u32::from_le_bytes(len_bytes))
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    if len > MAX_MESSAGE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Message too large: {len} bytes (max: {MAX_MESSAGE_SIZE} bytes)"),
        ));
    }

    let mut buffer = vec![0u8; len];
    input.read_exact(&mut buffer)?;
    Ok(buffer)
}

pub fn write_message<W: Write>(output: &mut W, message: &OutgoingMessage) -> io::Result<()> {
    let json = serde_json::to_vec(message)?;
    let len = u32::try_from(json.len()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    output.write_all(&len.to_le_bytes())?;
    output.write_all(&json)?;
    output.flush()?;

    Ok(())
}

fn write_locked<W: Write>(output: &Mutex<W>, message: &OutgoingMessage) -> io::Result<()> {
    let mut guard = output.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
    write_message(&mut *guard, message)
}
