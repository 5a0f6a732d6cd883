use super::trigger::NotificationRequest;
use super::SchedulingError;
use crate::constants::DEFAULT_MAX_PENDING;
use chrono::{DateTime, Local};
use std::collections::BTreeMap;

/// The time-trigger service reminders are registered with.
///
/// Implementations are owned by the scheduler worker thread, so they need no
/// locking of their own.
pub trait TriggerFacility: Send {
    /// Register `request`, replacing any pending request with the same identifier.
    fn add(&mut self, request: NotificationRequest, now: DateTime<Local>) -> Result<(), SchedulingError>;

    /// Drop the pending request with `identifier`. Returns false if none was pending.
    fn remove(&mut self, identifier: &str) -> bool;

    /// Everything still waiting to fire, ordered by identifier.
    fn pending(&self) -> Vec<NotificationRequest>;

    /// Remove and return every request due at `now`. Fired requests never re-arm.
    fn take_due(&mut self, now: DateTime<Local>) -> Vec<NotificationRequest>;
}

/// In-process facility backed by an ordered map.
pub struct LocalFacility {
    pending: BTreeMap<String, NotificationRequest>,
    capacity: usize,
}

impl LocalFacility {
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: BTreeMap::new(),
            capacity,
        }
    }
}

impl Default for LocalFacility {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PENDING)
    }
}

impl TriggerFacility for LocalFacility {
    fn add(&mut self, request: NotificationRequest, now: DateTime<Local>) -> Result<(), SchedulingError> {
        if request.trigger.fire_at().is_none() {
            return Err(SchedulingError::InvalidTrigger {
                identifier: request.identifier,
            });
        }
        if request.trigger.has_passed(now) {
            return Err(SchedulingError::TriggerInPast {
                identifier: request.identifier,
            });
        }

        let replacing = self.pending.contains_key(&request.identifier);
        if !replacing && self.pending.len() >= self.capacity {
            return Err(SchedulingError::CapacityExceeded { limit: self.capacity });
        }

        self.pending.insert(request.identifier.clone(), request);
        Ok(())
    }

    fn remove(&mut self, identifier: &str) -> bool {
        self.pending.remove(identifier).is_some()
    }

    fn pending(&self) -> Vec<NotificationRequest> {
        self.pending.values().cloned().collect()
    }

    fn take_due(&mut self, now: DateTime<Local>) -> Vec<NotificationRequest> {
        let due: Vec<String> = self
            .pending
            .iter()
            .filter(|(_, request)| request.trigger.is_due(now))
            .map(|(identifier, _)| identifier.clone())
            .collect();

        due.iter()
            .filter_map(|identifier| self.pending.remove(identifier))
            .collect()
    }
}
