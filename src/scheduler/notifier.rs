use super::trigger::NotificationRequest;

/// Presents a fired reminder to the user.
pub trait Notifier: Send {
    fn deliver(&mut self, request: &NotificationRequest);
}

/// Writes fired reminders to the log.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn deliver(&mut self, request: &NotificationRequest) {
        log::info!(
            "Reminder {}: {} - {}",
            request.identifier,
            request.title,
            request.body
        );
    }
}
