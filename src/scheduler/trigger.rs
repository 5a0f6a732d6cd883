use crate::constants::{NO_CONTENT_PLACEHOLDER, NO_TITLE_PLACEHOLDER};
use crate::models::Task;
use chrono::{DateTime, Datelike, Local, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

/// Calendar match on year, month, day, hour and minute in local time.
///
/// Seconds are dropped: the trigger fires at the start of its minute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarTrigger {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub repeats: bool,
}

impl CalendarTrigger {
    /// One-shot trigger for the local calendar minute containing `date`.
    pub fn once_at(date: DateTime<Utc>) -> Self {
        let local = date.with_timezone(&Local);
        Self {
            year: local.year(),
            month: local.month(),
            day: local.day(),
            hour: local.hour(),
            minute: local.minute(),
            repeats: false,
        }
    }

    /// The instant this trigger fires, or None when the components do not
    /// name a real local time (e.g. inside a daylight-saving gap).
    pub fn fire_at(&self) -> Option<DateTime<Local>> {
        Local
            .with_ymd_and_hms(self.year, self.month, self.day, self.hour, self.minute, 0)
            .earliest()
    }

    /// True once `now` has reached the trigger's minute.
    pub fn is_due(&self, now: DateTime<Local>) -> bool {
        self.fire_at().is_some_and(|at| at <= now)
    }

    /// True when the whole trigger minute lies before `now`'s minute.
    pub fn has_passed(&self, now: DateTime<Local>) -> bool {
        let (Some(at), Some(current)) = (self.fire_at(), minute_start(now)) else {
            return false;
        };
        at < current
    }
}

fn minute_start(now: DateTime<Local>) -> Option<DateTime<Local>> {
    now.with_second(0).and_then(|t| t.with_nanosecond(0))
}

/// A reminder as handed to the trigger facility.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    /// Stringified task id; registering the same identifier again replaces it.
    pub identifier: String,
    pub title: String,
    pub body: String,
    pub trigger: CalendarTrigger,
}

impl NotificationRequest {
    pub fn for_task(task: &Task) -> Self {
        let title = if task.title.is_empty() {
            NO_TITLE_PLACEHOLDER.to_string()
        } else {
            task.title.clone()
        };
        let body = if task.contents.is_empty() {
            NO_CONTENT_PLACEHOLDER.to_string()
        } else {
            task.contents.clone()
        };

        Self {
            identifier: identifier_for(task.id),
            title,
            body,
            trigger: CalendarTrigger::once_at(task.date),
        }
    }

    pub fn task_id(&self) -> Option<i64> {
        self.identifier.parse().ok()
    }
}

pub fn identifier_for(task_id: i64) -> String {
    task_id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::at;
    use chrono::Duration;

    #[test]
    fn test_trigger_drops_seconds() {
        let date = at(2030, 3, 14, 15, 9) + Duration::seconds(26);
        let trigger = CalendarTrigger::once_at(date);

        assert!(!trigger.repeats);
        let fire_at = trigger.fire_at().unwrap();
        assert_eq!(fire_at.second(), 0);
        assert_eq!(fire_at.with_timezone(&Utc), at(2030, 3, 14, 15, 9));
    }

    #[test]
    fn test_components_are_local_calendar_fields() {
        let date = at(2030, 12, 31, 23, 59);
        let local = date.with_timezone(&Local);
        let trigger = CalendarTrigger::once_at(date);

        assert_eq!(trigger.year, local.year());
        assert_eq!(trigger.month, local.month());
        assert_eq!(trigger.day, local.day());
        assert_eq!(trigger.hour, local.hour());
        assert_eq!(trigger.minute, local.minute());
    }

    #[test]
    fn test_is_due_at_start_of_minute() {
        let trigger = CalendarTrigger::once_at(at(2030, 1, 1, 8, 0) + Duration::seconds(45));
        let start = at(2030, 1, 1, 8, 0).with_timezone(&Local);

        assert!(!trigger.is_due(start - Duration::seconds(1)));
        assert!(trigger.is_due(start));
        assert!(trigger.is_due(start + Duration::minutes(5)));
    }

    #[test]
    fn test_has_passed_only_after_the_minute() {
        let trigger = CalendarTrigger::once_at(at(2030, 1, 1, 8, 0));
        let start = at(2030, 1, 1, 8, 0).with_timezone(&Local);

        assert!(!trigger.has_passed(start + Duration::seconds(59)));
        assert!(trigger.has_passed(start + Duration::minutes(1)));
        assert!(!trigger.has_passed(start - Duration::minutes(1)));
    }

    #[test]
    fn test_request_uses_task_fields() {
        let mut task = Task::new(12);
        task.title = "Dentist".to_string();
        task.contents = "Bring forms".to_string();
        task.date = at(2030, 2, 2, 10, 30);

        let request = NotificationRequest::for_task(&task);
        assert_eq!(request.identifier, "12");
        assert_eq!(request.task_id(), Some(12));
        assert_eq!(request.title, "Dentist");
        assert_eq!(request.body, "Bring forms");
        assert_eq!(request.trigger, CalendarTrigger::once_at(task.date));
    }

    #[test]
    fn test_request_placeholders_for_empty_fields() {
        let task = Task::new(0);
        let request = NotificationRequest::for_task(&task);

        assert_eq!(request.title, "(no title)");
        assert_eq!(request.body, "(no content)");
    }
}
