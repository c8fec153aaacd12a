use chrono::{DateTime, Local};

/// A status update sent to whoever is listening on the event channel
/// (normally the printer thread in `main`).
///
/// Every event carries the same payload regardless of kind; for kinds like
/// [`EventKind::NotFound`] the duration and message are simply empty.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    pub alarm_id: u64,
    /// when the event was produced, not when the alarm was created
    pub at: DateTime<Local>,
    pub duration: u64,
    pub message: String,
}

impl Event {
    #[must_use]
    pub fn new(kind: EventKind, alarm_id: u64, duration: u64, message: impl Into<String>) -> Self {
        Self {
            kind,
            alarm_id,
            at: Local::now(),
            duration,
            message: message.into(),
        }
    }

    /// Renders the event as a single line, with the timestamp in the given
    /// chrono format (`time_format` from the config).
    #[must_use]
    pub fn render(&self, time_format: &str) -> String {
        let at = self.at.format(time_format);
        match self.kind {
            EventKind::Inserted => format!(
                "Alarm({}) Inserted Into Alarm List at {at}: {} {}",
                self.alarm_id, self.duration, self.message
            ),
            EventKind::WorkerCreated => format!(
                "Created New Alarm Worker For Alarm({}) at {at}: {} {}",
                self.alarm_id, self.duration, self.message
            ),
            EventKind::Assigned => format!(
                "Alarm({}) Assigned to Alarm Worker at {at}: {} {}",
                self.alarm_id, self.duration, self.message
            ),
            EventKind::ScheduledToEnd => format!("Alarm({}) is Scheduled to End.", self.alarm_id),
            EventKind::NotFound => format!("Alarm({}) is Not Found!", self.alarm_id),
            EventKind::SlotsExhausted => {
                "All alarm slots are occupied. Please wait for an alarm to finish first.".to_string()
            }
            EventKind::Rang => format!(
                "Alarm({}) Rang at {at}: {} {}",
                self.alarm_id, self.duration, self.message
            ),
            EventKind::Ended => format!(
                "Alarm({}) Ended at {at}: {} {}",
                self.alarm_id, self.duration, self.message
            ),
            EventKind::InvalidInput => "invalid input! type help for commands".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Inserted,
    WorkerCreated,
    Assigned,
    ScheduledToEnd,
    NotFound,
    SlotsExhausted,
    /// the alarm reached its ring time
    Rang,
    /// the alarm was cancelled or vanished before ringing
    Ended,
    InvalidInput,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_rang() {
        let event = Event::new(EventKind::Rang, 7, 2, "tea");
        let line = event.render("%Y");
        assert!(line.starts_with("Alarm(7) Rang at "));
        assert!(line.ends_with(": 2 tea"));
    }

    #[test]
    fn render_not_found_ignores_payload() {
        let event = Event::new(EventKind::NotFound, 999, 0, "");
        assert_eq!(event.render("%Y"), "Alarm(999) is Not Found!");
    }

    #[test]
    fn render_invalid_input() {
        let event = Event::new(EventKind::InvalidInput, 0, 0, "");
        assert_eq!(event.render("%Y"), "invalid input! type help for commands");
    }
}
