use std::io;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::communication::{Event, EventKind};
use crate::config::Config;
use crate::registry::Registry;
use crate::worker;

/// Bridges user commands to the registry and the worker lifecycle.
///
/// Owns the registry (shared with the workers) and the sending half of the
/// event channel. All its mutations of alarm state go through the registry's
/// lock; spawning and joining always happen with the lock released.
pub struct Scheduler {
    registry: Arc<Registry>,
    events: Sender<Event>,
    poll_interval: Duration,
    max_message_len: usize,
}

impl Scheduler {
    #[must_use]
    pub fn new(config: &Config, events: Sender<Event>) -> Self {
        Self {
            registry: Arc::new(Registry::new(config.slots)),
            events,
            poll_interval: config.poll_interval(),
            max_message_len: config.max_message_len,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Inserts a new alarm that rings `duration` seconds from now and spawns
    /// its worker. Emits `Inserted`, `WorkerCreated` and `Assigned` in that
    /// order, each after the state change it reports has committed; rejected
    /// or refused insertions emit exactly one event instead.
    ///
    /// # Errors
    /// Fails only when the worker thread cannot be spawned; the claimed slot
    /// is rolled back to free first, so the registry never holds an occupied
    /// slot without a bound worker.
    pub fn insert(&self, duration: u64, message: &str) -> io::Result<Option<u64>> {
        if message.is_empty() || message.len() > self.max_message_len {
            self.reject();
            return Ok(None);
        }
        let ring_time = ring_time(Local::now(), duration);
        let Some(id) = self.registry.assign(message, duration, ring_time) else {
            self.emit(Event::new(EventKind::SlotsExhausted, 0, duration, message));
            return Ok(None);
        };
        log::info!("alarm {id} inserted, rings at {ring_time}");
        self.emit(Event::new(EventKind::Inserted, id, duration, message));

        let spawned = thread::Builder::new()
            .name(format!("alarm-{id}"))
            .spawn({
                let registry = Arc::clone(&self.registry);
                let events = self.events.clone();
                let poll_interval = self.poll_interval;
                move || worker::run(&registry, id, &events, poll_interval)
            });
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                self.registry.release(id);
                log::error!("could not spawn worker for alarm {id}: {e}");
                return Err(e);
            }
        };
        self.emit(Event::new(EventKind::WorkerCreated, id, duration, message));
        self.registry.store_handle(id, handle);
        self.emit(Event::new(EventKind::Assigned, id, duration, message));
        Ok(Some(id))
    }

    /// Schedules the alarm to end without ringing. Asynchronous: the worker
    /// notices on its next poll, at most one poll interval later.
    pub fn cancel(&self, id: u64) {
        if self.registry.request_close(id) {
            log::info!("alarm {id} scheduled to end");
            self.emit(Event::new(EventKind::ScheduledToEnd, id, 0, ""));
        } else {
            self.emit(Event::new(EventKind::NotFound, id, 0, ""));
        }
    }

    /// Reports a malformed command without touching any alarm state.
    pub fn reject(&self) {
        self.emit(Event::new(EventKind::InvalidInput, 0, 0, ""));
    }

    /// Cancels every occupied slot in one broadcast, then joins the workers.
    /// When this returns no worker is left running, so the registry can be
    /// dropped safely.
    pub fn shutdown(&self) {
        let handles = self.registry.close_all();
        log::info!("shutting down, joining {} worker(s)", handles.len());
        for handle in handles {
            if handle.join().is_err() {
                log::error!("an alarm worker panicked");
            }
        }
    }

    fn emit(&self, event: Event) {
        if self.events.send(event).is_err() {
            log::warn!("event sink disconnected, dropping scheduler event");
        }
    }
}

/// `now + duration`, saturating at the far end of chrono's range instead of
/// panicking on absurd durations.
fn ring_time(now: DateTime<Local>, duration: u64) -> DateTime<Local> {
    i64::try_from(duration)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .and_then(|offset| now.checked_add_signed(offset))
        .unwrap_or(DateTime::<chrono::Utc>::MAX_UTC.into())
}
