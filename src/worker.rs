use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use chrono::Local;

use crate::alarm::AlarmView;
use crate::communication::{Event, EventKind};
use crate::registry::Registry;

/// One alarm worker: polls the registry for the alarm it was spawned for
/// until it rings, is cancelled, or vanishes, then reports and returns.
///
/// This is cooperative polling, so both expiry and cancellation are noticed
/// at most one `poll_interval` late. The only write a worker ever performs is
/// `clear_if_mine` on its own alarm; everything else is read-only snapshots.
pub(crate) fn run(registry: &Registry, id: u64, events: &Sender<Event>, poll_interval: Duration) {
    let mut last_seen: Option<AlarmView> = None;
    loop {
        let now = Local::now();
        match registry.snapshot(id) {
            // vanished: someone else vacated or reused the slot. report with
            // whatever this worker last saw and bow out, the slot is not ours
            None => {
                let (duration, message) = last_seen
                    .map(|view| (view.duration, view.message))
                    .unwrap_or_default();
                log::info!("alarm {id} vanished before its worker acted");
                send(events, Event::new(EventKind::Ended, id, duration, message));
                return;
            }
            // cancellation wins over ringing when both hold in the same poll
            Some(view) if view.close_requested => {
                log::info!("alarm {id} cancelled");
                send(
                    events,
                    Event::new(EventKind::Ended, id, view.duration, view.message),
                );
                return;
            }
            Some(view) if now >= view.ring_time => {
                registry.clear_if_mine(id);
                log::info!("alarm {id} rang");
                send(
                    events,
                    Event::new(EventKind::Rang, id, view.duration, view.message),
                );
                return;
            }
            Some(view) => {
                last_seen = Some(view);
                thread::sleep(poll_interval);
            }
        }
    }
}

fn send(events: &Sender<Event>, event: Event) {
    // the sink hanging up (printer thread gone at teardown) is not a worker
    // failure
    if events.send(event).is_err() {
        log::warn!("event sink disconnected, dropping worker event");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn one_second_ago() -> chrono::DateTime<Local> {
        Local::now() - chrono::Duration::seconds(1)
    }

    // `run` terminates on its own for each of these, so the tests drive it
    // synchronously instead of spawning threads

    #[test]
    fn expired_alarm_rings_and_frees_its_slot() {
        let registry = Registry::new(1);
        let id = registry.assign("tea", 2, one_second_ago()).unwrap();
        let (tx, rx) = mpsc::channel();
        run(&registry, id, &tx, Duration::from_millis(1));
        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::Rang);
        assert_eq!(event.alarm_id, id);
        assert_eq!(event.duration, 2);
        assert_eq!(event.message, "tea");
        assert_eq!(registry.occupied(), 0);
        // exactly one terminal event
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn cancellation_beats_expiry_in_the_same_poll() {
        let registry = Registry::new(1);
        // both expired and cancelled before the first poll
        let id = registry.assign("nap", 1, one_second_ago()).unwrap();
        assert!(registry.request_close(id));
        let (tx, rx) = mpsc::channel();
        run(&registry, id, &tx, Duration::from_millis(1));
        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::Ended);
        assert_eq!(event.message, "nap");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn vanished_alarm_reports_ended_without_touching_the_slot() {
        let registry = Registry::new(1);
        let id = registry.assign("gone", 1, one_second_ago()).unwrap();
        registry.clear_if_mine(id);
        let reused = registry.assign("other", 60, Local::now() + chrono::Duration::seconds(60));
        let (tx, rx) = mpsc::channel();
        run(&registry, id, &tx, Duration::from_millis(1));
        let event = rx.try_recv().unwrap();
        assert_eq!(event.kind, EventKind::Ended);
        assert_eq!(event.alarm_id, id);
        // the reused slot is untouched
        let reused = reused.unwrap();
        assert_eq!(registry.snapshot(reused).unwrap().message, "other");
        assert_eq!(registry.occupied(), 1);
    }

    #[test]
    fn pending_alarm_keeps_polling_until_ring_time() {
        let registry = Registry::new(1);
        let ring_time = Local::now() + chrono::Duration::milliseconds(50);
        let id = registry.assign("soon", 0, ring_time).unwrap();
        let (tx, rx) = mpsc::channel();
        run(&registry, id, &tx, Duration::from_millis(5));
        assert_eq!(rx.try_recv().unwrap().kind, EventKind::Rang);
        assert!(Local::now() >= ring_time);
    }
}
