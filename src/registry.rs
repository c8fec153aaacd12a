use std::sync::{Mutex, MutexGuard};
use std::thread::JoinHandle;

use chrono::{DateTime, Local};

use crate::alarm::{Alarm, AlarmView};

/// Fixed-capacity table of alarm slots behind a single lock.
///
/// The table and the id counter are the only state shared between the
/// scheduler and the workers, so one exclusive lock covers both. Every
/// operation here holds the lock for its whole (short) body and never sleeps,
/// spawns, or joins while holding it.
#[derive(Debug)]
pub struct Registry {
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    slots: Vec<Alarm>,
    /// monotonically increasing, never reused for the lifetime of the process
    next_id: u64,
}

impl Inner {
    fn find_free_slot(&self) -> Option<usize> {
        self.slots.iter().position(|slot| !slot.occupied)
    }

    /// finds the occupied slot holding `id`. a vacated slot still carries its
    /// old id, but it never matches here, so a worker holding a stale id gets
    /// `None` instead of someone else's alarm.
    fn find_by_id(&self, id: u64) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| slot.occupied && slot.id == id)
    }
}

impl Registry {
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: (0..capacity).map(|_| Alarm::vacant()).collect(),
                next_id: 0,
            }),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().slots.len()
    }

    /// number of currently occupied slots
    #[must_use]
    pub fn occupied(&self) -> usize {
        self.lock().slots.iter().filter(|slot| slot.occupied).count()
    }

    /// Claims a free slot for a new alarm under one lock acquisition and
    /// returns its freshly assigned id, or `None` when every slot is taken.
    pub fn assign(
        &self,
        message: &str,
        duration: u64,
        ring_time: DateTime<Local>,
    ) -> Option<u64> {
        let mut inner = self.lock();
        let index = inner.find_free_slot()?;
        inner.next_id += 1;
        let id = inner.next_id;
        let slot = &mut inner.slots[index];
        slot.id = id;
        slot.message = message.to_string();
        slot.duration = duration;
        slot.ring_time = ring_time;
        slot.close_requested = false;
        slot.handle = None;
        slot.occupied = true;
        Some(id)
    }

    /// Asks the alarm's worker to terminate without ringing. Returns whether
    /// an occupied slot with that id exists; the worker itself only notices
    /// on its next poll.
    pub fn request_close(&self, id: u64) -> bool {
        let mut inner = self.lock();
        let Some(index) = inner.find_by_id(id) else {
            return false;
        };
        inner.slots[index].close_requested = true;
        // ids are unique among occupied slots; a second match is a bug in the
        // assignment path, not a "cancel all matching" feature
        debug_assert!(
            !inner
                .slots
                .iter()
                .enumerate()
                .any(|(i, slot)| i != index && slot.occupied && slot.id == id),
            "duplicate occupied alarm id {id}"
        );
        true
    }

    /// A worker's polling read: the slot's state copied atomically under the
    /// lock, or `None` when the alarm has vanished.
    #[must_use]
    pub fn snapshot(&self, id: u64) -> Option<AlarmView> {
        let inner = self.lock();
        let slot = &inner.slots[inner.find_by_id(id)?];
        Some(AlarmView {
            id: slot.id,
            message: slot.message.clone(),
            duration: slot.duration,
            ring_time: slot.ring_time,
            close_requested: slot.close_requested,
        })
    }

    /// Marks the alarm as consumed, freeing its slot for reuse. Only the
    /// bound worker calls this, and only after observing expiry; if the slot
    /// no longer holds `id` this is a no-op.
    pub fn clear_if_mine(&self, id: u64) {
        let mut inner = self.lock();
        if let Some(index) = inner.find_by_id(id) {
            inner.slots[index].occupied = false;
        }
    }

    /// Attaches the worker handle to its slot after a successful spawn. If
    /// the alarm already vanished (a zero-duration alarm can ring before the
    /// scheduler gets back here) the handle is dropped and the thread is left
    /// to finish on its own.
    pub fn store_handle(&self, id: u64, handle: JoinHandle<()>) {
        let mut inner = self.lock();
        if let Some(index) = inner.find_by_id(id) {
            inner.slots[index].handle = Some(handle);
        }
    }

    /// Rolls a slot back to free, for an insertion whose worker could not be
    /// spawned. An occupied slot with no bound worker must never survive.
    pub fn release(&self, id: u64) {
        let mut inner = self.lock();
        if let Some(index) = inner.find_by_id(id) {
            let slot = &mut inner.slots[index];
            slot.occupied = false;
            slot.handle = None;
        }
    }

    /// Shutdown broadcast: requests close on every occupied slot and takes
    /// the handles of their workers, all under one lock acquisition. The
    /// caller joins the returned handles after the lock is released.
    pub fn close_all(&self) -> Vec<JoinHandle<()>> {
        let mut inner = self.lock();
        let mut handles = Vec::new();
        for slot in &mut inner.slots {
            if slot.occupied {
                slot.close_requested = true;
                if let Some(handle) = slot.handle.take() {
                    handles.push(handle);
                }
            }
        }
        handles
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // a poisoned lock means a worker panicked while holding it, which the
        // workers never do; giving up loudly beats running on torn state
        self.inner.lock().expect("alarm registry lock poisoned")
    }
}
