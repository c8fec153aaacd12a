use std::thread::JoinHandle;

use chrono::{DateTime, Local};

/// one slot in the alarm table
///
/// every field is guarded by the registry lock, nothing outside the registry
/// touches a slot directly. when `occupied` is false the other fields are
/// leftovers from the previous occupancy and mean nothing.
#[derive(Debug)]
pub(crate) struct Alarm {
    pub(crate) id: u64,
    pub(crate) message: String,
    /// alarm duration in seconds, kept for display
    pub(crate) duration: u64,
    /// absolute instant the alarm should ring at
    pub(crate) ring_time: DateTime<Local>,
    pub(crate) occupied: bool,
    /// set by cancellation; never reset within one occupancy
    pub(crate) close_requested: bool,
    /// the bound worker, present only between spawn and join
    pub(crate) handle: Option<JoinHandle<()>>,
}

impl Alarm {
    pub(crate) fn vacant() -> Self {
        Self {
            id: 0,
            message: String::new(),
            duration: 0,
            ring_time: Local::now(),
            occupied: false,
            close_requested: false,
            handle: None,
        }
    }
}

/// A copy of a slot's user-visible state, taken atomically under the
/// registry lock. Workers only ever see their alarm through one of these.
#[derive(Debug, Clone)]
pub struct AlarmView {
    pub id: u64,
    pub message: String,
    pub duration: u64,
    pub ring_time: DateTime<Local>,
    pub close_requested: bool,
}
