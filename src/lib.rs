#![warn(clippy::pedantic, clippy::nursery, clippy::cargo)]
#![deny(clippy::use_self, rust_2018_idioms)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]

//! A small concurrent alarm scheduler.
//!
//! Alarms live in a fixed-capacity registry behind one lock; each active
//! alarm is watched by its own worker thread that polls until the alarm
//! rings, is cancelled, or vanishes. The [`scheduler::Scheduler`] ties the
//! two together and reports everything that happens as
//! [`communication::Event`]s on an mpsc channel.

pub mod alarm;
pub mod communication;
pub mod config;
pub mod registry;
pub mod scheduler;
mod worker;
