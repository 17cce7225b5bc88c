//! Background schedulers.
//!
//! Runs the premium expiry sweep and the auto-share loop, each as its own
//! periodic task alongside update handling.

mod autoshare;
mod expiry;
mod runner;

pub use autoshare::{AutoShareConfig, AutoShareError, AutoShareRegistry, AutoShareScheduler};
pub use expiry::{ExpirySweeper, evict_expired};
pub use runner::{PeriodicTask, Scheduler, SchedulerMessage};
