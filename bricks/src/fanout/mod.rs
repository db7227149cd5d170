//! Prioritized fan-out with a deadline.
//!
//! A [`PriorityFanOut`] loads a list of [`PriorityItem`]s, then loads every
//! item concurrently. Items at or above the mandatory [`Priority`] must all
//! succeed before the deadline; the rest are best effort.

mod aggregator;
mod config;
mod item;

pub use aggregator::{FanOutResult, PriorityFanOut};
pub use config::{FanOutConfig, DEFAULT_TIMEOUT_MS};
pub use item::{Priority, PriorityItem};
