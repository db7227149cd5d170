//! Deduplication of concurrent loads.
//!
//! This module provides:
//! - `PendingCallbacks` for queuing completions behind one in-flight load
//! - `SingleFlight` for collapsing concurrent loads of a query

mod pending;
mod single_flight;

pub use pending::{Delivery, PendingCallbacks};
pub use single_flight::SingleFlight;
