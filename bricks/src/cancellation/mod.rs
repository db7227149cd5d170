//! Cancellation and deadlines.
//!
//! This module provides:
//! - CancellationToken for cooperative cancellation
//! - Deadline for one-shot timers that are cancelled by dropping their guard

mod deadline;
mod token;

pub use deadline::{Deadline, DeadlineGuard};
pub use token::CancellationToken;
