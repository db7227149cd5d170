//! One-to-one query decorators.
//!
//! Each decorator wraps one (or two) queries and is itself a query. They
//! keep their state behind an `Arc` and resume through a `Weak`, so a
//! decorator dropped mid-load never invokes the caller's completion.

mod converter;
mod expiring;
mod fallback;
mod notifying;
mod storing;
mod synchronizer;

pub use converter::Map;
pub use expiring::ExpiringCache;
pub use fallback::{Fallback, SecondChance};
pub use notifying::Notifying;
pub use storing::Storing;
pub use synchronizer::Zip;
