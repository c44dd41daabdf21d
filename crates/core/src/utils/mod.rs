pub mod decimal_utils;
pub mod keyed_locks;
pub mod time_utils;

pub use keyed_locks::KeyedLocks;
pub use time_utils::{Clock, FixedClock, SystemClock};
