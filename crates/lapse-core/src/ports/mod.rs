//! Ports - 差し替え可能な境界
//!
//! The scheduling core talks to the outside world only through these traits,
//! so tests can pin time and identities.

pub mod clock;
pub mod id_generator;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::id_generator::{IdGenerator, UlidGenerator};
