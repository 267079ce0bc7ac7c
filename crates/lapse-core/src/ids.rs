//! Timer identifiers.
//!
//! ULID ベース: 生成順にソート可能で、timestamp 部分が Clock 由来になる。

use std::fmt;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Identity of one scheduled timer in a [`crate::wheel::TimeWheel`].
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimerId(Ulid);

impl TimerId {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self(ulid)
    }

    pub fn as_ulid(&self) -> Ulid {
        self.0
    }
}

impl From<Ulid> for TimerId {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer-{}", self.0)
    }
}
