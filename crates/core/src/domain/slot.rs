// PKCS#11 slot identifier

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Slot number as printed by `softhsm2-util --show-slots`
///
/// Newer SoftHSM releases hand out large pseudo-random slot numbers instead
/// of counting up from 0, so this is 64 bits wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SlotId(u64);

impl SlotId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SlotId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.parse::<u64>().map(SlotId)
    }
}
