//! OSC timetag handling
//!
//! OSC timestamps count seconds since the NTP epoch (1 January 1900) plus a
//! 32-bit binary fraction of a second. The reserved pair `(0, 1)` means
//! "execute immediately". This module converts between that representation
//! and milliseconds since the Unix epoch; sub-millisecond precision is lost
//! on round-trip, which the format tolerates.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds between the NTP epoch (1900) and the Unix epoch (1970)
pub const NTP_UNIX_OFFSET: u64 = 2_208_988_800;

/// An OSC execution timestamp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OscTimeTag {
    /// The reserved "execute now" value, encoded as `(0, 1)`
    Immediate,
    /// A wall-clock instant, milliseconds since the Unix epoch
    At(u64),
}

impl OscTimeTag {
    /// Timetag for the current wall-clock time
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64;
        OscTimeTag::At(millis)
    }

    /// Unix milliseconds, or `None` for the immediate sentinel
    pub fn millis(&self) -> Option<u64> {
        match self {
            OscTimeTag::Immediate => None,
            OscTimeTag::At(millis) => Some(*millis),
        }
    }

    /// Convert to the NTP `(seconds, fraction)` wire pair
    pub fn to_ntp(&self) -> (u32, u32) {
        match self {
            OscTimeTag::Immediate => (0, 1),
            OscTimeTag::At(millis) => {
                let seconds = millis / 1000 + NTP_UNIX_OFFSET;
                let fraction =
                    ((millis % 1000) as f64 / 1000.0 * u32::MAX as f64).round() as u32;
                (seconds as u32, fraction)
            }
        }
    }

    /// Convert from the NTP `(seconds, fraction)` wire pair
    ///
    /// The fraction rounds to the nearest millisecond, so integral
    /// milliseconds survive an encode/decode round-trip exactly.
    pub fn from_ntp(seconds: u32, fraction: u32) -> Self {
        if seconds == 0 && fraction == 1 {
            return OscTimeTag::Immediate;
        }
        let unix_seconds = (seconds as u64).saturating_sub(NTP_UNIX_OFFSET);
        let sub_millis = (fraction as f64 / u32::MAX as f64 * 1000.0).round() as u64;
        OscTimeTag::At(unix_seconds * 1000 + sub_millis)
    }
}
