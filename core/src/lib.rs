use serde::{Deserialize, Serialize};

pub use availability::*;
pub use clock::*;
pub use countdown::*;
pub use error::*;
pub use locale::*;
pub use machine::*;
pub use message::*;
pub use notify::*;
pub use save::*;
pub use share::*;
pub use state::*;
pub use storage::*;

mod availability;
mod clock;
mod countdown;
mod error;
mod locale;
mod machine;
mod message;
mod notify;
mod save;
mod share;
mod state;
mod storage;

/// Tunable constants of the daily cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rules {
    /// Local hour of day at which a new cookie unlocks.
    pub unlock_hour: u32,
    /// Taps needed before the cookie cracks.
    pub taps_required: u32,
}

impl Rules {
    pub const DEFAULT_UNLOCK_HOUR: u32 = 10;
    pub const DEFAULT_TAPS_REQUIRED: u32 = 5;

    pub const fn new_unchecked(unlock_hour: u32, taps_required: u32) -> Self {
        Self {
            unlock_hour,
            taps_required,
        }
    }

    pub fn new(unlock_hour: u32, taps_required: u32) -> Self {
        let unlock_hour = unlock_hour.min(23);
        let taps_required = taps_required.max(1);
        Self::new_unchecked(unlock_hour, taps_required)
    }

    /// Re-applies the clamping of [`Rules::new`], for values that came from a settings file.
    pub fn sanitized(self) -> Self {
        Self::new(self.unlock_hour, self.taps_required)
    }

    pub fn schedule(&self) -> UnlockSchedule {
        UnlockSchedule::new(self.unlock_hour)
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::new_unchecked(Self::DEFAULT_UNLOCK_HOUR, Self::DEFAULT_TAPS_REQUIRED)
    }
}
