use serde::{Deserialize, Serialize};

/// Where the player is within one fortune-cookie cycle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    Waiting,
    CookieAvailable,
    Cracking,
    MessageRolled,
    MessageRevealed,
}

impl GameState {
    /// Whether taps on the cookie are counted in this state.
    pub const fn accepts_taps(self) -> bool {
        matches!(self, Self::CookieAvailable | Self::Cracking)
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::Waiting
    }
}

/// Payload of a state-change notification, sent after the new state is committed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StateChange {
    pub from: GameState,
    pub to: GameState,
}

/// Outcome of a single tap on the cookie.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TapOutcome {
    /// Tapping is not allowed in the current state.
    Ignored,
    /// Tap was counted, carries the running total.
    Counted(u32),
    /// Tap reached the threshold and the cookie is cracking.
    Cracked,
}

impl TapOutcome {
    /// Whether this outcome could have caused an update to the game
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

/// Outcome of a presentation signal.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TransitionOutcome {
    NoChange,
    Changed,
}

impl TransitionOutcome {
    pub const fn has_update(self) -> bool {
        match self {
            Self::NoChange => false,
            Self::Changed => true,
        }
    }
}
