//! The sprout lifecycle state machine.
//!
//! ```text
//!   sprout_planted ──▶ active ──sprout_harvested──▶ completed
//!                        │
//!                        └────sprout_uprooted─────▶ uprooted
//! ```
//!
//! `active` is entered only by planting. Both other states are terminal.
//! A harvest completes the sprout whatever its result; there is no
//! separate failed state.

use grove_types::SproutState;

/// An event that moves a sprout out of `active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// `sprout_harvested`, with any result.
    Harvest,
    /// `sprout_uprooted`.
    Uproot,
}

impl Transition {
    /// The state this transition leads to.
    pub const fn target(self) -> SproutState {
        match self {
            Self::Harvest => SproutState::Completed,
            Self::Uproot => SproutState::Uprooted,
        }
    }
}

/// The state after applying `transition` to a sprout in `current`.
///
/// Returns `None` when `current` is terminal: the first terminal event wins
/// and later ones are ignored by the caller.
pub const fn next_state(current: SproutState, transition: Transition) -> Option<SproutState> {
    match current {
        SproutState::Active => Some(transition.target()),
        SproutState::Completed | SproutState::Uprooted => None,
    }
}
