//! Enumeration types for the Grove event model.
//!
//! The serialized names of every enum here are part of the shared wire
//! format: both clients read and write the same strings, so renaming a
//! variant's serde name is a breaking change to the event log.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Season
// ---------------------------------------------------------------------------

/// How long a sprout is planted for.
///
/// The season fixes the sprout's `endDate` at planting time and selects the
/// row of the planting cost table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub enum Season {
    /// Two weeks.
    #[serde(rename = "2w")]
    TwoWeeks,
    /// One month.
    #[serde(rename = "1m")]
    OneMonth,
    /// Three months.
    #[serde(rename = "3m")]
    ThreeMonths,
    /// Six months.
    #[serde(rename = "6m")]
    SixMonths,
    /// One year.
    #[serde(rename = "1y")]
    OneYear,
}

impl Season {
    /// Every season, shortest first.
    pub const ALL: [Self; 5] = [
        Self::TwoWeeks,
        Self::OneMonth,
        Self::ThreeMonths,
        Self::SixMonths,
        Self::OneYear,
    ];

    /// Length of the season in whole days.
    pub const fn duration_days(self) -> i64 {
        match self {
            Self::TwoWeeks => 14,
            Self::OneMonth => 30,
            Self::ThreeMonths => 90,
            Self::SixMonths => 182,
            Self::OneYear => 365,
        }
    }

    /// The wire name of the season (`"2w"`, `"1m"`, ...).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TwoWeeks => "2w",
            Self::OneMonth => "1m",
            Self::ThreeMonths => "3m",
            Self::SixMonths => "6m",
            Self::OneYear => "1y",
        }
    }
}

// ---------------------------------------------------------------------------
// Environment
// ---------------------------------------------------------------------------

/// How hard the goal is expected to be.
///
/// Harder environments cost more soil to plant and pay back more
/// capacity when harvested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum Environment {
    /// Favourable conditions, easiest to grow.
    Fertile,
    /// Some resistance expected.
    Firm,
    /// Hostile conditions, hardest to grow.
    Barren,
}

impl Environment {
    /// Every environment, easiest first.
    pub const ALL: [Self; 3] = [Self::Fertile, Self::Firm, Self::Barren];
}

// ---------------------------------------------------------------------------
// SproutState
// ---------------------------------------------------------------------------

/// Lifecycle state of a sprout.
///
/// `Active` is the only initial state. `Completed` and `Uprooted` are both
/// terminal and are never left once entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum SproutState {
    /// Planted and growing.
    Active,
    /// Harvested with any result, including a result of 1.
    Completed,
    /// Abandoned before harvest. Never shown in cultivated history.
    Uprooted,
}

impl SproutState {
    /// Whether the state is terminal (no further transitions allowed).
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Uprooted)
    }
}

// ---------------------------------------------------------------------------
// EventType
// ---------------------------------------------------------------------------

/// The discriminant of every event type this build understands.
///
/// Stored in the `type` column of the remote event store and in the `type`
/// field of every event JSON object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventType {
    /// A leaf (saga) was created under a twig.
    LeafCreated,
    /// A sprout was planted.
    SproutPlanted,
    /// A sprout received a journal entry.
    SproutWatered,
    /// A sprout was harvested.
    SproutHarvested,
    /// A sprout was uprooted.
    SproutUprooted,
    /// A weekly reflection was written for a twig.
    SunShone,
}

impl EventType {
    /// Every known event type.
    pub const ALL: [Self; 6] = [
        Self::LeafCreated,
        Self::SproutPlanted,
        Self::SproutWatered,
        Self::SproutHarvested,
        Self::SproutUprooted,
        Self::SunShone,
    ];

    /// The wire name of the event type.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LeafCreated => "leaf_created",
            Self::SproutPlanted => "sprout_planted",
            Self::SproutWatered => "sprout_watered",
            Self::SproutHarvested => "sprout_harvested",
            Self::SproutUprooted => "sprout_uprooted",
            Self::SunShone => "sun_shone",
        }
    }

    /// Look up an event type by its wire name.
    ///
    /// Returns `None` for names this build does not know, which callers
    /// must treat as "preserve and ignore", never as an error.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == name)
    }
}

impl core::fmt::Display for EventType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn season_wire_names_match_serde() {
        for season in Season::ALL {
            let json = serde_json::to_string(&season).ok();
            assert_eq!(json, Some(format!("\"{}\"", season.as_str())));
        }
    }

    #[test]
    fn event_type_wire_names_match_serde() {
        for event_type in EventType::ALL {
            let json = serde_json::to_string(&event_type).ok();
            assert_eq!(json, Some(format!("\"{}\"", event_type.as_str())));
            assert_eq!(EventType::from_wire(event_type.as_str()), Some(event_type));
        }
        assert_eq!(EventType::from_wire("sprout_draft_saved"), None);
    }

    #[test]
    fn terminal_states() {
        assert!(!SproutState::Active.is_terminal());
        assert!(SproutState::Completed.is_terminal());
        assert!(SproutState::Uprooted.is_terminal());
    }
}
