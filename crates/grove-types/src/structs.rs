//! Derived entities: everything a client renders, rebuilt from the event
//! log on every derivation and never persisted on its own.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{Environment, Season, SproutState};
use crate::ids::{EventId, LeafId, SproutId};
use crate::taxonomy::TwigId;

// ---------------------------------------------------------------------------
// Leaf
// ---------------------------------------------------------------------------

/// A named saga grouping related sprouts under one twig.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Leaf {
    /// Leaf identifier.
    pub id: LeafId,
    /// Twig the leaf hangs from.
    pub twig_id: TwigId,
    /// Display name.
    pub name: String,
    /// Timestamp of the `leaf_created` event.
    pub created_at: String,
}

// ---------------------------------------------------------------------------
// Sprout
// ---------------------------------------------------------------------------

/// One journal entry recorded against a sprout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct WaterEntry {
    /// Id of the `sprout_watered` event.
    pub event_id: EventId,
    /// Timestamp of the event.
    pub timestamp: String,
    /// Journal text.
    pub content: String,
    /// Prompt shown when the entry was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Whether this entry earned the day's soil credit for the sprout.
    pub soil_credited: bool,
}

/// A goal with a bounded lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Sprout {
    /// Sprout identifier.
    pub id: SproutId,
    /// Twig the sprout grows on.
    pub twig_id: TwigId,
    /// Saga the sprout belongs to; may point at a leaf not present locally.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_id: Option<LeafId>,
    /// What the user is working towards.
    pub title: String,
    /// Planting duration.
    pub season: Season,
    /// Expected difficulty.
    pub environment: Environment,
    /// Lifecycle state.
    pub state: SproutState,
    /// Soil spent at planting.
    #[ts(as = "String")]
    pub soil_cost: Decimal,
    /// Harvest result (1..=5), set once completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<u8>,
    /// Closing reflection written at harvest.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<String>,
    /// What failure would look like.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bloom_wither: Option<String>,
    /// What a partial result would look like.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bloom_budding: Option<String>,
    /// What full success would look like.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bloom_flourish: Option<String>,
    /// Journal entries in replay order.
    pub water_entries: Vec<WaterEntry>,
    /// Timestamp of the `sprout_planted` event.
    pub created_at: String,
    /// When the season ends. Fixed at planting, never recomputed.
    pub end_date: DateTime<Utc>,
    /// Timestamp of the harvest, if completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    /// Timestamp of the uproot, if uprooted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uprooted_at: Option<String>,
}

impl Sprout {
    /// Whether the sprout's season has run its course at `now`.
    pub fn is_ready(&self, now: DateTime<Utc>) -> bool {
        self.state == SproutState::Active && self.end_date <= now
    }
}

// ---------------------------------------------------------------------------
// Sun
// ---------------------------------------------------------------------------

/// A weekly reflection written for one twig.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SunEntry {
    /// Id of the `sun_shone` event.
    pub event_id: EventId,
    /// The twig reflected on.
    pub twig_id: TwigId,
    /// The twig's label at the time of writing.
    pub twig_label: String,
    /// Reflection text.
    pub content: String,
    /// Timestamp of the event.
    pub timestamp: String,
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Soil capacity and availability after replay.
///
/// Invariant: `0 <= available <= capacity`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SoilBalance {
    /// Maximum soil the user can hold.
    #[ts(as = "String")]
    pub capacity: Decimal,
    /// Soil available to spend.
    #[ts(as = "String")]
    pub available: Decimal,
}

/// Every resource as seen at one instant.
///
/// Water and sun are counted on demand against the reset boundaries in
/// effect at that instant; they are never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ResourceState {
    /// Maximum soil the user can hold.
    #[ts(as = "String")]
    pub soil_capacity: Decimal,
    /// Soil available to spend.
    #[ts(as = "String")]
    pub soil_available: Decimal,
    /// Waterings left before the next daily reset.
    pub water_available: u32,
    /// Sun reflections left before the next weekly reset.
    pub sun_available: u32,
}

// ---------------------------------------------------------------------------
// Anomalies
// ---------------------------------------------------------------------------

/// Why derivation skipped or partially applied an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum AnomalyKind {
    /// The event type is unknown or its fields do not match the known shape.
    Unrecognized,
    /// The event parsed but carries out-of-range values.
    Malformed,
    /// The event refers to a sprout the log has not planted.
    UnknownSprout,
    /// A second creation event reused an existing sprout id.
    DuplicateId,
    /// A terminal event arrived for a sprout that already ended.
    TerminalConflict,
}

/// One event derivation could not fully interpret.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct ReplayAnomaly {
    /// Id of the offending event.
    pub event_id: EventId,
    /// Wire name of its type.
    pub event_type: String,
    /// Category of the problem.
    pub kind: AnomalyKind,
    /// Human-readable detail.
    pub detail: String,
}

// ---------------------------------------------------------------------------
// DerivedState
// ---------------------------------------------------------------------------

/// The read-only render snapshot produced by replaying the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct DerivedState {
    /// Soil after the last event.
    pub soil: SoilBalance,
    /// Every leaf, keyed by id.
    pub leaves: BTreeMap<LeafId, Leaf>,
    /// Every sprout in any state, keyed by id.
    pub sprouts: BTreeMap<SproutId, Sprout>,
    /// Sun reflections in replay order.
    pub sun_entries: Vec<SunEntry>,
    /// Parsed timestamps of every applied watering, in replay order.
    pub watered_at: Vec<DateTime<Utc>>,
    /// Parsed timestamps of every applied sun reflection, in replay order.
    pub shone_at: Vec<DateTime<Utc>>,
    /// Events that were skipped or ignored, in replay order.
    pub anomalies: Vec<ReplayAnomaly>,
    /// Number of events that changed state.
    pub events_applied: u64,
}

impl DerivedState {
    /// A state with no leaves, sprouts, or history and the given soil.
    pub const fn empty(soil: SoilBalance) -> Self {
        Self {
            soil,
            leaves: BTreeMap::new(),
            sprouts: BTreeMap::new(),
            sun_entries: Vec::new(),
            watered_at: Vec::new(),
            shone_at: Vec::new(),
            anomalies: Vec::new(),
            events_applied: 0,
        }
    }
}
