//! Shared type definitions for the Grove goal tracker.
//!
//! This crate is the single source of truth for the event model and the
//! derived entities both clients render. Types flow to `TypeScript` via
//! `ts-rs` for the browser-hosted client, which must read and write the
//! exact same JSON.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe random UUID wrappers for events, sprouts, leaves
//! - [`enums`] -- Season, environment, lifecycle state, event type
//! - [`taxonomy`] -- The fixed branch/twig tree
//! - [`events`] -- The [`Event`] tagged union and its payloads
//! - [`structs`] -- Derived entities and the [`DerivedState`] snapshot

pub mod enums;
pub mod events;
pub mod ids;
pub mod structs;
pub mod taxonomy;

// Re-export all public types at crate root for convenience.
pub use enums::{Environment, EventType, Season, SproutState};
pub use events::{
    Event, EventBody, EventPayload, LeafCreated, SproutHarvested, SproutPlanted, SproutUprooted,
    SproutWatered, SunShone,
};
pub use ids::{EventId, LeafId, SproutId};
pub use structs::{
    AnomalyKind, DerivedState, Leaf, ReplayAnomaly, ResourceState, SoilBalance, Sprout, SunEntry,
    WaterEntry,
};
pub use taxonomy::{InvalidTwig, TwigId};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the browser client.

    #[test]
    fn export_bindings() {
        // Files land in `bindings/` relative to the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::EventId::export_all();
        let _ = crate::ids::SproutId::export_all();
        let _ = crate::ids::LeafId::export_all();
        let _ = crate::taxonomy::TwigId::export_all();

        // Enums
        let _ = crate::enums::Season::export_all();
        let _ = crate::enums::Environment::export_all();
        let _ = crate::enums::SproutState::export_all();
        let _ = crate::enums::EventType::export_all();
        let _ = crate::structs::AnomalyKind::export_all();

        // Events
        let _ = crate::events::EventPayload::export_all();

        // Derived state
        let _ = crate::structs::DerivedState::export_all();
        let _ = crate::structs::ResourceState::export_all();
    }
}
