//! Derivation engine and runtime rules for the Grove goal tracker.
//!
//! Everything a client shows is a pure projection of the event log. This
//! crate owns that projection and the rules it runs under.
//!
//! # Modules
//!
//! - [`config`] -- Configuration loading from `grove-config.yaml` into
//!   strongly-typed structs.
//! - [`clock`] -- [`ResetSchedule`]: daily water and weekly sun boundaries
//!   at a fixed UTC offset.
//! - [`lifecycle`] -- The sprout state machine.
//! - [`derive`] -- [`derive`](derive::derive): replay a log into a
//!   [`DerivedState`](grove_types::DerivedState). Pure and total.
//! - [`availability`] -- Water and sun left at a given instant.
//! - [`views`] -- Read-only projections for presentation clients.
//! - [`validation`] -- Checks a locally authored event must pass.
//! - [`memo`] -- [`DerivationMemo`], replaying only when the log changed.

pub mod availability;
pub mod clock;
pub mod config;
pub mod derive;
pub mod lifecycle;
pub mod memo;
pub mod validation;
pub mod views;

pub use availability::{NextResets, next_resets, resources_at};
pub use clock::{ClockError, ResetSchedule};
pub use config::{ConfigError, GroveConfig};
pub use derive::{ReplayRules, derive};
pub use memo::DerivationMemo;
pub use validation::{ValidationError, validate};
