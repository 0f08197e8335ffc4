//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every event, sprout, and leaf carries a strongly-typed ID so that a
//! sprout id can never be passed where a leaf id is expected. All IDs are
//! UUID v4: 122 bits of randomness generated on the authoring device.
//! Sync correctness depends on ids staying unique across devices whose
//! clocks disagree, so nothing here is derived from timestamps.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new random identifier (UUID v4).
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl core::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Client-generated identifier of an event.
    ///
    /// This is the single dedup key for sync: the remote store enforces
    /// uniqueness on it, and merges skip any id already in the local log.
    EventId
}

define_id! {
    /// Unique identifier for a sprout (a goal with a bounded lifecycle).
    SproutId
}

define_id! {
    /// Unique identifier for a leaf (a named saga grouping sprouts).
    LeafId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_random_and_distinct() {
        let a = SproutId::new();
        let b = SproutId::new();
        assert_ne!(a, b);
        assert_eq!(a.into_inner().get_version_num(), 4);
    }

    #[test]
    fn id_serializes_as_bare_uuid_string() {
        let id = EventId::new();
        let json = serde_json::to_string(&id).ok();
        assert_eq!(json, Some(format!("\"{id}\"")));
    }

    #[test]
    fn id_parses_from_str() {
        let id = LeafId::new();
        let parsed: Result<LeafId, _> = id.to_string().parse();
        assert_eq!(parsed.ok(), Some(id));
        assert!("not-a-uuid".parse::<LeafId>().is_err());
    }
}
