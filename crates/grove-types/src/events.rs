//! The event model: the only unit of persisted change.
//!
//! An [`Event`] is an immutable record stamped by the authoring device with
//! a client-generated [`EventId`] and an RFC 3339 timestamp. Its JSON form is
//! one flat object shared byte-for-byte with the browser client:
//!
//! ```text
//! { "clientId": "...", "timestamp": "2026-03-01T09:00:00.000Z",
//!   "type": "sprout_watered", "sproutId": "...", "content": "..." }
//! ```
//!
//! Events whose `type` this build does not know, or whose fields do not
//! match the known shape, deserialize into [`EventBody::Unrecognized`]. They
//! are kept and synced verbatim so that a newer client's events survive a
//! round trip through an older one; derivation simply ignores them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

use crate::enums::{Environment, EventType, Season};
use crate::ids::{EventId, LeafId, SproutId};
use crate::taxonomy::TwigId;

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// Payload of a `leaf_created` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct LeafCreated {
    /// The new leaf.
    pub leaf_id: LeafId,
    /// The twig the leaf hangs from.
    pub twig_id: TwigId,
    /// Display name of the saga.
    pub name: String,
}

/// Payload of a `sprout_planted` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SproutPlanted {
    /// The new sprout.
    pub sprout_id: SproutId,
    /// The twig the sprout grows on.
    pub twig_id: TwigId,
    /// Optional saga the sprout belongs to. A soft reference: the leaf may
    /// not exist (yet) in the local view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_id: Option<LeafId>,
    /// What the user is working towards.
    pub title: String,
    /// Planting duration.
    pub season: Season,
    /// Expected difficulty.
    pub environment: Environment,
    /// Soil debited at planting.
    #[ts(as = "String")]
    pub soil_cost: Decimal,
    /// What failure would look like.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bloom_wither: Option<String>,
    /// What a partial result would look like.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bloom_budding: Option<String>,
    /// What full success would look like.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bloom_flourish: Option<String>,
}

/// Payload of a `sprout_watered` event (a journal entry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SproutWatered {
    /// The sprout being watered.
    pub sprout_id: SproutId,
    /// Journal text.
    pub content: String,
    /// The prompt shown to the user, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
}

/// Payload of a `sprout_harvested` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SproutHarvested {
    /// The sprout being harvested.
    pub sprout_id: SproutId,
    /// Self-assessed outcome, 1 (showed up) to 5 (flourished).
    pub result: u8,
    /// Closing reflection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<String>,
    /// Soil capacity earned, computed by the authoring client.
    #[ts(as = "String")]
    pub capacity_gained: Decimal,
}

/// Payload of a `sprout_uprooted` event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SproutUprooted {
    /// The sprout being uprooted.
    pub sprout_id: SproutId,
    /// Soil refunded, computed by the authoring client.
    #[ts(as = "String")]
    pub soil_returned: Decimal,
}

/// Payload of a `sun_shone` event (a weekly reflection on a twig).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct SunShone {
    /// The twig reflected on.
    pub twig_id: TwigId,
    /// The twig's label at the time of writing.
    pub twig_label: String,
    /// Reflection text.
    pub content: String,
}

/// The typed payload of every known event type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum EventPayload {
    /// See [`LeafCreated`].
    LeafCreated(LeafCreated),
    /// See [`SproutPlanted`].
    SproutPlanted(SproutPlanted),
    /// See [`SproutWatered`].
    SproutWatered(SproutWatered),
    /// See [`SproutHarvested`].
    SproutHarvested(SproutHarvested),
    /// See [`SproutUprooted`].
    SproutUprooted(SproutUprooted),
    /// See [`SunShone`].
    SunShone(SunShone),
}

impl EventPayload {
    /// The discriminant of this payload.
    pub const fn event_type(&self) -> EventType {
        match self {
            Self::LeafCreated(_) => EventType::LeafCreated,
            Self::SproutPlanted(_) => EventType::SproutPlanted,
            Self::SproutWatered(_) => EventType::SproutWatered,
            Self::SproutHarvested(_) => EventType::SproutHarvested,
            Self::SproutUprooted(_) => EventType::SproutUprooted,
            Self::SunShone(_) => EventType::SunShone,
        }
    }

    /// The sprout this payload refers to, if any.
    pub const fn sprout_id(&self) -> Option<SproutId> {
        match self {
            Self::SproutPlanted(p) => Some(p.sprout_id),
            Self::SproutWatered(p) => Some(p.sprout_id),
            Self::SproutHarvested(p) => Some(p.sprout_id),
            Self::SproutUprooted(p) => Some(p.sprout_id),
            Self::LeafCreated(_) | Self::SunShone(_) => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// Either a payload this build understands, or the raw fields of one it
/// does not.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventBody {
    /// A well-formed event of a known type.
    Known(EventPayload),
    /// Any other object. Preserved verbatim, ignored by derivation.
    Unrecognized(Map<String, Value>),
}

/// An immutable, timestamped record of one user action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Client-generated unique id; the dedup key everywhere.
    #[serde(rename = "clientId")]
    pub client_id: EventId,
    /// Caller-stamped RFC 3339 timestamp. Kept as the raw string so that an
    /// unparseable value survives storage and sync unchanged.
    pub timestamp: String,
    /// Type tag and type-specific fields.
    #[serde(flatten)]
    pub body: EventBody,
}

impl Event {
    /// Build an event of a known type.
    pub const fn new(client_id: EventId, timestamp: String, payload: EventPayload) -> Self {
        Self {
            client_id,
            timestamp,
            body: EventBody::Known(payload),
        }
    }

    /// Rebuild an event from the columns of a remote store row.
    ///
    /// `payload` holds the type-specific fields without the `type` key.
    /// Never fails: a payload that does not fit the known shape for
    /// `event_type` becomes [`EventBody::Unrecognized`].
    pub fn from_parts(client_id: EventId, timestamp: String, event_type: &str, payload: Value) -> Self {
        let mut fields = match payload {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("payload".to_owned(), other);
                map
            }
        };
        fields.insert("type".to_owned(), Value::String(event_type.to_owned()));
        let body = serde_json::from_value::<EventPayload>(Value::Object(fields.clone()))
            .map_or(EventBody::Unrecognized(fields), EventBody::Known);
        Self {
            client_id,
            timestamp,
            body,
        }
    }

    /// Split the body into the `(type, payload)` columns of a remote row.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the payload cannot be encoded.
    pub fn to_parts(&self) -> Result<(String, Value), serde_json::Error> {
        let mut fields = match serde_json::to_value(&self.body)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let type_name = self.type_name().to_owned();
        fields.remove("type");
        Ok((type_name, Value::Object(fields)))
    }

    /// The typed payload, if this build understands the event.
    pub const fn payload(&self) -> Option<&EventPayload> {
        match &self.body {
            EventBody::Known(payload) => Some(payload),
            EventBody::Unrecognized(_) => None,
        }
    }

    /// The event type, if known.
    pub const fn event_type(&self) -> Option<EventType> {
        match &self.body {
            EventBody::Known(payload) => Some(payload.event_type()),
            EventBody::Unrecognized(_) => None,
        }
    }

    /// The wire name of the event type, known or not.
    pub fn type_name(&self) -> &str {
        match &self.body {
            EventBody::Known(payload) => payload.event_type().as_str(),
            EventBody::Unrecognized(fields) => fields
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("unknown"),
        }
    }

    /// The timestamp parsed as RFC 3339, or `None` if it is not valid.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|ts| ts.with_timezone(&Utc))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn twig() -> TwigId {
        TwigId::new(0, 1).unwrap()
    }

    #[test]
    fn known_event_serializes_flat() {
        let sprout_id = SproutId::new();
        let event = Event::new(
            EventId::new(),
            "2026-03-01T09:00:00.000Z".to_owned(),
            EventPayload::SproutWatered(SproutWatered {
                sprout_id,
                content: "ran 5k".to_owned(),
                prompt: None,
            }),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "sprout_watered");
        assert_eq!(json["sproutId"], sprout_id.to_string());
        assert_eq!(json["timestamp"], "2026-03-01T09:00:00.000Z");
        assert!(json.get("prompt").is_none());

        let back: Event = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }

    #[test]
    fn numeric_and_string_decimals_both_parse() {
        let raw = serde_json::json!({
            "clientId": EventId::new().to_string(),
            "timestamp": "2026-03-01T09:00:00Z",
            "type": "sprout_uprooted",
            "sproutId": SproutId::new().to_string(),
            "soilReturned": 0.5,
        });
        let event: Event = serde_json::from_value(raw).unwrap();
        assert!(matches!(
            event.payload(),
            Some(EventPayload::SproutUprooted(p)) if p.soil_returned == Decimal::new(5, 1)
        ));
    }

    #[test]
    fn unknown_type_is_preserved() {
        let raw = serde_json::json!({
            "clientId": EventId::new().to_string(),
            "timestamp": "2026-03-01T09:00:00Z",
            "type": "sprout_pruned",
            "sproutId": "whatever",
        });
        let event: Event = serde_json::from_value(raw.clone()).unwrap();
        assert!(event.payload().is_none());
        assert_eq!(event.type_name(), "sprout_pruned");
        assert_eq!(serde_json::to_value(&event).unwrap(), raw);
    }

    #[test]
    fn malformed_known_type_is_unrecognized() {
        let raw = serde_json::json!({
            "clientId": EventId::new().to_string(),
            "timestamp": "2026-03-01T09:00:00Z",
            "type": "sprout_harvested",
            "sproutId": SproutId::new().to_string(),
            "result": "great",
            "capacityGained": 1,
        });
        let event: Event = serde_json::from_value(raw).unwrap();
        assert!(event.event_type().is_none());
        assert_eq!(event.type_name(), "sprout_harvested");
    }

    #[test]
    fn parts_round_trip_through_remote_columns() {
        let event = Event::new(
            EventId::new(),
            "2026-03-01T09:00:00Z".to_owned(),
            EventPayload::SunShone(SunShone {
                twig_id: twig(),
                twig_label: "Running".to_owned(),
                content: "steady week".to_owned(),
            }),
        );
        let (event_type, payload) = event.to_parts().unwrap();
        assert_eq!(event_type, "sun_shone");
        assert!(payload.get("type").is_none());

        let rebuilt = Event::from_parts(event.client_id, event.timestamp.clone(), &event_type, payload);
        assert_eq!(rebuilt, event);
    }

    #[test]
    fn unparseable_timestamp_is_none() {
        let event = Event::new(
            EventId::new(),
            "last tuesday".to_owned(),
            EventPayload::LeafCreated(LeafCreated {
                leaf_id: LeafId::new(),
                twig_id: twig(),
                name: "Marathon".to_owned(),
            }),
        );
        assert!(event.parsed_timestamp().is_none());
    }
}
