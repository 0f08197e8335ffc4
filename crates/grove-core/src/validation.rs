//! Checks a locally authored event must pass before it is appended.
//!
//! Both clients run the same checks so a user cannot do on one device what
//! the other would refuse. The remote store enforces none of this, and
//! derivation does not rely on it: a log that breaks these rules (say, two
//! devices each spending the last soil offline) still derives.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use grove_types::{DerivedState, Event, EventPayload, LeafId, SproutId, SproutState};

use crate::availability::{sun_available, water_available};
use crate::clock::ClockError;
use crate::derive::ReplayRules;

/// Reasons a locally authored event is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The event type is unknown or its fields do not match.
    #[error("unrecognized event type `{0}`")]
    Unrecognized(String),

    /// The timestamp is not RFC 3339.
    #[error("event timestamp `{0}` is not RFC 3339")]
    BadTimestamp(String),

    /// A required text field is blank.
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// A text field contains a NUL character, which the remote store
    /// cannot hold.
    #[error("{0} must not contain NUL characters")]
    NulCharacter(&'static str),

    /// Not enough available soil to plant.
    #[error("planting costs {cost} soil but only {available} is available")]
    InsufficientSoil {
        /// Cost of the planting.
        cost: Decimal,
        /// Soil available.
        available: Decimal,
    },

    /// A sprout with this id already exists.
    #[error("sprout {0} already exists")]
    DuplicateSprout(SproutId),

    /// A leaf with this id already exists.
    #[error("leaf {0} already exists")]
    DuplicateLeaf(LeafId),

    /// The sprout names a leaf that does not exist.
    #[error("leaf {0} does not exist")]
    UnknownLeaf(LeafId),

    /// The event refers to a sprout that does not exist.
    #[error("sprout {0} does not exist")]
    UnknownSprout(SproutId),

    /// The sprout has already been harvested or uprooted.
    #[error("sprout {sprout_id} is {state:?}, not active")]
    NotActive {
        /// The sprout.
        sprout_id: SproutId,
        /// Its current state.
        state: SproutState,
    },

    /// Harvest result outside `1..=5`.
    #[error("harvest result must be between 1 and 5, got {0}")]
    ResultOutOfRange(u8),

    /// A soil quantity is negative.
    #[error("{0} must not be negative")]
    NegativeQuantity(&'static str),

    /// No water left until the next daily reset.
    #[error("no water left until the next reset")]
    NoWater,

    /// No sun left until the next weekly reset.
    #[error("no sun left until the next reset")]
    NoSun,

    /// Availability could not be computed.
    #[error(transparent)]
    Clock(#[from] ClockError),
}

/// Check `event` against `state` as of `now`.
///
/// # Errors
///
/// Returns the first [`ValidationError`] the event violates.
pub fn validate(
    event: &Event,
    state: &DerivedState,
    rules: &ReplayRules,
    now: DateTime<Utc>,
) -> Result<(), ValidationError> {
    let Some(payload) = event.payload() else {
        return Err(ValidationError::Unrecognized(event.type_name().to_owned()));
    };
    if event.parsed_timestamp().is_none() {
        return Err(ValidationError::BadTimestamp(event.timestamp.clone()));
    }

    match payload {
        EventPayload::LeafCreated(p) => {
            non_empty("leaf name", &p.name)?;
            storable("leaf name", &p.name)?;
            if state.leaves.contains_key(&p.leaf_id) {
                return Err(ValidationError::DuplicateLeaf(p.leaf_id));
            }
        }
        EventPayload::SproutPlanted(p) => {
            non_empty("sprout title", &p.title)?;
            storable("sprout title", &p.title)?;
            for bloom in [&p.bloom_wither, &p.bloom_budding, &p.bloom_flourish] {
                storable("bloom description", bloom.as_deref().unwrap_or_default())?;
            }
            non_negative("soilCost", p.soil_cost)?;
            if state.sprouts.contains_key(&p.sprout_id) {
                return Err(ValidationError::DuplicateSprout(p.sprout_id));
            }
            if let Some(leaf) = p.leaf_id {
                if !state.leaves.contains_key(&leaf) {
                    return Err(ValidationError::UnknownLeaf(leaf));
                }
            }
            if p.soil_cost > state.soil.available {
                return Err(ValidationError::InsufficientSoil {
                    cost: p.soil_cost,
                    available: state.soil.available,
                });
            }
        }
        EventPayload::SproutWatered(p) => {
            non_empty("journal entry", &p.content)?;
            storable("journal entry", &p.content)?;
            storable("prompt", p.prompt.as_deref().unwrap_or_default())?;
            active(state, p.sprout_id)?;
            if water_available(state, rules, now)? == 0 {
                return Err(ValidationError::NoWater);
            }
        }
        EventPayload::SproutHarvested(p) => {
            if rules.table.result_multiplier(p.result).is_none() {
                return Err(ValidationError::ResultOutOfRange(p.result));
            }
            non_negative("capacityGained", p.capacity_gained)?;
            storable("reflection", p.reflection.as_deref().unwrap_or_default())?;
            active(state, p.sprout_id)?;
        }
        EventPayload::SproutUprooted(p) => {
            non_negative("soilReturned", p.soil_returned)?;
            active(state, p.sprout_id)?;
        }
        EventPayload::SunShone(p) => {
            non_empty("reflection", &p.content)?;
            storable("reflection", &p.content)?;
            storable("twig label", &p.twig_label)?;
            if sun_available(state, rules, now)? == 0 {
                return Err(ValidationError::NoSun);
            }
        }
    }
    Ok(())
}

fn non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(())
}

fn storable(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.contains('\0') {
        return Err(ValidationError::NulCharacter(field));
    }
    Ok(())
}

fn non_negative(field: &'static str, value: Decimal) -> Result<(), ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::NegativeQuantity(field));
    }
    Ok(())
}

fn active(state: &DerivedState, id: SproutId) -> Result<(), ValidationError> {
    let sprout = state
        .sprouts
        .get(&id)
        .ok_or(ValidationError::UnknownSprout(id))?;
    if sprout.state != SproutState::Active {
        return Err(ValidationError::NotActive {
            sprout_id: id,
            state: sprout.state,
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use grove_events::{EventBuilder, Planting};
    use grove_types::{Environment, Season, TwigId};

    use super::*;
    use crate::derive::derive;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 4, 9, 0, 0).unwrap()
    }

    fn planting(season: Season, environment: Environment) -> Planting {
        Planting::new(TwigId::new(3, 3).unwrap(), "Write every day", season, environment)
    }

    #[test]
    fn planting_needs_enough_soil() {
        let rules = ReplayRules::default();
        let builder = EventBuilder::new(&rules.table);
        let state = derive(&[], &rules);
        let affordable = builder.sprout_planted(now(), planting(Season::ThreeMonths, Environment::Barren));
        assert_eq!(validate(&affordable, &state, &rules, now()), Ok(()));

        let pricey = builder.sprout_planted(now(), planting(Season::OneYear, Environment::Fertile));
        assert!(matches!(
            validate(&pricey, &state, &rules, now()),
            Err(ValidationError::InsufficientSoil { .. })
        ));
    }

    #[test]
    fn planting_into_a_missing_leaf_is_refused() {
        let rules = ReplayRules::default();
        let builder = EventBuilder::new(&rules.table);
        let state = derive(&[], &rules);
        let mut choice = planting(Season::TwoWeeks, Environment::Fertile);
        let leaf = LeafId::new();
        choice.leaf_id = Some(leaf);
        let event = builder.sprout_planted(now(), choice);
        assert_eq!(
            validate(&event, &state, &rules, now()),
            Err(ValidationError::UnknownLeaf(leaf))
        );
    }

    #[test]
    fn blank_text_is_refused() {
        let rules = ReplayRules::default();
        let builder = EventBuilder::new(&rules.table);
        let state = derive(&[], &rules);
        let event = builder.leaf_created(now(), TwigId::new(0, 0).unwrap(), "   ");
        assert_eq!(
            validate(&event, &state, &rules, now()),
            Err(ValidationError::EmptyField("leaf name"))
        );
    }

    #[test]
    fn nul_characters_are_refused() {
        let rules = ReplayRules::default();
        let builder = EventBuilder::new(&rules.table);
        let state = derive(&[], &rules);
        let title = Planting::new(
            TwigId::new(3, 3).unwrap(),
            "bad\u{0}title",
            Season::TwoWeeks,
            Environment::Fertile,
        );
        assert_eq!(
            validate(&builder.sprout_planted(now(), title), &state, &rules, now()),
            Err(ValidationError::NulCharacter("sprout title"))
        );

        let mut bloom = planting(Season::TwoWeeks, Environment::Fertile);
        bloom.bloom_flourish = Some("ran\u{0}".to_owned());
        assert_eq!(
            validate(&builder.sprout_planted(now(), bloom), &state, &rules, now()),
            Err(ValidationError::NulCharacter("bloom description"))
        );
    }

    #[test]
    fn watering_needs_an_active_sprout_and_water() {
        let rules = ReplayRules::default();
        let builder = EventBuilder::new(&rules.table);
        let plant = builder.sprout_planted(now(), planting(Season::TwoWeeks, Environment::Fertile));
        let mut log = vec![plant.clone()];
        let sprout_id = plant.payload().and_then(EventPayload::sprout_id).unwrap();

        for _ in 0..3 {
            let water = builder.sprout_watered(now(), sprout_id, "kept at it", None);
            let state = derive(&log, &rules);
            assert_eq!(validate(&water, &state, &rules, now()), Ok(()));
            log.push(water);
        }
        let fourth = builder.sprout_watered(now(), sprout_id, "again", None);
        assert_eq!(
            validate(&fourth, &derive(&log, &rules), &rules, now()),
            Err(ValidationError::NoWater)
        );

        let stranger = builder.sprout_watered(now(), SproutId::new(), "who?", None);
        assert!(matches!(
            validate(&stranger, &derive(&log, &rules), &rules, now()),
            Err(ValidationError::UnknownSprout(_))
        ));
    }

    #[test]
    fn terminal_sprouts_refuse_further_events() {
        let rules = ReplayRules::default();
        let builder = EventBuilder::new(&rules.table);
        let plant = builder.sprout_planted(now(), planting(Season::TwoWeeks, Environment::Fertile));
        let state = derive(std::slice::from_ref(&plant), &rules);
        let sprout = state.sprouts.values().next().unwrap();
        let uproot = builder.sprout_uprooted(now(), sprout).unwrap();
        let harvest = builder.sprout_harvested(now(), sprout, 5, None).unwrap();

        let after = derive(&[plant, uproot], &rules);
        assert!(matches!(
            validate(&harvest, &after, &rules, now()),
            Err(ValidationError::NotActive { state: SproutState::Uprooted, .. })
        ));
    }

    #[test]
    fn one_sun_per_week() {
        let rules = ReplayRules::default();
        let builder = EventBuilder::new(&rules.table);
        let twig = TwigId::new(1, 0).unwrap();
        let first = builder.sun_shone(now(), twig.clone(), "Health", "slept well");
        assert_eq!(validate(&first, &derive(&[], &rules), &rules, now()), Ok(()));
        let second = builder.sun_shone(now(), twig, "Health", "again");
        assert_eq!(
            validate(&second, &derive(&[first], &rules), &rules, now()),
            Err(ValidationError::NoSun)
        );
    }
}
