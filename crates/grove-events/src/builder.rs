//! Construction of locally authored events.
//!
//! [`EventBuilder`] is how a user action becomes an [`Event`]. It stamps a
//! fresh random client id and the caller's `now`, and it computes the soil
//! quantities each event carries from the [`EconomyTable`] in force at
//! authoring time. Replay trusts those stamped quantities.

use chrono::{DateTime, SecondsFormat, Utc};

use grove_ledger::{EconomyTable, costs};
use grove_types::{
    Environment, Event, EventId, EventPayload, LeafCreated, LeafId, Season, Sprout,
    SproutHarvested, SproutId, SproutPlanted, SproutUprooted, SproutWatered, SunShone, TwigId,
};

use crate::LogError;

/// Everything the user chooses when planting a sprout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Planting {
    /// Twig the sprout grows on.
    pub twig_id: TwigId,
    /// Optional saga.
    pub leaf_id: Option<LeafId>,
    /// What the user is working towards.
    pub title: String,
    /// Planting duration.
    pub season: Season,
    /// Expected difficulty.
    pub environment: Environment,
    /// What failure would look like.
    pub bloom_wither: Option<String>,
    /// What a partial result would look like.
    pub bloom_budding: Option<String>,
    /// What full success would look like.
    pub bloom_flourish: Option<String>,
}

impl Planting {
    /// A planting with no leaf and no bloom descriptions.
    pub fn new(twig_id: TwigId, title: impl Into<String>, season: Season, environment: Environment) -> Self {
        Self {
            twig_id,
            leaf_id: None,
            title: title.into(),
            season,
            environment,
            bloom_wither: None,
            bloom_budding: None,
            bloom_flourish: None,
        }
    }
}

/// Builds events stamped with fresh ids and ledger-computed quantities.
#[derive(Debug, Clone, Copy)]
pub struct EventBuilder<'a> {
    table: &'a EconomyTable,
}

impl<'a> EventBuilder<'a> {
    /// A builder pricing events with `table`.
    pub const fn new(table: &'a EconomyTable) -> Self {
        Self { table }
    }

    /// `leaf_created` with a fresh leaf id.
    pub fn leaf_created(&self, now: DateTime<Utc>, twig_id: TwigId, name: impl Into<String>) -> Event {
        stamp(
            now,
            EventPayload::LeafCreated(LeafCreated {
                leaf_id: LeafId::new(),
                twig_id,
                name: name.into(),
            }),
        )
    }

    /// `sprout_planted` with a fresh sprout id and the table's planting cost.
    pub fn sprout_planted(&self, now: DateTime<Utc>, planting: Planting) -> Event {
        let soil_cost = costs::planting_cost(self.table, planting.season, planting.environment);
        stamp(
            now,
            EventPayload::SproutPlanted(SproutPlanted {
                sprout_id: SproutId::new(),
                twig_id: planting.twig_id,
                leaf_id: planting.leaf_id,
                title: planting.title,
                season: planting.season,
                environment: planting.environment,
                soil_cost,
                bloom_wither: planting.bloom_wither,
                bloom_budding: planting.bloom_budding,
                bloom_flourish: planting.bloom_flourish,
            }),
        )
    }

    /// `sprout_watered` for `sprout_id`.
    pub fn sprout_watered(
        &self,
        now: DateTime<Utc>,
        sprout_id: SproutId,
        content: impl Into<String>,
        prompt: Option<String>,
    ) -> Event {
        stamp(
            now,
            EventPayload::SproutWatered(SproutWatered {
                sprout_id,
                content: content.into(),
                prompt,
            }),
        )
    }

    /// `sprout_harvested` for `sprout`, with the capacity gain its cost,
    /// environment, and `result` earn.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Ledger`] if `result` is outside `1..=5` or the
    /// gain cannot be computed.
    pub fn sprout_harvested(
        &self,
        now: DateTime<Utc>,
        sprout: &Sprout,
        result: u8,
        reflection: Option<String>,
    ) -> Result<Event, LogError> {
        let capacity_gained =
            costs::capacity_gain(self.table, sprout.soil_cost, sprout.environment, result)?;
        Ok(stamp(
            now,
            EventPayload::SproutHarvested(SproutHarvested {
                sprout_id: sprout.id,
                result,
                reflection,
                capacity_gained,
            }),
        ))
    }

    /// `sprout_uprooted` for `sprout`, refunding a fraction of its cost.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::Ledger`] if the refund cannot be computed.
    pub fn sprout_uprooted(&self, now: DateTime<Utc>, sprout: &Sprout) -> Result<Event, LogError> {
        let soil_returned = costs::uproot_refund(self.table, sprout.soil_cost)?;
        Ok(stamp(
            now,
            EventPayload::SproutUprooted(SproutUprooted {
                sprout_id: sprout.id,
                soil_returned,
            }),
        ))
    }

    /// `sun_shone` reflecting on `twig_id`.
    pub fn sun_shone(
        &self,
        now: DateTime<Utc>,
        twig_id: TwigId,
        twig_label: impl Into<String>,
        content: impl Into<String>,
    ) -> Event {
        stamp(
            now,
            EventPayload::SunShone(SunShone {
                twig_id,
                twig_label: twig_label.into(),
                content: content.into(),
            }),
        )
    }
}

/// Wire form of an authoring timestamp: RFC 3339, millisecond precision, `Z`.
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn stamp(now: DateTime<Utc>, payload: EventPayload) -> Event {
    Event::new(EventId::new(), format_timestamp(now), payload)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use grove_types::SproutState;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap()
    }

    fn sprout(soil_cost: Decimal, environment: Environment) -> Sprout {
        Sprout {
            id: SproutId::new(),
            twig_id: TwigId::new(2, 3).unwrap(),
            leaf_id: None,
            title: "Run a 10k".to_owned(),
            season: Season::OneMonth,
            environment,
            state: SproutState::Active,
            soil_cost,
            result: None,
            reflection: None,
            bloom_wither: None,
            bloom_budding: None,
            bloom_flourish: None,
            water_entries: Vec::new(),
            created_at: format_timestamp(now()),
            end_date: now(),
            completed_at: None,
            uprooted_at: None,
        }
    }

    #[test]
    fn timestamps_are_millisecond_utc() {
        assert_eq!(format_timestamp(now()), "2026-03-01T09:30:00.000Z");
    }

    #[test]
    fn planting_carries_the_table_cost() {
        let table = EconomyTable::default();
        let builder = EventBuilder::new(&table);
        let event = builder.sprout_planted(
            now(),
            Planting::new(TwigId::new(0, 0).unwrap(), "Learn piano", Season::ThreeMonths, Environment::Barren),
        );
        assert!(matches!(
            event.payload(),
            Some(EventPayload::SproutPlanted(p)) if p.soil_cost == Decimal::new(10, 0)
        ));
        assert_eq!(event.parsed_timestamp(), Some(now()));
    }

    #[test]
    fn every_event_gets_a_fresh_id() {
        let table = EconomyTable::default();
        let builder = EventBuilder::new(&table);
        let twig = TwigId::new(1, 1).unwrap();
        let a = builder.sun_shone(now(), twig.clone(), "Fitness", "good week");
        let b = builder.sun_shone(now(), twig, "Fitness", "good week");
        assert_ne!(a.client_id, b.client_id);
    }

    #[test]
    fn harvest_and_uproot_price_from_the_sprout() {
        let table = EconomyTable::default();
        let builder = EventBuilder::new(&table);
        let target = sprout(Decimal::new(5, 0), Environment::Firm);

        let harvest = builder.sprout_harvested(now(), &target, 3, None).unwrap();
        // 5 * 1.75 * 0.7 = 6.125 -> 6.13
        assert!(matches!(
            harvest.payload(),
            Some(EventPayload::SproutHarvested(p)) if p.capacity_gained == Decimal::new(613, 2)
        ));

        let uproot = builder.sprout_uprooted(now(), &target).unwrap();
        assert!(matches!(
            uproot.payload(),
            Some(EventPayload::SproutUprooted(p)) if p.soil_returned == Decimal::new(125, 2)
        ));
    }

    #[test]
    fn harvest_rejects_out_of_range_result() {
        let table = EconomyTable::default();
        let builder = EventBuilder::new(&table);
        let target = sprout(Decimal::new(2, 0), Environment::Fertile);
        assert!(builder.sprout_harvested(now(), &target, 6, None).is_err());
    }
}
