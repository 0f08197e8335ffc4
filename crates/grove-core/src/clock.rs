//! Reset boundaries for water and sun.
//!
//! Water resets once a day at a fixed local hour. Sun resets once a week at
//! a fixed local hour on a fixed weekday. "Local" is a fixed UTC offset
//! carried by the [`ResetSchedule`]; nothing here reads the host time zone
//! or the system clock. Every function takes `now` explicitly.
//!
//! A boundary belongs to the period it opens: an event stamped exactly at
//! the reset instant counts toward the new period.

use chrono::{
    DateTime, Datelike, Days, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc,
    Weekday,
};

/// Seconds in one minute, for offset conversion.
const SECONDS_PER_MINUTE: i32 = 60;

/// Errors that can occur computing reset boundaries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClockError {
    /// The reset configuration is unusable.
    #[error("invalid reset configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },

    /// A boundary falls outside the representable date range.
    #[error("reset boundary out of range")]
    OutOfRange,
}

/// When water and sun availability reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResetSchedule {
    /// The user's fixed UTC offset.
    offset: FixedOffset,
    /// Local hour of the daily water reset.
    water_hour: u32,
    /// Weekday of the weekly sun reset.
    sun_weekday: Weekday,
    /// Local hour of the weekly sun reset.
    sun_hour: u32,
}

impl ResetSchedule {
    /// Build a schedule.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the offset is not within a
    /// day or an hour is not in `0..24`.
    pub fn new(
        utc_offset_minutes: i32,
        water_hour: u32,
        sun_weekday: Weekday,
        sun_hour: u32,
    ) -> Result<Self, ClockError> {
        let offset = utc_offset_minutes
            .checked_mul(SECONDS_PER_MINUTE)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| ClockError::InvalidConfig {
                reason: format!("utc offset of {utc_offset_minutes} minutes is out of range"),
            })?;
        for (name, hour) in [("water", water_hour), ("sun", sun_hour)] {
            if hour >= 24 {
                return Err(ClockError::InvalidConfig {
                    reason: format!("{name} reset hour must be below 24, got {hour}"),
                });
            }
        }
        Ok(Self {
            offset,
            water_hour,
            sun_weekday,
            sun_hour,
        })
    }

    /// The user's fixed UTC offset.
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The local calendar date of `ts`.
    pub fn local_day(&self, ts: DateTime<Utc>) -> NaiveDate {
        self.to_local(ts).date()
    }

    /// Start of the water period containing `now`.
    pub fn water_period_start(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ClockError> {
        let local = self.to_local(now);
        let today = local
            .date()
            .and_hms_opt(self.water_hour, 0, 0)
            .ok_or(ClockError::OutOfRange)?;
        let start = if local >= today {
            today
        } else {
            today
                .checked_sub_days(Days::new(1))
                .ok_or(ClockError::OutOfRange)?
        };
        self.to_utc(start)
    }

    /// Start of the sun period containing `now`.
    pub fn sun_period_start(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ClockError> {
        let local = self.to_local(now);
        let mut day = local.date();
        while day.weekday() != self.sun_weekday {
            day = day.pred_opt().ok_or(ClockError::OutOfRange)?;
        }
        let boundary = day
            .and_hms_opt(self.sun_hour, 0, 0)
            .ok_or(ClockError::OutOfRange)?;
        let start = if local >= boundary {
            boundary
        } else {
            boundary
                .checked_sub_days(Days::new(7))
                .ok_or(ClockError::OutOfRange)?
        };
        self.to_utc(start)
    }

    /// The first water reset strictly after `now`.
    pub fn next_water_reset(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ClockError> {
        self.water_period_start(now)?
            .checked_add_days(Days::new(1))
            .ok_or(ClockError::OutOfRange)
    }

    /// The first sun reset strictly after `now`.
    pub fn next_sun_reset(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ClockError> {
        self.sun_period_start(now)?
            .checked_add_days(Days::new(7))
            .ok_or(ClockError::OutOfRange)
    }

    fn to_local(&self, ts: DateTime<Utc>) -> NaiveDateTime {
        ts.with_timezone(&self.offset).naive_local()
    }

    fn to_utc(&self, local: NaiveDateTime) -> Result<DateTime<Utc>, ClockError> {
        self.offset
            .from_local_datetime(&local)
            .single()
            .map(|ts| ts.with_timezone(&Utc))
            .ok_or(ClockError::OutOfRange)
    }
}

impl Default for ResetSchedule {
    /// UTC, water at 06:00 daily, sun at 06:00 on Mondays.
    fn default() -> Self {
        Self {
            offset: Utc.fix(),
            water_hour: 6,
            sun_weekday: Weekday::Mon,
            sun_hour: 6,
        }
    }
}

/// Whether `ts` falls in the period `[start, now]`.
pub fn within_period(ts: DateTime<Utc>, start: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    start <= ts && ts <= now
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn water_boundary_belongs_to_the_new_period() {
        let schedule = ResetSchedule::default();
        let boundary = utc(2026, 3, 4, 6, 0, 0);
        assert_eq!(schedule.water_period_start(boundary).unwrap(), boundary);
        assert_eq!(
            schedule.water_period_start(utc(2026, 3, 4, 5, 59, 59)).unwrap(),
            utc(2026, 3, 3, 6, 0, 0)
        );
    }

    #[test]
    fn next_water_reset_is_a_day_after_the_start() {
        let schedule = ResetSchedule::default();
        assert_eq!(
            schedule.next_water_reset(utc(2026, 3, 4, 12, 0, 0)).unwrap(),
            utc(2026, 3, 5, 6, 0, 0)
        );
    }

    #[test]
    fn sun_period_starts_on_monday_morning() {
        let schedule = ResetSchedule::default();
        // 2026-03-02 is a Monday.
        let monday = utc(2026, 3, 2, 6, 0, 0);
        assert_eq!(schedule.sun_period_start(monday).unwrap(), monday);
        assert_eq!(
            schedule.sun_period_start(utc(2026, 3, 7, 23, 0, 0)).unwrap(),
            monday
        );
        assert_eq!(
            schedule.sun_period_start(utc(2026, 3, 2, 5, 59, 59)).unwrap(),
            utc(2026, 2, 23, 6, 0, 0)
        );
        assert_eq!(
            schedule.next_sun_reset(utc(2026, 3, 4, 0, 0, 0)).unwrap(),
            utc(2026, 3, 9, 6, 0, 0)
        );
    }

    #[test]
    fn offset_shifts_local_boundaries() {
        // UTC-5: local 06:00 is 11:00 UTC.
        let schedule = ResetSchedule::new(-300, 6, Weekday::Mon, 6).unwrap();
        assert_eq!(
            schedule.water_period_start(utc(2026, 3, 4, 10, 59, 0)).unwrap(),
            utc(2026, 3, 3, 11, 0, 0)
        );
        assert_eq!(
            schedule.local_day(utc(2026, 3, 4, 3, 0, 0)),
            NaiveDate::from_ymd_opt(2026, 3, 3).unwrap()
        );
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(ResetSchedule::new(0, 24, Weekday::Mon, 6).is_err());
        assert!(ResetSchedule::new(0, 6, Weekday::Mon, 30).is_err());
        assert!(ResetSchedule::new(24 * 60, 6, Weekday::Mon, 6).is_err());
    }

    #[test]
    fn within_period_is_inclusive() {
        let start = utc(2026, 3, 4, 6, 0, 0);
        let now = utc(2026, 3, 4, 9, 0, 0);
        assert!(within_period(start, start, now));
        assert!(within_period(now, start, now));
        assert!(!within_period(utc(2026, 3, 4, 5, 59, 59), start, now));
        assert!(!within_period(utc(2026, 3, 4, 9, 0, 1), start, now));
    }
}
