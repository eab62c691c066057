//! AE availability and assignment.
//!
//! Selection is pure: it reads a roster snapshot and returns an AE id.
//! Recording the slot is the separate [`Scheduler::book`] step, which callers
//! run only after an assignment succeeded.

use chrono::{DateTime, NaiveDateTime};

use crate::domain::ae::{AccountExecutive, AeId};
use crate::errors::DomainError;

const REQUESTED_TIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

#[derive(Clone, Copy, Debug, Default)]
pub struct Scheduler;

impl Scheduler {
    /// AEs in roster order whose window covers the time of day of
    /// `requested_time` and who hold no slot at exactly `requested_time`.
    pub fn candidates<'a>(
        &self,
        roster: &'a [AccountExecutive],
        requested_time: NaiveDateTime,
    ) -> Vec<&'a AccountExecutive> {
        roster.iter().filter(|ae| ae.is_available_at(requested_time)).collect()
    }

    /// Picks the least-loaded eligible AE. Ties keep roster order.
    pub fn assign(
        &self,
        roster: &[AccountExecutive],
        requested_time: NaiveDateTime,
    ) -> Result<AeId, DomainError> {
        self.candidates(roster, requested_time)
            .into_iter()
            .min_by_key(|ae| ae.load())
            .map(|ae| ae.id.clone())
            .ok_or(DomainError::AssignmentUnavailable { requested_time })
    }

    pub fn book(&self, ae: &mut AccountExecutive, slot: NaiveDateTime) {
        ae.booked_slots.push(slot);
    }
}

/// Accepts the `datetime-local` form value (no seconds), full ISO local
/// datetimes, and RFC 3339 with an offset. Offsets are dropped: all times
/// share one implicit zone.
pub fn parse_requested_time(raw: &str) -> Result<NaiveDateTime, DomainError> {
    let trimmed = raw.trim();

    if let Ok(with_offset) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(with_offset.naive_local());
    }

    REQUESTED_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .ok_or_else(|| DomainError::InvalidRequestedTime(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime};

    use super::{parse_requested_time, Scheduler};
    use crate::domain::ae::{AccountExecutive, AeId};
    use crate::errors::DomainError;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .expect("valid datetime")
    }

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).expect("valid time")
    }

    fn ae(id: &str, start: NaiveTime, end: NaiveTime, slots: Vec<NaiveDateTime>) -> AccountExecutive {
        AccountExecutive {
            id: AeId(id.to_string()),
            name: format!("AE {id}"),
            email: format!("{id}@example.com"),
            working_start: start,
            working_end: end,
            booked_slots: slots,
        }
    }

    #[test]
    fn window_boundaries_are_inclusive() {
        let roster = vec![ae("a", time(9, 0), time(17, 0), vec![])];
        let scheduler = Scheduler;

        assert_eq!(scheduler.assign(&roster, at(9, 0)), Ok(AeId("a".to_string())));
        assert_eq!(scheduler.assign(&roster, at(17, 0)), Ok(AeId("a".to_string())));

        let before_start = at(9, 0) - Duration::seconds(1);
        let after_end = at(17, 0) + Duration::seconds(1);
        assert!(matches!(
            scheduler.assign(&roster, before_start),
            Err(DomainError::AssignmentUnavailable { .. })
        ));
        assert!(matches!(
            scheduler.assign(&roster, after_end),
            Err(DomainError::AssignmentUnavailable { .. })
        ));
    }

    #[test]
    fn least_loaded_ae_wins() {
        let roster = vec![
            ae("busy", time(9, 0), time(17, 0), vec![at(10, 0), at(11, 0)]),
            ae("idle", time(9, 0), time(17, 0), vec![]),
        ];

        assert_eq!(Scheduler.assign(&roster, at(13, 0)), Ok(AeId("idle".to_string())));
    }

    #[test]
    fn ties_keep_roster_order() {
        let roster = vec![
            ae("first", time(9, 0), time(17, 0), vec![at(10, 0)]),
            ae("second", time(9, 0), time(17, 0), vec![at(11, 0)]),
        ];

        assert_eq!(Scheduler.assign(&roster, at(13, 0)), Ok(AeId("first".to_string())));
    }

    #[test]
    fn exact_slot_conflict_only_blocks_that_timestamp() {
        let roster = vec![
            ae("taken", time(9, 0), time(17, 0), vec![at(14, 0)]),
            ae("other", time(9, 0), time(17, 0), vec![at(9, 0), at(9, 30), at(10, 0)]),
        ];

        assert_eq!(Scheduler.assign(&roster, at(14, 0)), Ok(AeId("other".to_string())));
        assert_eq!(Scheduler.assign(&roster, at(14, 30)), Ok(AeId("taken".to_string())));
    }

    #[test]
    fn conflict_with_every_ae_is_unavailable() {
        let roster = vec![ae("only", time(9, 0), time(17, 0), vec![at(14, 0)])];

        assert_eq!(
            Scheduler.assign(&roster, at(14, 0)),
            Err(DomainError::AssignmentUnavailable { requested_time: at(14, 0) })
        );
    }

    #[test]
    fn empty_roster_is_always_unavailable() {
        for hour in [0, 9, 12, 17, 23] {
            assert!(matches!(
                Scheduler.assign(&[], at(hour, 0)),
                Err(DomainError::AssignmentUnavailable { .. })
            ));
        }
    }

    #[test]
    fn booking_appends_in_order() {
        let mut ae = ae("a", time(9, 0), time(17, 0), vec![at(9, 0)]);
        Scheduler.book(&mut ae, at(15, 0));
        Scheduler.book(&mut ae, at(10, 0));

        assert_eq!(ae.booked_slots, vec![at(9, 0), at(15, 0), at(10, 0)]);
        assert!(!ae.is_available_at(at(15, 0)));
    }

    #[test]
    fn parses_form_and_iso_time_formats() {
        assert_eq!(parse_requested_time("2024-01-15T14:00"), Ok(at(14, 0)));
        assert_eq!(parse_requested_time("2024-01-15T14:00:00"), Ok(at(14, 0)));
        assert_eq!(parse_requested_time("2024-01-15 14:00"), Ok(at(14, 0)));
        assert_eq!(parse_requested_time("2024-01-15T14:00:00+05:30"), Ok(at(14, 0)));
        assert_eq!(parse_requested_time("2024-01-15T14:00:00Z"), Ok(at(14, 0)));
        assert!(matches!(
            parse_requested_time("tomorrow afternoon"),
            Err(DomainError::InvalidRequestedTime(_))
        ));
    }
}
