use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AeId(pub String);

/// Sales representative who runs merchant demos.
///
/// The working window applies to every day; only the time of day of a
/// requested slot is checked against it. `booked_slots` keeps booking order
/// and is append-only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountExecutive {
    pub id: AeId,
    pub name: String,
    pub email: String,
    pub working_start: NaiveTime,
    pub working_end: NaiveTime,
    pub booked_slots: Vec<NaiveDateTime>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccountExecutive {
    pub name: String,
    pub email: String,
    pub working_start: NaiveTime,
    pub working_end: NaiveTime,
}

impl AccountExecutive {
    /// Closed on both ends: a slot at exactly `working_end` is in hours.
    pub fn is_within_working_hours(&self, at: NaiveDateTime) -> bool {
        let time_of_day = at.time();
        self.working_start <= time_of_day && time_of_day <= self.working_end
    }

    pub fn has_slot(&self, at: NaiveDateTime) -> bool {
        self.booked_slots.contains(&at)
    }

    pub fn is_available_at(&self, at: NaiveDateTime) -> bool {
        self.is_within_working_hours(at) && !self.has_slot(at)
    }

    pub fn load(&self) -> usize {
        self.booked_slots.len()
    }
}
