use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use thiserror::Error;

use demogenie_core::domain::ae::{AccountExecutive, AeId, NewAccountExecutive};
use demogenie_core::domain::booking::{Booking, BookingId, NewBooking};
use demogenie_core::domain::brief::{PrepBrief, PrepBriefRecord};

pub mod ae;
pub mod booking;
pub mod memory;
pub mod prep_brief;

pub use ae::SqlAeRepository;
pub use booking::SqlBookingRepository;
pub use memory::{InMemoryAeRepository, InMemoryBookingRepository, InMemoryPrepBriefRepository};
pub use prep_brief::SqlPrepBriefRepository;

pub(crate) const SLOT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";
pub(crate) const WORKING_TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("{entity} `{id}` does not exist")]
    MissingRecord { entity: &'static str, id: String },
}

/// Roster access. `list` returns AEs in insertion order, which the scheduler
/// relies on for tie-breaking.
#[async_trait]
pub trait AeRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<AccountExecutive>, RepositoryError>;
    async fn find_by_id(&self, id: &AeId) -> Result<Option<AccountExecutive>, RepositoryError>;
    async fn insert(&self, ae: NewAccountExecutive) -> Result<AccountExecutive, RepositoryError>;
    async fn append_slot(&self, id: &AeId, slot: NaiveDateTime) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn insert(&self, booking: NewBooking) -> Result<Booking, RepositoryError>;
    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError>;
    async fn list(&self) -> Result<Vec<Booking>, RepositoryError>;
    async fn mark_brief_generated(&self, id: &BookingId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait PrepBriefRepository: Send + Sync {
    async fn insert(&self, brief: PrepBrief) -> Result<PrepBriefRecord, RepositoryError>;
    async fn latest_for_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<PrepBriefRecord>, RepositoryError>;
}

pub(crate) fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Fixed-width RFC 3339 so that `ORDER BY created_at` sorts chronologically.
pub(crate) fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn format_slot(slot: NaiveDateTime) -> String {
    slot.format(SLOT_FORMAT).to_string()
}

pub(crate) fn parse_slot(column: &str, value: &str) -> Result<NaiveDateTime, RepositoryError> {
    NaiveDateTime::parse_from_str(value, SLOT_FORMAT).map_err(|error| {
        RepositoryError::Decode(format!("invalid datetime in `{column}`: `{value}` ({error})"))
    })
}

pub(crate) fn parse_optional_slot(
    column: &str,
    value: Option<String>,
) -> Result<Option<NaiveDateTime>, RepositoryError> {
    value.map(|raw| parse_slot(column, &raw)).transpose()
}

pub(crate) fn parse_working_time(column: &str, value: &str) -> Result<NaiveTime, RepositoryError> {
    NaiveTime::parse_from_str(value, WORKING_TIME_FORMAT).map_err(|error| {
        RepositoryError::Decode(format!("invalid time in `{column}`: `{value}` ({error})"))
    })
}

pub(crate) fn parse_timestamp(column: &str, value: String) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(&value).map(|timestamp| timestamp.with_timezone(&Utc)).map_err(
        |error| {
            RepositoryError::Decode(format!("invalid timestamp in `{column}`: `{value}` ({error})"))
        },
    )
}
