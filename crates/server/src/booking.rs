use std::sync::Arc;

use chrono::NaiveDateTime;
use tokio::sync::Mutex;

use demogenie_agent::PrepBriefGenerator;
use demogenie_core::domain::ae::{AccountExecutive, AeId};
use demogenie_core::domain::booking::{Booking, BookingId, MerchantProfile, NewBooking, SlotAssignment};
use demogenie_core::domain::brief::PrepBriefRecord;
use demogenie_core::errors::{ApplicationError, DomainError};
use demogenie_core::scheduling::Scheduler;
use demogenie_db::{
    AeRepository, BookingRepository, DbPool, PrepBriefRepository, RepositoryError,
    SqlAeRepository, SqlBookingRepository, SqlPrepBriefRepository,
};

pub const PLACEHOLDER_MEETING_LINK: &str = "https://meet.google.com/placeholder-meeting";

/// A booking together with the AE it points at, when that AE still exists.
#[derive(Clone, Debug)]
pub struct BookingView {
    pub booking: Booking,
    pub ae: Option<AccountExecutive>,
}

/// Sequences the scheduler, the brief generator and the stores.
///
/// `book_demo` holds `assignment_lock` from reading the roster until the
/// booking is stored, so two requests in this process cannot both take the
/// last free AE for the same time.
pub struct BookingService {
    aes: Arc<dyn AeRepository>,
    bookings: Arc<dyn BookingRepository>,
    briefs: Arc<dyn PrepBriefRepository>,
    generator: Arc<PrepBriefGenerator>,
    scheduler: Scheduler,
    assignment_lock: Mutex<()>,
}

impl BookingService {
    pub fn new(
        aes: Arc<dyn AeRepository>,
        bookings: Arc<dyn BookingRepository>,
        briefs: Arc<dyn PrepBriefRepository>,
        generator: Arc<PrepBriefGenerator>,
    ) -> Self {
        Self {
            aes,
            bookings,
            briefs,
            generator,
            scheduler: Scheduler,
            assignment_lock: Mutex::new(()),
        }
    }

    pub fn with_pool(pool: DbPool, generator: Arc<PrepBriefGenerator>) -> Self {
        Self::new(
            Arc::new(SqlAeRepository::new(pool.clone())),
            Arc::new(SqlBookingRepository::new(pool.clone())),
            Arc::new(SqlPrepBriefRepository::new(pool)),
            generator,
        )
    }

    pub async fn book_demo(
        &self,
        merchant: MerchantProfile,
        preferred_time: NaiveDateTime,
    ) -> Result<BookingView, ApplicationError> {
        let _guard = self.assignment_lock.lock().await;

        let roster = self.aes.list().await.map_err(persistence)?;
        let ae_id = match self.scheduler.assign(&roster, preferred_time) {
            Ok(ae_id) => ae_id,
            Err(error) => {
                tracing::info!(
                    event_name = "booking.assignment.unavailable",
                    correlation_id = "unassigned",
                    requested_time = %preferred_time,
                    roster_size = roster.len(),
                    "no AE available for requested time"
                );
                return Err(error.into());
            }
        };

        let mut ae = roster.into_iter().find(|ae| ae.id == ae_id).ok_or_else(|| {
            DomainError::InvariantViolation(format!("assigned AE `{}` left the roster", ae_id.0))
        })?;

        // Slot before booking: a stored assignment always has its slot recorded.
        self.aes.append_slot(&ae_id, preferred_time).await.map_err(persistence)?;
        self.scheduler.book(&mut ae, preferred_time);

        let booking = self
            .bookings
            .insert(NewBooking {
                merchant,
                preferred_time,
                assignment: Some(SlotAssignment {
                    ae_id: ae_id.clone(),
                    scheduled_time: preferred_time,
                }),
                meeting_link: Some(PLACEHOLDER_MEETING_LINK.to_string()),
            })
            .await
            .map_err(|error| {
                tracing::warn!(
                    event_name = "booking.insert.failed",
                    correlation_id = "unassigned",
                    ae_id = %ae_id.0,
                    slot = %preferred_time,
                    error = %error,
                    "slot recorded but booking insert failed"
                );
                persistence(error)
            })?;

        tracing::info!(
            event_name = "booking.created",
            correlation_id = %booking.id.0,
            ae_id = %ae_id.0,
            scheduled_time = %preferred_time,
            "demo booked"
        );

        Ok(BookingView { booking, ae: Some(ae) })
    }

    pub async fn booking(&self, id: &BookingId) -> Result<BookingView, ApplicationError> {
        let booking = self.find_booking(id).await?;
        let ae = self.ae_for(&booking).await?;
        Ok(BookingView { booking, ae })
    }

    /// All bookings in creation order, each joined with its AE.
    pub async fn list_demos(&self) -> Result<Vec<BookingView>, ApplicationError> {
        let bookings = self.bookings.list().await.map_err(persistence)?;
        let roster = self.aes.list().await.map_err(persistence)?;

        Ok(bookings
            .into_iter()
            .map(|booking| {
                let ae = booking
                    .assigned_ae()
                    .and_then(|ae_id| roster.iter().find(|ae| &ae.id == ae_id))
                    .cloned();
                BookingView { booking, ae }
            })
            .collect())
    }

    pub async fn generate_brief(&self, id: &BookingId) -> Result<PrepBriefRecord, ApplicationError> {
        let booking = self.find_booking(id).await?;
        let ae_id = booking
            .assigned_ae()
            .cloned()
            .ok_or_else(|| DomainError::UnassignedBooking { booking_id: id.0.clone() })?;
        let ae = self.find_ae(&ae_id).await?;

        let brief = self.generator.generate(&booking, &ae).await;
        let record = self.briefs.insert(brief).await.map_err(persistence)?;
        self.bookings.mark_brief_generated(id).await.map_err(persistence)?;

        tracing::info!(
            event_name = "brief.generated",
            correlation_id = %id.0,
            brief_id = %record.id.0,
            ai_enabled = self.generator.uses_completion(),
            "prep brief stored"
        );

        Ok(record)
    }

    pub async fn latest_brief(&self, id: &BookingId) -> Result<PrepBriefRecord, ApplicationError> {
        self.briefs
            .latest_for_booking(id)
            .await
            .map_err(persistence)?
            .ok_or_else(|| ApplicationError::NotFound { entity: "prep_brief", id: id.0.clone() })
    }

    pub async fn roster(&self) -> Result<Vec<AccountExecutive>, ApplicationError> {
        self.aes.list().await.map_err(persistence)
    }

    async fn find_booking(&self, id: &BookingId) -> Result<Booking, ApplicationError> {
        self.bookings
            .find_by_id(id)
            .await
            .map_err(persistence)?
            .ok_or_else(|| ApplicationError::NotFound { entity: "booking", id: id.0.clone() })
    }

    async fn find_ae(&self, id: &AeId) -> Result<AccountExecutive, ApplicationError> {
        self.aes.find_by_id(id).await.map_err(persistence)?.ok_or_else(|| {
            ApplicationError::NotFound { entity: "account_executive", id: id.0.clone() }
        })
    }

    async fn ae_for(&self, booking: &Booking) -> Result<Option<AccountExecutive>, ApplicationError> {
        match booking.assigned_ae() {
            Some(ae_id) => self.aes.find_by_id(ae_id).await.map_err(persistence),
            None => Ok(None),
        }
    }
}

fn persistence(error: RepositoryError) -> ApplicationError {
    match error {
        RepositoryError::MissingRecord { entity, id } => ApplicationError::NotFound { entity, id },
        other => ApplicationError::Persistence(other.to_string()),
    }
}
