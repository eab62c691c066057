use chrono::{NaiveDateTime, Utc};
use tokio::sync::RwLock;

use demogenie_core::domain::ae::{AccountExecutive, AeId, NewAccountExecutive};
use demogenie_core::domain::booking::{Booking, BookingId, BriefStatus, NewBooking};
use demogenie_core::domain::brief::{PrepBrief, PrepBriefId, PrepBriefRecord};

use super::{
    new_record_id, AeRepository, BookingRepository, PrepBriefRepository, RepositoryError,
};

/// Vec-backed stores keep insertion order, matching the SQL `ORDER BY`
/// clauses.
#[derive(Default)]
pub struct InMemoryAeRepository {
    aes: RwLock<Vec<AccountExecutive>>,
}

#[async_trait::async_trait]
impl AeRepository for InMemoryAeRepository {
    async fn list(&self) -> Result<Vec<AccountExecutive>, RepositoryError> {
        let aes = self.aes.read().await;
        Ok(aes.clone())
    }

    async fn find_by_id(&self, id: &AeId) -> Result<Option<AccountExecutive>, RepositoryError> {
        let aes = self.aes.read().await;
        Ok(aes.iter().find(|ae| &ae.id == id).cloned())
    }

    async fn insert(&self, ae: NewAccountExecutive) -> Result<AccountExecutive, RepositoryError> {
        let record = AccountExecutive {
            id: AeId(new_record_id()),
            name: ae.name,
            email: ae.email,
            working_start: ae.working_start,
            working_end: ae.working_end,
            booked_slots: Vec::new(),
        };
        let mut aes = self.aes.write().await;
        aes.push(record.clone());
        Ok(record)
    }

    async fn append_slot(&self, id: &AeId, slot: NaiveDateTime) -> Result<(), RepositoryError> {
        let mut aes = self.aes.write().await;
        let ae = aes.iter_mut().find(|ae| &ae.id == id).ok_or_else(|| {
            RepositoryError::MissingRecord { entity: "account_executive", id: id.0.clone() }
        })?;
        ae.booked_slots.push(slot);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryBookingRepository {
    bookings: RwLock<Vec<Booking>>,
}

#[async_trait::async_trait]
impl BookingRepository for InMemoryBookingRepository {
    async fn insert(&self, booking: NewBooking) -> Result<Booking, RepositoryError> {
        let record = Booking {
            id: BookingId(new_record_id()),
            merchant: booking.merchant,
            preferred_time: booking.preferred_time,
            assignment: booking.assignment,
            meeting_link: booking.meeting_link,
            brief_status: BriefStatus::Pending,
            created_at: Utc::now(),
        };
        let mut bookings = self.bookings.write().await;
        bookings.push(record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.iter().find(|booking| &booking.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Booking>, RepositoryError> {
        let bookings = self.bookings.read().await;
        Ok(bookings.clone())
    }

    async fn mark_brief_generated(&self, id: &BookingId) -> Result<(), RepositoryError> {
        let mut bookings = self.bookings.write().await;
        let booking = bookings
            .iter_mut()
            .find(|booking| &booking.id == id)
            .ok_or_else(|| RepositoryError::MissingRecord { entity: "booking", id: id.0.clone() })?;
        booking.brief_status = BriefStatus::Generated;
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryPrepBriefRepository {
    briefs: RwLock<Vec<PrepBriefRecord>>,
}

#[async_trait::async_trait]
impl PrepBriefRepository for InMemoryPrepBriefRepository {
    async fn insert(&self, brief: PrepBrief) -> Result<PrepBriefRecord, RepositoryError> {
        let record =
            PrepBriefRecord { id: PrepBriefId(new_record_id()), brief, created_at: Utc::now() };
        let mut briefs = self.briefs.write().await;
        briefs.push(record.clone());
        Ok(record)
    }

    async fn latest_for_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<PrepBriefRecord>, RepositoryError> {
        let briefs = self.briefs.read().await;
        Ok(briefs.iter().rev().find(|record| &record.brief.booking_id == booking_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use demogenie_core::domain::ae::{AeId, NewAccountExecutive};
    use demogenie_core::domain::booking::{BookingId, BriefStatus, MerchantProfile, NewBooking};
    use demogenie_core::domain::brief::{BriefContent, PrepBrief};

    use super::{InMemoryAeRepository, InMemoryBookingRepository, InMemoryPrepBriefRepository};
    use crate::repositories::{
        AeRepository, BookingRepository, PrepBriefRepository, RepositoryError,
    };

    #[tokio::test]
    async fn ae_roster_keeps_order_and_appends_slots() {
        let repo = InMemoryAeRepository::default();
        let mut ids = Vec::new();
        for name in ["A", "B"] {
            let ae = repo
                .insert(NewAccountExecutive {
                    name: name.to_string(),
                    email: format!("{name}@example.com"),
                    working_start: NaiveTime::from_hms_opt(9, 0, 0).expect("time"),
                    working_end: NaiveTime::from_hms_opt(17, 0, 0).expect("time"),
                })
                .await
                .expect("insert");
            ids.push(ae.id);
        }

        let slot = NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|date| date.and_hms_opt(9, 0, 0))
            .expect("valid datetime");
        repo.append_slot(&ids[1], slot).await.expect("append");

        let roster = repo.list().await.expect("list");
        assert_eq!(roster.iter().map(|ae| ae.name.as_str()).collect::<Vec<_>>(), vec!["A", "B"]);
        assert_eq!(roster[1].booked_slots, vec![slot]);

        let missing = repo.append_slot(&AeId("ghost".to_string()), slot).await;
        assert!(matches!(missing, Err(RepositoryError::MissingRecord { .. })));
    }

    #[tokio::test]
    async fn booking_status_flip_and_latest_brief() {
        let bookings = InMemoryBookingRepository::default();
        let briefs = InMemoryPrepBriefRepository::default();
        let preferred_time = NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|date| date.and_hms_opt(7, 0, 0))
            .expect("valid datetime");

        let booking = bookings
            .insert(NewBooking {
                merchant: MerchantProfile::default(),
                preferred_time,
                assignment: None,
                meeting_link: None,
            })
            .await
            .expect("insert");
        bookings.mark_brief_generated(&booking.id).await.expect("mark");
        let found = bookings.find_by_id(&booking.id).await.expect("find").expect("present");
        assert_eq!(found.brief_status, BriefStatus::Generated);

        let ae_id = AeId("ae-1".to_string());
        for insights in ["older", "newer"] {
            let content = BriefContent { insights: insights.to_string(), ..BriefContent::default() };
            briefs
                .insert(PrepBrief::generated(booking.id.clone(), ae_id.clone(), content))
                .await
                .expect("insert brief");
        }

        let latest = briefs.latest_for_booking(&booking.id).await.expect("latest").expect("some");
        assert_eq!(latest.brief.content.insights, "newer");
        assert!(briefs
            .latest_for_booking(&BookingId("other".to_string()))
            .await
            .expect("latest")
            .is_none());
    }
}
