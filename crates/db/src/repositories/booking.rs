use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};

use demogenie_core::domain::ae::AeId;
use demogenie_core::domain::booking::{
    Booking, BookingId, BriefStatus, MerchantProfile, NewBooking, SlotAssignment,
};

use super::{
    format_slot, format_timestamp, new_record_id, parse_optional_slot, parse_slot,
    parse_timestamp, BookingRepository, RepositoryError,
};
use crate::DbPool;

const BOOKING_COLUMNS: &str = "id, merchant_name, address, contact_number, email,
    restaurant_category, number_of_outlets, products_interested_json, current_pain_points,
    special_notes, website_links, social_media, preferred_time, assigned_ae_id, scheduled_time,
    meeting_link, brief_status, created_at";

pub struct SqlBookingRepository {
    pool: DbPool,
}

impl SqlBookingRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl BookingRepository for SqlBookingRepository {
    async fn insert(&self, booking: NewBooking) -> Result<Booking, RepositoryError> {
        let id = new_record_id();
        let created_at = Utc::now();
        let products_json = serde_json::to_string(&booking.merchant.products_interested)
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;
        let merchant = &booking.merchant;

        sqlx::query(
            "INSERT INTO merchant_booking (
                id, merchant_name, address, contact_number, email, restaurant_category,
                number_of_outlets, products_interested_json, current_pain_points, special_notes,
                website_links, social_media, preferred_time, assigned_ae_id, scheduled_time,
                meeting_link, brief_status, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        )
        .bind(&id)
        .bind(&merchant.merchant_name)
        .bind(&merchant.address)
        .bind(&merchant.contact_number)
        .bind(&merchant.email)
        .bind(&merchant.restaurant_category)
        .bind(&merchant.number_of_outlets)
        .bind(products_json)
        .bind(&merchant.current_pain_points)
        .bind(&merchant.special_notes)
        .bind(&merchant.website_links)
        .bind(&merchant.social_media)
        .bind(format_slot(booking.preferred_time))
        .bind(booking.assignment.as_ref().map(|assignment| assignment.ae_id.0.clone()))
        .bind(booking.assignment.as_ref().map(|assignment| format_slot(assignment.scheduled_time)))
        .bind(&booking.meeting_link)
        .bind(BriefStatus::Pending.as_str())
        .bind(format_timestamp(created_at))
        .execute(&self.pool)
        .await?;

        Ok(Booking {
            id: BookingId(id),
            merchant: booking.merchant,
            preferred_time: booking.preferred_time,
            assignment: booking.assignment,
            meeting_link: booking.meeting_link,
            brief_status: BriefStatus::Pending,
            created_at,
        })
    }

    async fn find_by_id(&self, id: &BookingId) -> Result<Option<Booking>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {BOOKING_COLUMNS} FROM merchant_booking WHERE id = ?1"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;

        row.map(booking_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Booking>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM merchant_booking ORDER BY created_at ASC, rowid ASC"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(booking_from_row).collect()
    }

    async fn mark_brief_generated(&self, id: &BookingId) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE merchant_booking SET brief_status = ?1 WHERE id = ?2")
            .bind(BriefStatus::Generated.as_str())
            .bind(&id.0)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::MissingRecord { entity: "booking", id: id.0.clone() });
        }
        Ok(())
    }
}

fn booking_from_row(row: SqliteRow) -> Result<Booking, RepositoryError> {
    let products_json: String = row.try_get("products_interested_json")?;
    let products_interested = serde_json::from_str::<Vec<String>>(&products_json).map_err(|error| {
        RepositoryError::Decode(format!(
            "invalid products_interested_json `{products_json}` ({error})"
        ))
    })?;

    let preferred_time: String = row.try_get("preferred_time")?;
    let assigned_ae_id: Option<String> = row.try_get("assigned_ae_id")?;
    let scheduled_time = parse_optional_slot("scheduled_time", row.try_get("scheduled_time")?)?;

    let assignment = match (assigned_ae_id, scheduled_time) {
        (Some(ae_id), Some(scheduled_time)) => {
            Some(SlotAssignment { ae_id: AeId(ae_id), scheduled_time })
        }
        (None, None) => None,
        _ => {
            return Err(RepositoryError::Decode(
                "assigned_ae_id and scheduled_time must be set together".to_string(),
            ))
        }
    };

    let brief_status: String = row.try_get("brief_status")?;

    Ok(Booking {
        id: BookingId(row.try_get("id")?),
        merchant: MerchantProfile {
            merchant_name: row.try_get("merchant_name")?,
            address: row.try_get("address")?,
            contact_number: row.try_get("contact_number")?,
            email: row.try_get("email")?,
            restaurant_category: row.try_get("restaurant_category")?,
            number_of_outlets: row.try_get("number_of_outlets")?,
            products_interested,
            current_pain_points: row.try_get("current_pain_points")?,
            special_notes: row.try_get("special_notes")?,
            website_links: row.try_get("website_links")?,
            social_media: row.try_get("social_media")?,
        },
        preferred_time: parse_slot("preferred_time", &preferred_time)?,
        assignment,
        meeting_link: row.try_get("meeting_link")?,
        brief_status: BriefStatus::parse(&brief_status),
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

    use demogenie_core::domain::ae::{AeId, NewAccountExecutive};
    use demogenie_core::domain::booking::{
        BookingId, BriefStatus, MerchantProfile, NewBooking, SlotAssignment,
    };

    use super::SqlBookingRepository;
    use crate::migrations;
    use crate::repositories::{AeRepository, BookingRepository, RepositoryError, SqlAeRepository};
    use crate::{connect_with_settings, DbPool};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect test pool");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .and_then(|date| date.and_hms_opt(hour, minute, 0))
            .expect("valid datetime")
    }

    async fn seeded_ae(pool: &DbPool) -> AeId {
        SqlAeRepository::new(pool.clone())
            .insert(NewAccountExecutive {
                name: "Sarah Johnson".to_string(),
                email: "sarah.johnson@company.com".to_string(),
                working_start: NaiveTime::from_hms_opt(9, 0, 0).expect("time"),
                working_end: NaiveTime::from_hms_opt(17, 0, 0).expect("time"),
            })
            .await
            .expect("insert ae")
            .id
    }

    fn merchant(name: &str) -> MerchantProfile {
        MerchantProfile {
            merchant_name: name.to_string(),
            address: "123 Main St".to_string(),
            contact_number: "+1-555-0100".to_string(),
            email: "owner@example.com".to_string(),
            restaurant_category: "Fine Dining".to_string(),
            number_of_outlets: "2-5 Locations".to_string(),
            products_interested: vec!["POS".to_string(), "Inventory Management".to_string()],
            current_pain_points: "Struggling with inventory management".to_string(),
            special_notes: None,
            website_links: Some("https://bellavista.com".to_string()),
            social_media: None,
        }
    }

    #[tokio::test]
    async fn insert_and_find_round_trip_assigned_booking() {
        let pool = setup_pool().await;
        let ae_id = seeded_ae(&pool).await;
        let repo = SqlBookingRepository::new(pool);

        let inserted = repo
            .insert(NewBooking {
                merchant: merchant("Bella Vista Restaurant"),
                preferred_time: at(14, 0),
                assignment: Some(SlotAssignment { ae_id: ae_id.clone(), scheduled_time: at(14, 0) }),
                meeting_link: Some("https://meet.google.com/placeholder-meeting".to_string()),
            })
            .await
            .expect("insert booking");

        let found = repo.find_by_id(&inserted.id).await.expect("find").expect("present");
        assert_eq!(found.merchant, inserted.merchant);
        assert_eq!(found.assigned_ae(), Some(&ae_id));
        assert_eq!(found.scheduled_time(), Some(at(14, 0)));
        assert_eq!(found.brief_status, BriefStatus::Pending);
        assert_eq!(found.merchant.products_interested, vec!["POS", "Inventory Management"]);
    }

    #[tokio::test]
    async fn unassigned_booking_reads_back_without_assignment() {
        let repo = SqlBookingRepository::new(setup_pool().await);

        let inserted = repo
            .insert(NewBooking {
                merchant: merchant("Walk-in Diner"),
                preferred_time: at(7, 0),
                assignment: None,
                meeting_link: None,
            })
            .await
            .expect("insert booking");

        let found = repo.find_by_id(&inserted.id).await.expect("find").expect("present");
        assert!(found.assignment.is_none());
        assert!(found.meeting_link.is_none());
    }

    #[tokio::test]
    async fn list_is_in_creation_order_and_status_flips() {
        let pool = setup_pool().await;
        let ae_id = seeded_ae(&pool).await;
        let repo = SqlBookingRepository::new(pool);

        let mut ids = Vec::new();
        for (name, hour) in [("First", 10), ("Second", 11), ("Third", 12)] {
            let booking = repo
                .insert(NewBooking {
                    merchant: merchant(name),
                    preferred_time: at(hour, 0),
                    assignment: Some(SlotAssignment {
                        ae_id: ae_id.clone(),
                        scheduled_time: at(hour, 0),
                    }),
                    meeting_link: None,
                })
                .await
                .expect("insert booking");
            ids.push(booking.id);
        }

        repo.mark_brief_generated(&ids[1]).await.expect("mark generated");

        let listed = repo.list().await.expect("list");
        let names = listed.iter().map(|b| b.merchant.merchant_name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["First", "Second", "Third"]);
        assert_eq!(listed[0].brief_status, BriefStatus::Pending);
        assert_eq!(listed[1].brief_status, BriefStatus::Generated);
    }

    #[tokio::test]
    async fn marking_missing_booking_is_an_error() {
        let repo = SqlBookingRepository::new(setup_pool().await);

        let result = repo.mark_brief_generated(&BookingId("missing".to_string())).await;
        assert!(matches!(result, Err(RepositoryError::MissingRecord { entity: "booking", .. })));
    }
}
