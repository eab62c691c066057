use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use demogenie_core::domain::ae::NewAccountExecutive;
use demogenie_core::domain::booking::{MerchantProfile, NewBooking, SlotAssignment};

use crate::connection::DbPool;
use crate::repositories::{
    format_slot, AeRepository, BookingRepository, RepositoryError, SqlAeRepository,
    SqlBookingRepository,
};

struct SeedAe {
    name: &'static str,
    email: &'static str,
    working_start: (u32, u32),
    working_end: (u32, u32),
}

struct SeedBooking {
    merchant_name: &'static str,
    address: &'static str,
    contact_number: &'static str,
    email: &'static str,
    products_interested: &'static [&'static str],
    website_links: Option<&'static str>,
    social_media: Option<&'static str>,
    restaurant_category: &'static str,
    number_of_outlets: &'static str,
    current_pain_points: &'static str,
    special_notes: Option<&'static str>,
    scheduled: (i32, u32, u32, u32, u32),
    ae_name: &'static str,
    meeting_link: &'static str,
}

const SEED_AES: &[SeedAe] = &[
    SeedAe {
        name: "Sarah Johnson",
        email: "sarah@example.com",
        working_start: (9, 0),
        working_end: (17, 0),
    },
    SeedAe {
        name: "Mike Chen",
        email: "mike@example.com",
        working_start: (10, 0),
        working_end: (18, 0),
    },
    SeedAe {
        name: "Priya Patel",
        email: "priya@example.com",
        working_start: (8, 30),
        working_end: (16, 30),
    },
];

const SEED_BOOKINGS: &[SeedBooking] = &[
    SeedBooking {
        merchant_name: "Bella Vista Restaurant",
        address: "123 Main St, Downtown",
        contact_number: "+1 (555) 123-4567",
        email: "owner@bellavista.com",
        products_interested: &["POS", "Inventory Management"],
        website_links: Some("https://bellavista.com"),
        social_media: Some("@bellavista_restaurant"),
        restaurant_category: "Fine Dining",
        number_of_outlets: "2-5 Locations",
        current_pain_points: "Struggling with inventory management across multiple locations",
        special_notes: Some("Interested in integration with existing accounting software"),
        scheduled: (2024, 1, 15, 14, 0),
        ae_name: "Sarah Johnson",
        meeting_link: "https://meet.google.com/abc-defg-hij",
    },
    SeedBooking {
        merchant_name: "Quick Bites Cafe",
        address: "456 Oak Ave, Midtown",
        contact_number: "+1 (555) 987-6543",
        email: "manager@quickbites.com",
        products_interested: &["POS System", "Online Ordering"],
        website_links: None,
        social_media: None,
        restaurant_category: "Fast Casual",
        number_of_outlets: "1 Location",
        current_pain_points: "Need better online ordering system and delivery integration",
        special_notes: Some("Currently using Square, looking to upgrade"),
        scheduled: (2024, 1, 16, 10, 30),
        ae_name: "Mike Chen",
        meeting_link: "https://zoom.us/j/123456789",
    },
];

/// Demo roster and two sample bookings, each already booked against its AE.
///
/// Loading is skipped when any AE exists, so it is safe to run on every
/// startup.
pub struct DemoSeedDataset;

impl DemoSeedDataset {
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let aes = SqlAeRepository::new(pool.clone());
        let bookings = SqlBookingRepository::new(pool.clone());

        if !aes.list().await?.is_empty() {
            tracing::debug!(
                event_name = "db.seed.skipped",
                correlation_id = "seed",
                "roster already present"
            );
            return Ok(SeedResult { skipped: true, aes_seeded: 0, bookings_seeded: Vec::new() });
        }

        let mut roster = Vec::with_capacity(SEED_AES.len());
        for seed in SEED_AES {
            let ae = aes
                .insert(NewAccountExecutive {
                    name: seed.name.to_string(),
                    email: seed.email.to_string(),
                    working_start: seed_time(seed.working_start)?,
                    working_end: seed_time(seed.working_end)?,
                })
                .await?;
            roster.push(ae);
        }

        let mut bookings_seeded = Vec::with_capacity(SEED_BOOKINGS.len());
        for seed in SEED_BOOKINGS {
            let ae = roster.iter().find(|ae| ae.name == seed.ae_name).ok_or_else(|| {
                RepositoryError::Decode(format!(
                    "seed booking references unknown AE `{}`",
                    seed.ae_name
                ))
            })?;
            let scheduled_time = seed_datetime(seed.scheduled)?;

            bookings
                .insert(NewBooking {
                    merchant: seed.merchant(),
                    preferred_time: scheduled_time,
                    assignment: Some(SlotAssignment { ae_id: ae.id.clone(), scheduled_time }),
                    meeting_link: Some(seed.meeting_link.to_string()),
                })
                .await?;
            aes.append_slot(&ae.id, scheduled_time).await?;
            bookings_seeded.push(seed.merchant_name);
        }

        tracing::info!(
            event_name = "db.seed.loaded",
            correlation_id = "seed",
            aes_seeded = roster.len(),
            bookings_seeded = bookings_seeded.len(),
            "demo dataset loaded"
        );
        Ok(SeedResult { skipped: false, aes_seeded: roster.len(), bookings_seeded })
    }

    /// Checks that every seeded AE and booking is present with its slot.
    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();

        for seed in SEED_AES {
            let exists: i64 = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM account_executive WHERE name = ?1 AND email = ?2)",
            )
            .bind(seed.name)
            .bind(seed.email)
            .fetch_one(pool)
            .await?;
            checks.push((seed.name, exists == 1));
        }

        for seed in SEED_BOOKINGS {
            let scheduled_time = format_slot(seed_datetime(seed.scheduled)?);
            let booked: i64 = sqlx::query_scalar(
                "SELECT EXISTS(
                    SELECT 1
                    FROM merchant_booking b
                    JOIN account_executive a ON a.id = b.assigned_ae_id
                    JOIN ae_booked_slot s ON s.ae_id = a.id AND s.slot_time = b.scheduled_time
                    WHERE b.merchant_name = ?1 AND a.name = ?2 AND b.scheduled_time = ?3
                 )",
            )
            .bind(seed.merchant_name)
            .bind(seed.ae_name)
            .bind(scheduled_time)
            .fetch_one(pool)
            .await?;
            checks.push((seed.merchant_name, booked == 1));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }
}

impl SeedBooking {
    fn merchant(&self) -> MerchantProfile {
        MerchantProfile {
            merchant_name: self.merchant_name.to_string(),
            address: self.address.to_string(),
            contact_number: self.contact_number.to_string(),
            email: self.email.to_string(),
            restaurant_category: self.restaurant_category.to_string(),
            number_of_outlets: self.number_of_outlets.to_string(),
            products_interested: self.products_interested.iter().map(ToString::to_string).collect(),
            current_pain_points: self.current_pain_points.to_string(),
            special_notes: self.special_notes.map(ToString::to_string),
            website_links: self.website_links.map(ToString::to_string),
            social_media: self.social_media.map(ToString::to_string),
        }
    }
}

fn seed_time((hour, minute): (u32, u32)) -> Result<NaiveTime, RepositoryError> {
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| RepositoryError::Decode(format!("invalid seed time {hour}:{minute}")))
}

fn seed_datetime(
    (year, month, day, hour, minute): (i32, u32, u32, u32, u32),
) -> Result<NaiveDateTime, RepositoryError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, 0))
        .ok_or_else(|| {
            RepositoryError::Decode(format!(
                "invalid seed datetime {year}-{month}-{day} {hour}:{minute}"
            ))
        })
}

#[derive(Debug)]
pub struct SeedResult {
    pub skipped: bool,
    pub aes_seeded: usize,
    pub bookings_seeded: Vec<&'static str>,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{connect_with_settings, migrations};

    async fn setup_pool() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30)
            .await
            .expect("connect to test database");
        migrations::run_pending(&pool).await.expect("run migrations");
        pool
    }

    #[tokio::test]
    async fn verify_seed_contract_and_idempotency() {
        let pool = setup_pool().await;

        let first = DemoSeedDataset::load(&pool).await.expect("load seed fixtures");
        assert!(!first.skipped);
        assert_eq!(first.aes_seeded, 3);
        assert_eq!(first.bookings_seeded, vec!["Bella Vista Restaurant", "Quick Bites Cafe"]);
        let first_verification = DemoSeedDataset::verify(&pool).await.expect("verify seed fixtures");
        assert!(first_verification.all_present, "{:?}", first_verification.checks);

        let second = DemoSeedDataset::load(&pool).await.expect("reload seed fixtures");
        assert!(second.skipped);
        let second_verification =
            DemoSeedDataset::verify(&pool).await.expect("re-verify seed fixtures");
        assert_eq!(first_verification.checks, second_verification.checks);

        let ae_count: i64 = sqlx::query_scalar("SELECT COUNT(1) FROM account_executive")
            .fetch_one(&pool)
            .await
            .expect("count aes");
        assert_eq!(ae_count, 3);
    }

    #[tokio::test]
    async fn seeded_roster_carries_booked_slots() {
        let pool = setup_pool().await;
        DemoSeedDataset::load(&pool).await.expect("load seed fixtures");

        let roster = SqlAeRepository::new(pool).list().await.expect("list roster");
        let names = roster.iter().map(|ae| ae.name.as_str()).collect::<Vec<_>>();
        assert_eq!(names, vec!["Sarah Johnson", "Mike Chen", "Priya Patel"]);

        let loads = roster.iter().map(|ae| ae.load()).collect::<Vec<_>>();
        assert_eq!(loads, vec![1, 1, 0]);
        assert_eq!(
            roster[1].booked_slots,
            vec![seed_datetime((2024, 1, 16, 10, 30)).expect("valid datetime")]
        );
    }

    #[tokio::test]
    async fn verification_fails_on_empty_database() {
        let pool = setup_pool().await;

        let verification = DemoSeedDataset::verify(&pool).await.expect("verify");
        assert!(!verification.all_present);
    }
}
