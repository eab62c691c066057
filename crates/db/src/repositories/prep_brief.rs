use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};

use demogenie_core::domain::ae::AeId;
use demogenie_core::domain::booking::{BookingId, BriefStatus};
use demogenie_core::domain::brief::{BriefContent, PrepBrief, PrepBriefId, PrepBriefRecord};

use super::{
    format_timestamp, new_record_id, parse_timestamp, PrepBriefRepository, RepositoryError,
};
use crate::DbPool;

pub struct SqlPrepBriefRepository {
    pool: DbPool,
}

impl SqlPrepBriefRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl PrepBriefRepository for SqlPrepBriefRepository {
    async fn insert(&self, brief: PrepBrief) -> Result<PrepBriefRecord, RepositoryError> {
        let id = new_record_id();
        let created_at = Utc::now();

        sqlx::query(
            "INSERT INTO prep_brief (
                id, booking_id, ae_id, insights, pain_points_summary, relevant_features,
                pitch_suggestions, status, created_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(&id)
        .bind(&brief.booking_id.0)
        .bind(&brief.ae_id.0)
        .bind(&brief.content.insights)
        .bind(&brief.content.pain_points_summary)
        .bind(&brief.content.relevant_features)
        .bind(&brief.content.pitch_suggestions)
        .bind(brief.status.as_str())
        .bind(format_timestamp(created_at))
        .execute(&self.pool)
        .await?;

        Ok(PrepBriefRecord { id: PrepBriefId(id), brief, created_at })
    }

    async fn latest_for_booking(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<PrepBriefRecord>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, booking_id, ae_id, insights, pain_points_summary, relevant_features,
                    pitch_suggestions, status, created_at
             FROM prep_brief
             WHERE booking_id = ?1
             ORDER BY created_at DESC, rowid DESC
             LIMIT 1",
        )
        .bind(&booking_id.0)
        .fetch_optional(&self.pool)
        .await?;

        row.map(record_from_row).transpose()
    }
}

fn record_from_row(row: SqliteRow) -> Result<PrepBriefRecord, RepositoryError> {
    let status: String = row.try_get("status")?;

    Ok(PrepBriefRecord {
        id: PrepBriefId(row.try_get("id")?),
        brief: PrepBrief {
            booking_id: BookingId(row.try_get("booking_id")?),
            ae_id: AeId(row.try_get("ae_id")?),
            content: BriefContent {
                insights: row.try_get("insights")?,
                pain_points_summary: row.try_get("pain_points_summary")?,
                relevant_features: row.try_get("relevant_features")?,
                pitch_suggestions: row.try_get("pitch_suggestions")?,
            },
            status: BriefStatus::parse(&status),
        },
        created_at: parse_timestamp("created_at", row.try_get("created_at")?)?,
    })
}
