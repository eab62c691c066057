use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};

use demogenie_core::domain::ae::{AccountExecutive, AeId, NewAccountExecutive};

use super::{
    format_slot, format_timestamp, new_record_id, parse_slot, parse_working_time, AeRepository,
    RepositoryError, WORKING_TIME_FORMAT,
};
use crate::DbPool;

pub struct SqlAeRepository {
    pool: DbPool,
}

impl SqlAeRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn slots_for(&self, id: &AeId) -> Result<Vec<NaiveDateTime>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT slot_time FROM ae_booked_slot WHERE ae_id = ?1 ORDER BY position ASC",
        )
        .bind(&id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<NaiveDateTime, RepositoryError> {
                let raw: String = row.try_get("slot_time")?;
                parse_slot("slot_time", &raw)
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl AeRepository for SqlAeRepository {
    async fn list(&self) -> Result<Vec<AccountExecutive>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, name, email, working_start, working_end
             FROM account_executive
             ORDER BY created_at ASC, rowid ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let slot_rows = sqlx::query(
            "SELECT ae_id, slot_time FROM ae_booked_slot ORDER BY ae_id ASC, position ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut slots: HashMap<String, Vec<NaiveDateTime>> = HashMap::new();
        for row in slot_rows {
            let ae_id: String = row.try_get("ae_id")?;
            let raw: String = row.try_get("slot_time")?;
            slots.entry(ae_id).or_default().push(parse_slot("slot_time", &raw)?);
        }

        rows.into_iter()
            .map(|row| -> Result<AccountExecutive, RepositoryError> {
                let mut ae = ae_from_row(row)?;
                ae.booked_slots = slots.remove(&ae.id.0).unwrap_or_default();
                Ok(ae)
            })
            .collect()
    }

    async fn find_by_id(&self, id: &AeId) -> Result<Option<AccountExecutive>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, name, email, working_start, working_end
             FROM account_executive
             WHERE id = ?1",
        )
        .bind(&id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let mut ae = ae_from_row(row)?;
        ae.booked_slots = self.slots_for(id).await?;
        Ok(Some(ae))
    }

    async fn insert(&self, ae: NewAccountExecutive) -> Result<AccountExecutive, RepositoryError> {
        let id = new_record_id();

        sqlx::query(
            "INSERT INTO account_executive (id, name, email, working_start, working_end, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&id)
        .bind(&ae.name)
        .bind(&ae.email)
        .bind(ae.working_start.format(WORKING_TIME_FORMAT).to_string())
        .bind(ae.working_end.format(WORKING_TIME_FORMAT).to_string())
        .bind(format_timestamp(Utc::now()))
        .execute(&self.pool)
        .await?;

        Ok(AccountExecutive {
            id: AeId(id),
            name: ae.name,
            email: ae.email,
            working_start: ae.working_start,
            working_end: ae.working_end,
            booked_slots: Vec::new(),
        })
    }

    async fn append_slot(&self, id: &AeId, slot: NaiveDateTime) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let exists: i64 =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM account_executive WHERE id = ?1)")
                .bind(&id.0)
                .fetch_one(&mut *tx)
                .await?;
        if exists == 0 {
            return Err(RepositoryError::MissingRecord {
                entity: "account_executive",
                id: id.0.clone(),
            });
        }

        sqlx::query(
            "INSERT INTO ae_booked_slot (ae_id, position, slot_time)
             SELECT ?1, COALESCE(MAX(position), -1) + 1, ?2
             FROM ae_booked_slot
             WHERE ae_id = ?1",
        )
        .bind(&id.0)
        .bind(format_slot(slot))
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}

fn ae_from_row(row: SqliteRow) -> Result<AccountExecutive, RepositoryError> {
    let working_start: String = row.try_get("working_start")?;
    let working_end: String = row.try_get("working_end")?;

    Ok(AccountExecutive {
        id: AeId(row.try_get("id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        working_start: parse_working_time("working_start", &working_start)?,
        working_end: parse_working_time("working_end", &working_end)?,
        booked_slots: Vec::new(),
    })
}
