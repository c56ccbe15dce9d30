//! Postgres-backed record store.
//!
//! Uniqueness of customer IDs is enforced by the `site_visits_customer_id_key`
//! constraint, so two writers that computed the same next ID cannot both
//! succeed.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sitevisit_id::CustomerId;
use sqlx::{postgres::PgRow, types::Json, Row};
use tracing::debug;
use uuid::Uuid;

use super::{parse_stored_id, StoreError, VisitStore};
use crate::db::{Database, DbError};
use crate::model::{ServiceDetails, ServiceType, SiteVisit};

const SELECT_COLUMNS: &str = r#"
    id, customer_id, customer_name, date_received, day_of_week, phone_number,
    has_whatsapp, whatsapp_number, district, city, address, latitude, longitude,
    has_removals, removal_charge, has_additional_labour, additional_labour_charge,
    service_type, status, quotation_number, details, created_at
"#;

/// Record store on the `site_visits` table.
#[derive(Clone)]
pub struct PgVisitStore {
    db: Database,
}

impl PgVisitStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl VisitStore for PgVisitStore {
    async fn last_customer_id(&self) -> Result<Option<CustomerId>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT customer_id FROM site_visits ORDER BY seq DESC LIMIT 1")
                .fetch_optional(self.db.pool())
                .await
                .map_err(DbError::Query)?;

        row.map(|(value,)| parse_stored_id(value)).transpose()
    }

    async fn insert(&self, visit: SiteVisit) -> Result<SiteVisit, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO site_visits (
                id, customer_id, customer_name, date_received, day_of_week,
                phone_number, has_whatsapp, whatsapp_number, district, city,
                address, latitude, longitude, has_removals, removal_charge,
                has_additional_labour, additional_labour_charge, service_type,
                status, quotation_number, details, created_at
            )
            VALUES (
                $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22
            )
            "#,
        )
        .bind(visit.id)
        .bind(visit.customer_id.to_string())
        .bind(&visit.customer_name)
        .bind(visit.date_received)
        .bind(&visit.day_of_week)
        .bind(&visit.phone_number)
        .bind(visit.has_whatsapp)
        .bind(&visit.whatsapp_number)
        .bind(&visit.district)
        .bind(&visit.city)
        .bind(&visit.address)
        .bind(visit.latitude)
        .bind(visit.longitude)
        .bind(visit.has_removals)
        .bind(visit.removal_charge)
        .bind(visit.has_additional_labour)
        .bind(visit.additional_labour_charge)
        .bind(visit.service_type.as_str())
        .bind(&visit.status)
        .bind(&visit.quotation_number)
        .bind(visit.details.clone().map(Json))
        .bind(visit.created_at)
        .execute(self.db.pool())
        .await;

        match result {
            Ok(_) => {
                debug!(customer_id = %visit.customer_id, id = %visit.id, "Stored site visit");
                Ok(visit)
            }
            Err(sqlx::Error::Database(db_err))
                if db_err.is_unique_violation()
                    && db_err.constraint() == Some("site_visits_customer_id_key") =>
            {
                Err(StoreError::DuplicateCustomerId(visit.customer_id))
            }
            Err(e) => Err(DbError::Query(e).into()),
        }
    }

    async fn list(&self, limit: usize) -> Result<Vec<SiteVisit>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let sql = format!("SELECT {SELECT_COLUMNS} FROM site_visits ORDER BY seq DESC LIMIT $1");
        let rows = sqlx::query(&sql)
            .bind(limit)
            .fetch_all(self.db.pool())
            .await
            .map_err(DbError::Query)?;

        rows.iter().map(decode_row).collect()
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        self.db.health_check().await?;
        Ok(())
    }
}

fn decode_row(row: &PgRow) -> Result<SiteVisit, StoreError> {
    let get_err = |e: sqlx::Error| StoreError::from(DbError::Query(e));

    let customer_id: String = row.try_get("customer_id").map_err(get_err)?;
    let service_type: String = row.try_get("service_type").map_err(get_err)?;
    let service_type = ServiceType::parse(&service_type)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown service type '{service_type}'")))?;
    let details: Option<Json<ServiceDetails>> = row.try_get("details").map_err(get_err)?;

    Ok(SiteVisit {
        id: row.try_get::<Uuid, _>("id").map_err(get_err)?,
        customer_id: parse_stored_id(customer_id)?,
        customer_name: row.try_get("customer_name").map_err(get_err)?,
        date_received: row.try_get::<NaiveDate, _>("date_received").map_err(get_err)?,
        day_of_week: row.try_get("day_of_week").map_err(get_err)?,
        phone_number: row.try_get("phone_number").map_err(get_err)?,
        has_whatsapp: row.try_get("has_whatsapp").map_err(get_err)?,
        whatsapp_number: row.try_get("whatsapp_number").map_err(get_err)?,
        district: row.try_get("district").map_err(get_err)?,
        city: row.try_get("city").map_err(get_err)?,
        address: row.try_get("address").map_err(get_err)?,
        latitude: row.try_get("latitude").map_err(get_err)?,
        longitude: row.try_get("longitude").map_err(get_err)?,
        has_removals: row.try_get("has_removals").map_err(get_err)?,
        removal_charge: row.try_get("removal_charge").map_err(get_err)?,
        has_additional_labour: row.try_get("has_additional_labour").map_err(get_err)?,
        additional_labour_charge: row.try_get("additional_labour_charge").map_err(get_err)?,
        service_type,
        status: row.try_get("status").map_err(get_err)?,
        quotation_number: row.try_get("quotation_number").map_err(get_err)?,
        details: details.map(|Json(d)| d),
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(get_err)?,
    })
}
