use async_trait::async_trait;
use catalog::{NewService, NewServiceBookingRules, NewServicePricing};
use common::{SalonId, ServiceId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{CatalogStore, Result, StoreError};

const SLUG_CONSTRAINT: &str = "services_salon_slug_key";

/// PostgreSQL-backed catalog store.
///
/// Each primitive runs as its own statement; no transaction spans tables.
#[derive(Clone)]
pub struct PostgresCatalogStore {
    pool: PgPool,
}

impl PostgresCatalogStore {
    /// Creates a new PostgreSQL catalog store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn to_i32(column: &'static str, value: u32) -> Result<i32> {
    i32::try_from(value).map_err(|_| StoreError::OutOfRange { column })
}

fn opt_i32(column: &'static str, value: Option<u32>) -> Result<Option<i32>> {
    value.map(|v| to_i32(column, v)).transpose()
}

/// Maps constraint violations raised by a child-row insert.
fn child_insert_error(e: sqlx::Error, table: &'static str, service_id: ServiceId) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_foreign_key_violation() {
            return StoreError::ServiceNotFound(service_id);
        }
        if db_err.is_unique_violation() {
            return StoreError::AlreadyExists { table, service_id };
        }
    }
    StoreError::Database(e)
}

fn delete_error(e: sqlx::Error, service_id: ServiceId) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return StoreError::HasDependents(service_id);
    }
    StoreError::Database(e)
}

/// Escapes LIKE wildcards so the prefix matches literally.
fn like_prefix(prefix: &str) -> String {
    let mut pattern = String::with_capacity(prefix.len() + 1);
    for c in prefix.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl CatalogStore for PostgresCatalogStore {
    #[tracing::instrument(skip(self, service), fields(salon_id = %service.salon_id, slug = %service.slug))]
    async fn insert_service(&self, service: NewService) -> Result<ServiceId> {
        let id = ServiceId::new();

        sqlx::query(
            r#"
            INSERT INTO services (
                id, salon_id, name, slug, description, category_id,
                is_active, is_bookable, is_featured,
                created_by, updated_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(id.as_uuid())
        .bind(service.salon_id.as_uuid())
        .bind(&service.name)
        .bind(&service.slug)
        .bind(&service.description)
        .bind(service.category_id.map(|c| c.as_uuid()))
        .bind(service.is_active)
        .bind(service.is_bookable)
        .bind(service.is_featured)
        .bind(service.audit.created_by.as_uuid())
        .bind(service.audit.updated_by.as_uuid())
        .bind(service.audit.created_at)
        .bind(service.audit.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
                && db_err.constraint() == Some(SLUG_CONSTRAINT)
            {
                return StoreError::SlugTaken {
                    salon_id: service.salon_id,
                    slug: service.slug.clone(),
                };
            }
            StoreError::Database(e)
        })?;

        Ok(id)
    }

    #[tracing::instrument(skip(self, pricing), fields(service_id = %pricing.service_id))]
    async fn insert_pricing(&self, pricing: NewServicePricing) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO service_pricing (
                id, service_id, base_price, sale_price, current_price, cost, profit_margin,
                currency_code, is_taxable, tax_rate, commission_rate,
                created_by, updated_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(pricing.service_id.as_uuid())
        .bind(pricing.base_price)
        .bind(pricing.sale_price)
        .bind(pricing.current_price)
        .bind(pricing.cost)
        .bind(pricing.profit_margin)
        .bind(&pricing.currency_code)
        .bind(pricing.is_taxable)
        .bind(pricing.tax_rate)
        .bind(pricing.commission_rate)
        .bind(pricing.audit.created_by.as_uuid())
        .bind(pricing.audit.updated_by.as_uuid())
        .bind(pricing.audit.created_at)
        .bind(pricing.audit.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| child_insert_error(e, "service_pricing", pricing.service_id))?;

        Ok(())
    }

    #[tracing::instrument(skip(self, rules), fields(service_id = %rules.service_id))]
    async fn insert_booking_rules(&self, rules: NewServiceBookingRules) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO service_booking_rules (
                id, service_id, duration_minutes, buffer_minutes, total_duration_minutes,
                min_advance_booking_hours, max_advance_booking_days, cancellation_notice_hours,
                max_simultaneous_bookings, requires_deposit, deposit_amount,
                created_by, updated_by, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(rules.service_id.as_uuid())
        .bind(to_i32("duration_minutes", rules.duration_minutes)?)
        .bind(to_i32("buffer_minutes", rules.buffer_minutes)?)
        .bind(to_i32("total_duration_minutes", rules.total_duration_minutes)?)
        .bind(opt_i32("min_advance_booking_hours", rules.min_advance_booking_hours)?)
        .bind(opt_i32("max_advance_booking_days", rules.max_advance_booking_days)?)
        .bind(opt_i32("cancellation_notice_hours", rules.cancellation_notice_hours)?)
        .bind(to_i32("max_simultaneous_bookings", rules.max_simultaneous_bookings)?)
        .bind(rules.requires_deposit)
        .bind(rules.deposit_amount)
        .bind(rules.audit.created_by.as_uuid())
        .bind(rules.audit.updated_by.as_uuid())
        .bind(rules.audit.created_at)
        .bind(rules.audit.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| child_insert_error(e, "service_booking_rules", rules.service_id))?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_pricing(&self, service_id: ServiceId) -> Result<()> {
        sqlx::query("DELETE FROM service_pricing WHERE service_id = $1")
            .bind(service_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| delete_error(e, service_id))?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn delete_service(&self, service_id: ServiceId) -> Result<()> {
        sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(service_id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| delete_error(e, service_id))?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn find_slugs_with_prefix(
        &self,
        salon_id: SalonId,
        prefix: &str,
        exclude: Option<ServiceId>,
    ) -> Result<Vec<String>> {
        let slugs: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT slug
            FROM services
            WHERE salon_id = $1
              AND lower(slug) LIKE $2
              AND ($3::uuid IS NULL OR id <> $3)
            ORDER BY slug ASC
            "#,
        )
        .bind(salon_id.as_uuid())
        .bind(like_prefix(prefix))
        .bind(exclude.map(|id| id.as_uuid()))
        .fetch_all(&self.pool)
        .await?;

        Ok(slugs)
    }
}
