//! Discount rule repository implementation
//!
//! Read-only access to discount rules. Rule CRUD belongs to the
//! configuration collaborator and is not part of this core.

use async_trait::async_trait;
use lotkeeper_core::{
    models::{CustomerType, DiscountRule},
    traits::DiscountRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of DiscountRepository
pub struct PgDiscountRepository {
    pool: PgPool,
}

impl PgDiscountRepository {
    /// Create a new discount repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Parse customer type from string
    fn parse_customer_type(s: &str) -> CustomerType {
        CustomerType::from_str(s).unwrap_or(CustomerType::All)
    }
}

#[async_trait]
impl DiscountRepository for PgDiscountRepository {
    #[instrument(skip(self))]
    async fn list_active(&self, is_vip: bool) -> AppResult<Vec<DiscountRule>> {
        debug!("Listing active discount rules, is_vip={}", is_vip);

        let member_type = if is_vip {
            CustomerType::Vip
        } else {
            CustomerType::General
        };

        let rows = sqlx::query_as::<sqlx::Postgres, DiscountRow>(
            r#"
            SELECT discount_id, title, customer_type,
                   min_purchase, max_purchase, free_hours, is_active
            FROM discount_rules
            WHERE is_active = TRUE
                AND customer_type IN ('all', $1)
            ORDER BY min_purchase ASC
            "#,
        )
        .bind(member_type.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error listing discount rules: {}", e);
            AppError::Database(format!("Failed to list discount rules: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn find_active_by_id(&self, discount_id: i32) -> AppResult<Option<DiscountRule>> {
        debug!("Finding active discount rule: {}", discount_id);

        let result = sqlx::query_as::<sqlx::Postgres, DiscountRow>(
            r#"
            SELECT discount_id, title, customer_type,
                   min_purchase, max_purchase, free_hours, is_active
            FROM discount_rules
            WHERE discount_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(discount_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding discount rule {}: {}", discount_id, e);
            AppError::Database(format!("Failed to find discount rule: {}", e))
        })?;

        Ok(result.map(Into::into))
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct DiscountRow {
    discount_id: i32,
    title: String,
    customer_type: String,
    min_purchase: Decimal,
    max_purchase: Decimal,
    free_hours: i32,
    is_active: bool,
}

impl From<DiscountRow> for DiscountRule {
    fn from(row: DiscountRow) -> Self {
        Self {
            discount_id: row.discount_id,
            title: row.title,
            customer_type: PgDiscountRepository::parse_customer_type(&row.customer_type),
            min_purchase: row.min_purchase,
            max_purchase: row.max_purchase,
            free_hours: row.free_hours,
            is_active: row.is_active,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_customer_type() {
        assert_eq!(
            PgDiscountRepository::parse_customer_type("vip"),
            CustomerType::Vip
        );
        assert_eq!(
            PgDiscountRepository::parse_customer_type("general"),
            CustomerType::General
        );
        // Unknown values widen to the least restrictive type
        assert_eq!(
            PgDiscountRepository::parse_customer_type("mystery"),
            CustomerType::All
        );
    }
}
