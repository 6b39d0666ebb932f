//! Rate table and billing options repository implementation
//!
//! Every call hits the database: reconciliation must see the latest
//! configured values, so nothing here is cached across calls.

use async_trait::async_trait;
use lotkeeper_core::{
    models::{BillingOptions, RateTier},
    traits::RateRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of RateRepository
pub struct PgRateRepository {
    pool: PgPool,
}

impl PgRateRepository {
    /// Create a new rate repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateRepository for PgRateRepository {
    #[instrument(skip(self))]
    async fn get_tiers(&self) -> AppResult<Vec<RateTier>> {
        debug!("Loading rate tiers");

        let rows = sqlx::query_as::<sqlx::Postgres, TierRow>(
            r#"
            SELECT threshold_hours, rate_per_hour
            FROM rate_tiers
            ORDER BY threshold_hours ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error loading rate tiers: {}", e);
            AppError::Database(format!("Failed to load rate tiers: {}", e))
        })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    async fn get_options(&self) -> AppResult<BillingOptions> {
        debug!("Loading billing options");

        let row = sqlx::query_as::<sqlx::Postgres, OptionsRow>(
            r#"
            SELECT rounding_threshold_minutes, exit_buffer_minutes, overflow_hour_rate
            FROM billing_options
            ORDER BY option_id DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error loading billing options: {}", e);
            AppError::Database(format!("Failed to load billing options: {}", e))
        })?;

        // Fallback to defaults when no options row has been configured
        Ok(row.map(Into::into).unwrap_or_default())
    }
}

/// Helper struct for mapping tier rows
#[derive(Debug, sqlx::FromRow)]
struct TierRow {
    threshold_hours: i32,
    rate_per_hour: Decimal,
}

impl From<TierRow> for RateTier {
    fn from(row: TierRow) -> Self {
        Self {
            threshold_hours: row.threshold_hours,
            rate_per_hour: row.rate_per_hour,
        }
    }
}

/// Helper struct for mapping the options row
#[derive(Debug, sqlx::FromRow)]
struct OptionsRow {
    rounding_threshold_minutes: i32,
    exit_buffer_minutes: Decimal,
    overflow_hour_rate: Decimal,
}

impl From<OptionsRow> for BillingOptions {
    fn from(row: OptionsRow) -> Self {
        Self {
            rounding_threshold_minutes: row.rounding_threshold_minutes,
            exit_buffer_minutes: row.exit_buffer_minutes,
            overflow_hour_rate: row.overflow_hour_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_options_row_mapping() {
        let row = OptionsRow {
            rounding_threshold_minutes: 20,
            exit_buffer_minutes: dec!(10),
            overflow_hour_rate: dec!(25),
        };

        let options: BillingOptions = row.into();
        assert_eq!(options.rounding_threshold_minutes, 20);
        assert_eq!(options.exit_buffer_minutes, dec!(10));
        assert_eq!(options.overflow_hour_rate, dec!(25));
    }
}
