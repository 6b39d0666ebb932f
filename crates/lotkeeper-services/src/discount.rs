//! Discount application service
//!
//! Lists the discount rules a vehicle qualifies for and converts a rule's
//! free hours into a monetary discount on the open session's pending
//! payment. Only the discount column is written here; settlement later
//! consumes it into the charged amount.

use chrono::{DateTime, Utc};
use lotkeeper_core::{
    models::{DiscountRule, RateTier},
    traits::{DiscountRepository, RateRepository, VehicleRepository},
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Discount application service
pub struct DiscountService<V, D, R>
where
    V: VehicleRepository,
    D: DiscountRepository,
    R: RateRepository,
{
    pool: PgPool,
    vehicle_repo: Arc<V>,
    discount_repo: Arc<D>,
    rate_repo: Arc<R>,
}

/// Discounts a vehicle currently qualifies for
#[derive(Debug, Clone)]
pub struct DiscountListing {
    pub license_plate: String,
    pub is_vip: bool,
    pub discounts: Vec<DiscountRule>,
}

/// Result of applying a discount rule to the pending payment
#[derive(Debug, Clone)]
pub struct DiscountApplication {
    pub license_plate: String,
    pub discount_id: i32,
    pub entry_time: DateTime<Utc>,
    pub total_hours: i64,
    pub free_hours: i32,
    pub discount_amount: Decimal,
    pub payment_id: i64,
}

impl<V, D, R> DiscountService<V, D, R>
where
    V: VehicleRepository,
    D: DiscountRepository,
    R: RateRepository,
{
    /// Create a new discount service
    pub fn new(pool: PgPool, vehicle_repo: Arc<V>, discount_repo: Arc<D>, rate_repo: Arc<R>) -> Self {
        Self {
            pool,
            vehicle_repo,
            discount_repo,
            rate_repo,
        }
    }

    /// List the active discount rules applicable to a vehicle
    #[instrument(skip(self))]
    pub async fn list_applicable(&self, license_plate: &str) -> AppResult<DiscountListing> {
        debug!("Listing applicable discounts for vehicle {}", license_plate);

        let vehicle = self
            .vehicle_repo
            .find_by_plate(license_plate)
            .await?
            .ok_or_else(|| AppError::VehicleNotFound(license_plate.to_string()))?;

        let is_vip = vehicle.is_vip(Utc::now());
        let discounts = self.discount_repo.list_active(is_vip).await?;

        Ok(DiscountListing {
            license_plate: license_plate.to_string(),
            is_vip,
            discounts,
        })
    }

    /// Apply a discount rule to the vehicle's pending payment
    ///
    /// Values the rule's free hours against the current tier schedule and
    /// writes the result onto the pending payment's discount column. The
    /// payment amount is untouched; settlement subtracts the discount.
    #[instrument(skip(self))]
    pub async fn apply(&self, license_plate: &str, discount_id: i32) -> AppResult<DiscountApplication> {
        info!(
            "Applying discount {} to vehicle {}",
            discount_id, license_plate
        );

        let vehicle = self
            .vehicle_repo
            .find_by_plate(license_plate)
            .await?
            .ok_or_else(|| AppError::VehicleNotFound(license_plate.to_string()))?;

        let rule = self
            .discount_repo
            .find_active_by_id(discount_id)
            .await?
            .ok_or_else(|| AppError::DiscountNotFound(discount_id.to_string()))?;

        let is_vip = vehicle.is_vip(Utc::now());
        if !rule.applies_to(is_vip) {
            return Err(AppError::DiscountNotApplicable(format!(
                "Discount {} targets {} customers",
                discount_id, rule.customer_type
            )));
        }

        let tiers = self.rate_repo.get_tiers().await?;
        let options = self.rate_repo.get_options().await?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })?;

        let session: Option<(i64, DateTime<Utc>)> = sqlx::query_as(
            r#"
            SELECT session_id, entry_time
            FROM parking_sessions
            WHERE vehicle_id = $1
            ORDER BY entry_time DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(vehicle.vehicle_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load session: {}", e)))?;

        let (session_id, entry_time) =
            session.ok_or_else(|| AppError::SessionNotFound(license_plate.to_string()))?;

        let pending: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT payment_id FROM payments
            WHERE session_id = $1 AND paid_at IS NULL
            LIMIT 1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load pending payment: {}", e)))?;

        let (payment_id,) =
            pending.ok_or_else(|| AppError::PendingPaymentNotFound(license_plate.to_string()))?;

        let now = Utc::now();
        let elapsed_ms = (now - entry_time).num_milliseconds();
        let total_hours = if elapsed_ms <= 0 {
            0
        } else {
            (elapsed_ms + 3_600_000 - 1) / 3_600_000
        };

        let discount_amount = free_hours_value(
            rule.free_hours,
            total_hours,
            &tiers,
            options.overflow_hour_rate,
        );

        sqlx::query(
            r#"
            UPDATE payments SET discount = $2 WHERE payment_id = $1
            "#,
        )
        .bind(payment_id)
        .bind(discount_amount)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to write discount on payment {}: {}", payment_id, e);
            AppError::Database(format!("Failed to apply discount: {}", e))
        })?;

        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Transaction(format!("Failed to commit transaction: {}", e))
        })?;

        info!(
            "Discount {} applied to payment {}: {} ({} free hours)",
            discount_id, payment_id, discount_amount, rule.free_hours
        );

        Ok(DiscountApplication {
            license_plate: license_plate.to_string(),
            discount_id,
            entry_time,
            total_hours,
            free_hours: rule.free_hours,
            discount_amount,
            payment_id,
        })
    }
}

/// Monetary value of a rule's free hours under the current tier schedule
///
/// Free hours are capped at the hours actually parked so far (rounded up),
/// then consumed tier by tier starting from hour zero, each tier's
/// threshold acting as its hour capacity. Hours beyond the last tier are
/// valued at the overflow rate.
pub fn free_hours_value(
    free_hours: i32,
    total_hours: i64,
    tiers: &[RateTier],
    overflow_rate: Decimal,
) -> Decimal {
    if free_hours <= 0 {
        return Decimal::ZERO;
    }

    let mut remaining = (free_hours as i64).min(total_hours);
    let mut amount = Decimal::ZERO;

    for tier in tiers {
        if remaining <= 0 {
            break;
        }
        let hours_at_tier = remaining.min(tier.threshold_hours as i64);
        amount += Decimal::from(hours_at_tier) * tier.rate_per_hour;
        remaining -= hours_at_tier;
    }

    if remaining > 0 {
        amount += Decimal::from(remaining) * overflow_rate;
    }

    amount
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tiers() -> Vec<RateTier> {
        vec![
            RateTier {
                threshold_hours: 1,
                rate_per_hour: dec!(20),
            },
            RateTier {
                threshold_hours: 3,
                rate_per_hour: dec!(15),
            },
        ]
    }

    #[test]
    fn test_free_hours_consume_tiers_from_hour_zero() {
        // 1h at 20, then 2h at 15
        let value = free_hours_value(3, 10, &tiers(), dec!(5));
        assert_eq!(value, dec!(65));
    }

    #[test]
    fn test_free_hours_capped_at_parked_hours() {
        // Only 2 hours parked, so only 2 of the 5 free hours count
        let value = free_hours_value(5, 2, &tiers(), dec!(5));
        assert_eq!(value, dec!(35));
    }

    #[test]
    fn test_free_hours_overflow_beyond_schedule() {
        // 1 + 3 = 4 tier hours, 2 more at overflow
        let value = free_hours_value(6, 24, &tiers(), dec!(5));
        assert_eq!(value, dec!(20) + dec!(45) + dec!(10));
    }

    #[test]
    fn test_zero_free_hours_worth_nothing() {
        assert_eq!(free_hours_value(0, 10, &tiers(), dec!(5)), Decimal::ZERO);
        assert_eq!(free_hours_value(3, 0, &tiers(), dec!(5)), Decimal::ZERO);
    }

    #[test]
    fn test_no_tiers_values_at_overflow() {
        let value = free_hours_value(2, 8, &[], dec!(7));
        assert_eq!(value, dec!(14));
    }
}
