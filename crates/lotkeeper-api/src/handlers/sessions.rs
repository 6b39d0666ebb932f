//! Session listing handlers
//!
//! Paginated listings of active and completed sessions. Each row carries
//! the rounded parked hours and the fee over the full elapsed span,
//! computed against the rate schedule current at request time.

use crate::dto::parking::SessionListItem;
use crate::dto::PaginationParams;
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use lotkeeper_core::{billing, models::BillingOptions, models::RateTier, traits::RateRepository, AppError};
use lotkeeper_db::PgRateRepository;
use sqlx::PgPool;
use tracing::{debug, instrument, warn};
use validator::Validate;

/// Row struct for session listing queries
#[derive(Debug, sqlx::FromRow)]
struct SessionListRow {
    session_id: i64,
    license_plate: String,
    vip_expires_at: Option<DateTime<Utc>>,
    entry_time: DateTime<Utc>,
    exit_time: Option<DateTime<Utc>>,
}

impl SessionListRow {
    /// Price the row against the current schedule; open sessions are
    /// priced up to `now`, closed ones up to their exit time
    fn into_item(
        self,
        now: DateTime<Utc>,
        tiers: &[RateTier],
        options: &BillingOptions,
    ) -> SessionListItem {
        let end = self.exit_time.unwrap_or(now);
        let elapsed_ms = (end - self.entry_time).num_milliseconds();
        let parked_hours = billing::rounded_hours(elapsed_ms, options.rounding_threshold_minutes);
        let parking_fee = billing::compute_fee(parked_hours, tiers, options.overflow_hour_rate);

        SessionListItem {
            session_id: self.session_id,
            license_plate: self.license_plate,
            is_vip: self
                .vip_expires_at
                .map(|expiry| expiry > now)
                .unwrap_or(false),
            entry_time: self.entry_time,
            exit_time: self.exit_time,
            parked_hours,
            parking_fee,
        }
    }
}

/// List open sessions with live fees
///
/// GET /api/v1/parking/sessions/active
#[instrument(skip(pool))]
pub async fn list_active(
    pool: web::Data<PgPool>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    list_sessions(pool, query, false).await
}

/// List completed sessions with their final fees
///
/// GET /api/v1/parking/sessions/completed
#[instrument(skip(pool))]
pub async fn list_completed(
    pool: web::Data<PgPool>,
    query: web::Query<PaginationParams>,
) -> Result<HttpResponse, AppError> {
    list_sessions(pool, query, true).await
}

async fn list_sessions(
    pool: web::Data<PgPool>,
    query: web::Query<PaginationParams>,
    completed: bool,
) -> Result<HttpResponse, AppError> {
    query.validate().map_err(|e| {
        warn!("Pagination validation failed: {}", e);
        AppError::Validation(e.to_string())
    })?;

    debug!(
        page = query.page,
        per_page = query.per_page,
        completed,
        "Listing sessions"
    );

    let exit_filter = if completed {
        "ps.exit_time IS NOT NULL"
    } else {
        "ps.exit_time IS NULL"
    };

    let (total,): (i64,) = sqlx::query_as(&format!(
        "SELECT COUNT(*) FROM parking_sessions ps WHERE {}",
        exit_filter
    ))
    .fetch_one(pool.get_ref())
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    let rows = sqlx::query_as::<sqlx::Postgres, SessionListRow>(&format!(
        r#"
        SELECT ps.session_id, v.license_plate, v.vip_expires_at,
               ps.entry_time, ps.exit_time
        FROM parking_sessions ps
        JOIN vehicles v ON v.vehicle_id = ps.vehicle_id
        WHERE {}
        ORDER BY ps.entry_time DESC
        LIMIT $1 OFFSET $2
        "#,
        exit_filter
    ))
    .bind(query.limit())
    .bind(query.offset())
    .fetch_all(pool.get_ref())
    .await
    .map_err(|e| AppError::Database(e.to_string()))?;

    let rate_repo = PgRateRepository::new(pool.get_ref().clone());
    let tiers = rate_repo.get_tiers().await?;
    let options = rate_repo.get_options().await?;

    let now = Utc::now();
    let items: Vec<SessionListItem> = rows
        .into_iter()
        .map(|row| row.into_item(now, &tiers, &options))
        .collect();

    Ok(HttpResponse::Ok().json(query.paginate(items, total)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use rust_decimal_macros::dec;

    fn schedule() -> (Vec<RateTier>, BillingOptions) {
        let tiers = vec![
            RateTier {
                threshold_hours: 1,
                rate_per_hour: dec!(20),
            },
            RateTier {
                threshold_hours: 3,
                rate_per_hour: dec!(15),
            },
        ];
        (tiers, BillingOptions::default())
    }

    #[test]
    fn test_open_session_priced_to_now() {
        let now = Utc::now();
        let row = SessionListRow {
            session_id: 1,
            license_plate: "AB-1234".to_string(),
            vip_expires_at: None,
            entry_time: now - Duration::minutes(150),
            exit_time: None,
        };

        let (tiers, options) = schedule();
        let item = row.into_item(now, &tiers, &options);

        // 2h30m rounds to 2h under the 30-minute rule (exclusive)
        assert_eq!(item.parked_hours, 2);
        assert_eq!(item.parking_fee, dec!(35));
        assert!(!item.is_vip);
    }

    #[test]
    fn test_closed_session_priced_to_exit() {
        let now = Utc::now();
        let exit = now - Duration::hours(5);
        let row = SessionListRow {
            session_id: 2,
            license_plate: "CD-5678".to_string(),
            vip_expires_at: Some(now + Duration::days(30)),
            entry_time: exit - Duration::hours(1),
            exit_time: Some(exit),
        };

        let (tiers, options) = schedule();
        let item = row.into_item(now, &tiers, &options);

        assert_eq!(item.parked_hours, 1);
        assert_eq!(item.parking_fee, dec!(20));
        assert!(item.is_vip);
    }
}
