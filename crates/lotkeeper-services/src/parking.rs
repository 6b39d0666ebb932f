//! Parking session lifecycle service
//!
//! Drives the session state machine: entry, repeated obligation-check and
//! settlement cycles, and exit. Each transition runs as one database
//! transaction with the relevant rows locked (`FOR UPDATE`), so concurrent
//! transitions on the same vehicle serialize and partial writes never
//! survive a failure.

use chrono::{DateTime, Utc};
use lotkeeper_core::{
    models::{ParkingSession, Payment},
    traits::RateRepository,
    AppError, AppResult,
};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::reconciler::{reconcile, Reconciliation};

/// Parking session lifecycle service
///
/// Holds the pool for transactional work and a rate repository seam through
/// which the current tier/options snapshot is fetched on every operation.
pub struct ParkingService<R: RateRepository> {
    pool: PgPool,
    rate_repo: Arc<R>,
}

/// Result of a successful entry
#[derive(Debug, Clone)]
pub struct EntryReceipt {
    pub vehicle_id: i64,
    pub session_id: i64,
    pub payment_id: i64,
}

/// Snapshot of the last settled payment, reported by obligation checks
#[derive(Debug, Clone)]
pub struct SettledPaymentInfo {
    pub payment_id: i64,
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
}

/// Result of an obligation check
#[derive(Debug, Clone)]
pub struct ObligationStatus {
    pub license_plate: String,
    pub entry_time: DateTime<Utc>,
    pub checked_at: DateTime<Utc>,
    pub last_payment: Option<SettledPaymentInfo>,
    pub reconciliation: Reconciliation,
}

/// Result of settling the pending payment
#[derive(Debug, Clone)]
pub struct SettlementReceipt {
    pub payment_id: i64,
    pub license_plate: String,
    pub original_amount: Decimal,
    pub discount: Decimal,
    pub amount: Decimal,
    pub paid_at: DateTime<Utc>,
    pub entry_time: DateTime<Utc>,
    pub start_time: DateTime<Utc>,
    pub previously_paid_hours: i64,
}

/// Result of a successful exit
#[derive(Debug, Clone)]
pub struct ExitReceipt {
    pub license_plate: String,
    pub session_id: i64,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub payments: Vec<Payment>,
}

/// One session with its payments, for history responses
#[derive(Debug, Clone)]
pub struct SessionHistory {
    pub session_id: i64,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub payments: Vec<Payment>,
}

/// Aggregates over a vehicle's full payment history
#[derive(Debug, Clone)]
pub struct HistorySummary {
    pub total_entries: i64,
    pub total_payments: i64,
    pub total_amount: Decimal,
}

/// Full payment history for a vehicle
#[derive(Debug, Clone)]
pub struct PaymentHistory {
    pub license_plate: String,
    pub active_sessions: Vec<SessionHistory>,
    pub completed_sessions: Vec<SessionHistory>,
    pub summary: HistorySummary,
}

impl<R: RateRepository> ParkingService<R> {
    /// Create a new parking service
    pub fn new(pool: PgPool, rate_repo: Arc<R>) -> Self {
        Self { pool, rate_repo }
    }

    /// Register a vehicle entry
    ///
    /// Finds or creates the vehicle, then creates an open session and its
    /// initial pending payment in one transaction. Fails with
    /// `SessionAlreadyOpen` when the vehicle is already parked.
    #[instrument(skip(self))]
    pub async fn create_entry(
        &self,
        license_plate: &str,
        image_path: Option<&str>,
    ) -> AppResult<EntryReceipt> {
        info!("Creating entry for vehicle {}", license_plate);

        let mut tx = self.begin().await?;
        let now = Utc::now();

        // Lock the vehicle row (if it exists) so concurrent entries for the
        // same plate serialize on the open-session check
        let existing: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT vehicle_id FROM vehicles
            WHERE license_plate = $1
            FOR UPDATE
            "#,
        )
        .bind(license_plate)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to lock vehicle {}: {}", license_plate, e);
            AppError::Database(format!("Failed to look up vehicle: {}", e))
        })?;

        let vehicle_id = match existing {
            Some((id,)) => id,
            None => {
                let (id,): (i64,) = sqlx::query_as(
                    r#"
                    INSERT INTO vehicles (license_plate)
                    VALUES ($1)
                    RETURNING vehicle_id
                    "#,
                )
                .bind(license_plate)
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| match &e {
                    sqlx::Error::Database(db) if db.is_unique_violation() => {
                        AppError::Conflict(format!(
                            "Vehicle {} was registered concurrently",
                            license_plate
                        ))
                    }
                    _ => {
                        error!("Failed to create vehicle {}: {}", license_plate, e);
                        AppError::Database(format!("Failed to create vehicle: {}", e))
                    }
                })?;
                id
            }
        };

        // Exactly one open session per vehicle
        let (open_count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM parking_sessions
            WHERE vehicle_id = $1 AND exit_time IS NULL
            "#,
        )
        .bind(vehicle_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| AppError::Database(format!("Failed to check open sessions: {}", e)))?;

        if open_count > 0 {
            return Err(AppError::SessionAlreadyOpen(license_plate.to_string()));
        }

        let (session_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO parking_sessions (vehicle_id, entry_time, entry_image_path)
            VALUES ($1, $2, $3)
            RETURNING session_id
            "#,
        )
        .bind(vehicle_id)
        .bind(now)
        .bind(image_path)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to create session: {}", e);
            AppError::Database(format!("Failed to create session: {}", e))
        })?;

        let (payment_id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO payments (session_id, amount, discount, paid_at)
            VALUES ($1, 0, 0, NULL)
            RETURNING payment_id
            "#,
        )
        .bind(session_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to create initial payment: {}", e);
            AppError::Database(format!("Failed to create initial payment: {}", e))
        })?;

        self.commit(tx).await?;

        info!(
            "Entry created for {}: session {}, payment {}",
            license_plate, session_id, payment_id
        );

        Ok(EntryReceipt {
            vehicle_id,
            session_id,
            payment_id,
        })
    }

    /// Check the current payment obligation for a vehicle
    ///
    /// Runs the reconciler against the latest session, whether or not that
    /// session is still open; only `record_exit` requires an open session.
    /// Side-effecting: when a new payment is due and no pending record exists
    /// (the prior one was settled and its buffer lapsed), a fresh pending
    /// record is created so the discount adapter has something to attach to.
    /// Idempotent otherwise.
    #[instrument(skip(self))]
    pub async fn check_obligation(&self, license_plate: &str) -> AppResult<ObligationStatus> {
        debug!("Checking obligation for vehicle {}", license_plate);

        let mut tx = self.begin().await?;
        let now = Utc::now();

        let session = Self::lock_latest_session(&mut tx, license_plate).await?;
        let (last_settled, pending) = Self::load_payment_state(&mut tx, session.session_id).await?;

        let tiers = self.rate_repo.get_tiers().await?;
        let options = self.rate_repo.get_options().await?;

        let rec = reconcile(
            session.entry_time,
            last_settled.as_ref(),
            pending.as_ref(),
            &tiers,
            &options,
            now,
        );

        if rec.needs_new_payment && pending.is_none() {
            sqlx::query(
                r#"
                INSERT INTO payments (session_id, amount, discount, paid_at)
                VALUES ($1, 0, $2, NULL)
                "#,
            )
            .bind(session.session_id)
            .bind(rec.discount)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                error!("Failed to create pending payment: {}", e);
                AppError::Database(format!("Failed to create pending payment: {}", e))
            })?;
        }

        self.commit(tx).await?;

        Ok(ObligationStatus {
            license_plate: license_plate.to_string(),
            entry_time: session.entry_time,
            checked_at: now,
            last_payment: last_settled.and_then(|p| {
                p.paid_at.map(|paid_at| SettledPaymentInfo {
                    payment_id: p.payment_id,
                    amount: p.amount,
                    paid_at,
                })
            }),
            reconciliation: rec,
        })
    }

    /// Settle the pending payment for a vehicle (mock payment)
    ///
    /// Charges the next one-hour increment at the reconciled rate minus the
    /// pending record's discount, writing amount and paid_at together. The
    /// discount column is never modified here. Like `check_obligation`, this
    /// targets the vehicle's latest session even after it has closed.
    #[instrument(skip(self))]
    pub async fn settle_pending(&self, license_plate: &str) -> AppResult<SettlementReceipt> {
        info!("Settling pending payment for vehicle {}", license_plate);

        let mut tx = self.begin().await?;
        let now = Utc::now();

        let session = Self::lock_latest_session(&mut tx, license_plate).await?;
        let (last_settled, pending) = Self::load_payment_state(&mut tx, session.session_id).await?;

        let pending =
            pending.ok_or_else(|| AppError::PendingPaymentNotFound(license_plate.to_string()))?;

        let tiers = self.rate_repo.get_tiers().await?;
        let options = self.rate_repo.get_options().await?;

        let rec = reconcile(
            session.entry_time,
            last_settled.as_ref(),
            Some(&pending),
            &tiers,
            &options,
            now,
        );

        sqlx::query(
            r#"
            UPDATE payments
            SET amount = $2, paid_at = $3
            WHERE payment_id = $1
            "#,
        )
        .bind(pending.payment_id)
        .bind(rec.amount_after_discount)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to settle payment {}: {}", pending.payment_id, e);
            AppError::Database(format!("Failed to settle payment: {}", e))
        })?;

        self.commit(tx).await?;

        info!(
            "Settled payment {} for {}: {} (rate {}, discount {})",
            pending.payment_id, license_plate, rec.amount_after_discount, rec.base_rate, rec.discount
        );

        Ok(SettlementReceipt {
            payment_id: pending.payment_id,
            license_plate: license_plate.to_string(),
            original_amount: rec.base_rate,
            discount: rec.discount,
            amount: rec.amount_after_discount,
            paid_at: now,
            entry_time: session.entry_time,
            start_time: rec.start_time,
            previously_paid_hours: rec.previously_paid_hours,
        })
    }

    /// Record a vehicle exit
    ///
    /// Permitted only when the reconciler reports no chargeable obligation
    /// and no pending payment record exists. Sets exit_time exactly once.
    #[instrument(skip(self))]
    pub async fn record_exit(&self, license_plate: &str) -> AppResult<ExitReceipt> {
        info!("Recording exit for vehicle {}", license_plate);

        let mut tx = self.begin().await?;
        let now = Utc::now();

        let session = Self::lock_latest_session(&mut tx, license_plate).await?;
        if !session.is_open() {
            return Err(AppError::Conflict(format!(
                "Vehicle {} has already exited",
                license_plate
            )));
        }

        let (last_settled, pending) = Self::load_payment_state(&mut tx, session.session_id).await?;

        let tiers = self.rate_repo.get_tiers().await?;
        let options = self.rate_repo.get_options().await?;

        let rec = reconcile(
            session.entry_time,
            last_settled.as_ref(),
            pending.as_ref(),
            &tiers,
            &options,
            now,
        );

        if rec.needs_new_payment && rec.amount_after_discount > Decimal::ZERO {
            return Err(AppError::PaymentRequired(format!(
                "Vehicle {} owes {} for the next parking hour",
                license_plate, rec.amount_after_discount
            )));
        }

        // A pending record blocks exit even when its amount would be zero
        if pending.is_some() {
            return Err(AppError::PaymentRequired(format!(
                "Vehicle {} has an unsettled payment record",
                license_plate
            )));
        }

        sqlx::query(
            r#"
            UPDATE parking_sessions
            SET exit_time = $2
            WHERE session_id = $1
            "#,
        )
        .bind(session.session_id)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            error!("Failed to close session {}: {}", session.session_id, e);
            AppError::Database(format!("Failed to close session: {}", e))
        })?;

        let payments = Self::load_payments(&mut tx, session.session_id).await?;

        self.commit(tx).await?;

        info!(
            "Exit recorded for {}: session {} closed at {}",
            license_plate, session.session_id, now
        );

        Ok(ExitReceipt {
            license_plate: license_plate.to_string(),
            session_id: session.session_id,
            entry_time: session.entry_time,
            exit_time: now,
            payments,
        })
    }

    /// Full payment history for a vehicle, split into active and completed
    /// sessions with per-vehicle totals
    #[instrument(skip(self))]
    pub async fn payment_history(&self, license_plate: &str) -> AppResult<PaymentHistory> {
        debug!("Loading payment history for vehicle {}", license_plate);

        let (vehicle_id,): (i64,) = sqlx::query_as(
            r#"
            SELECT vehicle_id FROM vehicles WHERE license_plate = $1
            "#,
        )
        .bind(license_plate)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to look up vehicle: {}", e)))?
        .ok_or_else(|| AppError::VehicleNotFound(license_plate.to_string()))?;

        let sessions = sqlx::query_as::<sqlx::Postgres, SessionRow>(
            r#"
            SELECT session_id, vehicle_id, entry_time, exit_time, entry_image_path
            FROM parking_sessions
            WHERE vehicle_id = $1
            ORDER BY entry_time DESC
            "#,
        )
        .bind(vehicle_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load sessions: {}", e)))?;

        let session_ids: Vec<i64> = sessions.iter().map(|s| s.session_id).collect();

        let payment_rows = sqlx::query_as::<sqlx::Postgres, PaymentRow>(
            r#"
            SELECT payment_id, session_id, amount, discount, paid_at
            FROM payments
            WHERE session_id = ANY($1)
            ORDER BY paid_at DESC NULLS LAST
            "#,
        )
        .bind(&session_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load payments: {}", e)))?;

        let total_payments = payment_rows.len() as i64;
        let total_amount: Decimal = payment_rows
            .iter()
            .map(|p| p.amount.unwrap_or(Decimal::ZERO))
            .sum();

        let mut active_sessions = Vec::new();
        let mut completed_sessions = Vec::new();

        for session in &sessions {
            let payments: Vec<Payment> = payment_rows
                .iter()
                .filter(|p| p.session_id == session.session_id)
                .cloned()
                .map(Into::into)
                .collect();

            let history = SessionHistory {
                session_id: session.session_id,
                entry_time: session.entry_time,
                exit_time: session.exit_time,
                payments,
            };

            if session.exit_time.is_none() {
                active_sessions.push(history);
            } else {
                completed_sessions.push(history);
            }
        }

        Ok(PaymentHistory {
            license_plate: license_plate.to_string(),
            summary: HistorySummary {
                total_entries: sessions.len() as i64,
                total_payments,
                total_amount,
            },
            active_sessions,
            completed_sessions,
        })
    }

    // ==================== transaction plumbing ====================

    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool.begin().await.map_err(|e| {
            error!("Failed to start transaction: {}", e);
            AppError::Transaction(format!("Failed to start transaction: {}", e))
        })
    }

    async fn commit(&self, tx: Transaction<'static, Postgres>) -> AppResult<()> {
        tx.commit().await.map_err(|e| {
            error!("Failed to commit transaction: {}", e);
            AppError::Transaction(format!("Failed to commit transaction: {}", e))
        })
    }

    /// Lock the vehicle's most recent session for the duration of the
    /// transaction, serializing all lifecycle transitions on it
    async fn lock_latest_session(
        tx: &mut Transaction<'static, Postgres>,
        license_plate: &str,
    ) -> AppResult<ParkingSession> {
        let vehicle: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT vehicle_id FROM vehicles WHERE license_plate = $1
            "#,
        )
        .bind(license_plate)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::Database(format!("Failed to look up vehicle: {}", e)))?;

        let (vehicle_id,) =
            vehicle.ok_or_else(|| AppError::VehicleNotFound(license_plate.to_string()))?;

        let session = sqlx::query_as::<sqlx::Postgres, SessionRow>(
            r#"
            SELECT session_id, vehicle_id, entry_time, exit_time, entry_image_path
            FROM parking_sessions
            WHERE vehicle_id = $1
            ORDER BY entry_time DESC
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(vehicle_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load session: {}", e)))?;

        session
            .map(Into::into)
            .ok_or_else(|| AppError::SessionNotFound(license_plate.to_string()))
    }

    /// Load the latest settled payment and the pending payment of a session
    async fn load_payment_state(
        tx: &mut Transaction<'static, Postgres>,
        session_id: i64,
    ) -> AppResult<(Option<Payment>, Option<Payment>)> {
        let last_settled = sqlx::query_as::<sqlx::Postgres, PaymentRow>(
            r#"
            SELECT payment_id, session_id, amount, discount, paid_at
            FROM payments
            WHERE session_id = $1 AND paid_at IS NOT NULL
            ORDER BY paid_at DESC
            LIMIT 1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load settled payment: {}", e)))?;

        let pending = sqlx::query_as::<sqlx::Postgres, PaymentRow>(
            r#"
            SELECT payment_id, session_id, amount, discount, paid_at
            FROM payments
            WHERE session_id = $1 AND paid_at IS NULL
            LIMIT 1
            "#,
        )
        .bind(session_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load pending payment: {}", e)))?;

        Ok((last_settled.map(Into::into), pending.map(Into::into)))
    }

    async fn load_payments(
        tx: &mut Transaction<'static, Postgres>,
        session_id: i64,
    ) -> AppResult<Vec<Payment>> {
        let rows = sqlx::query_as::<sqlx::Postgres, PaymentRow>(
            r#"
            SELECT payment_id, session_id, amount, discount, paid_at
            FROM payments
            WHERE session_id = $1
            ORDER BY paid_at DESC NULLS LAST
            "#,
        )
        .bind(session_id)
        .fetch_all(&mut **tx)
        .await
        .map_err(|e| AppError::Database(format!("Failed to load payments: {}", e)))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Helper struct for mapping session rows
#[derive(Debug, sqlx::FromRow)]
struct SessionRow {
    session_id: i64,
    vehicle_id: i64,
    entry_time: DateTime<Utc>,
    exit_time: Option<DateTime<Utc>>,
    entry_image_path: Option<String>,
}

impl From<SessionRow> for ParkingSession {
    fn from(row: SessionRow) -> Self {
        Self {
            session_id: row.session_id,
            vehicle_id: row.vehicle_id,
            entry_time: row.entry_time,
            exit_time: row.exit_time,
            entry_image_path: row.entry_image_path,
        }
    }
}

/// Helper struct for mapping payment rows
#[derive(Debug, Clone, sqlx::FromRow)]
struct PaymentRow {
    payment_id: i64,
    session_id: i64,
    amount: Option<Decimal>,
    discount: Decimal,
    paid_at: Option<DateTime<Utc>>,
}

impl From<PaymentRow> for Payment {
    fn from(row: PaymentRow) -> Self {
        Self {
            payment_id: row.payment_id,
            session_id: row.session_id,
            amount: row.amount.unwrap_or(Decimal::ZERO),
            discount: row.discount,
            paid_at: row.paid_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    #[ignore] // Requires database with the lotkeeper schema
    async fn test_lifecycle_end_to_end() {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/lotkeeper".to_string());
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("database");

        sqlx::query("DELETE FROM rate_tiers")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO rate_tiers (threshold_hours, rate_per_hour) VALUES (1, 20)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO billing_options \
             (rounding_threshold_minutes, exit_buffer_minutes, overflow_hour_rate) \
             VALUES (30, 15, 10)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let rate_repo = Arc::new(lotkeeper_db::PgRateRepository::new(pool.clone()));
        let service = ParkingService::new(pool.clone(), rate_repo);
        let plate = format!("E2E-{}", Utc::now().timestamp_millis());

        let entry = service.create_entry(&plate, None).await.unwrap();
        assert!(entry.session_id > 0);

        // First obligation is due immediately
        let check = service.check_obligation(&plate).await.unwrap();
        assert!(check.reconciliation.needs_new_payment);
        assert_eq!(check.reconciliation.amount_after_discount, dec!(20));

        // Repeated checks never stack pending rows
        service.check_obligation(&plate).await.unwrap();
        let (pending_count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM payments WHERE session_id = $1 AND paid_at IS NULL",
        )
        .bind(entry.session_id)
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(pending_count, 1);

        let settled = service.settle_pending(&plate).await.unwrap();
        assert_eq!(settled.amount, dec!(20));

        // Within the exit buffer the session is covered and may leave
        let covered = service.check_obligation(&plate).await.unwrap();
        assert!(!covered.reconciliation.needs_new_payment);

        let exit = service.record_exit(&plate).await.unwrap();
        assert!(exit.exit_time > exit.entry_time);
        assert_eq!(exit.payments.len(), 1);
    }

    #[tokio::test]
    #[ignore] // Requires database with the lotkeeper schema
    async fn test_exit_blocked_by_unpaid_obligations() {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/lotkeeper".to_string());
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(2)
            .connect(&url)
            .await
            .expect("database");

        sqlx::query("DELETE FROM rate_tiers")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO rate_tiers (threshold_hours, rate_per_hour) VALUES (1, 20)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query(
            "INSERT INTO billing_options \
             (rounding_threshold_minutes, exit_buffer_minutes, overflow_hour_rate) \
             VALUES (30, 15, 10)",
        )
        .execute(&pool)
        .await
        .unwrap();

        let rate_repo = Arc::new(lotkeeper_db::PgRateRepository::new(pool.clone()));
        let service = ParkingService::new(pool.clone(), rate_repo);
        let plate = format!("GATE-{}", Utc::now().timestamp_millis());

        let entry = service.create_entry(&plate, None).await.unwrap();

        // Fresh entry owes the first hour; the gate must hold
        let err = service.record_exit(&plate).await.unwrap_err();
        assert!(matches!(err, AppError::PaymentRequired(_)));

        let settled = service.settle_pending(&plate).await.unwrap();
        assert_eq!(settled.amount, dec!(20));

        // Push the settled hour outside its validity window
        sqlx::query(
            "UPDATE parking_sessions SET entry_time = entry_time - INTERVAL '2 hours' \
             WHERE session_id = $1",
        )
        .bind(entry.session_id)
        .execute(&pool)
        .await
        .unwrap();
        sqlx::query(
            "UPDATE payments SET paid_at = paid_at - INTERVAL '2 hours' \
             WHERE session_id = $1",
        )
        .bind(entry.session_id)
        .execute(&pool)
        .await
        .unwrap();

        // Lapsed buffer means the overflow hour is chargeable again
        let err = service.record_exit(&plate).await.unwrap_err();
        assert!(matches!(err, AppError::PaymentRequired(_)));

        // Check in the obligation, then discount it down to zero
        let check = service.check_obligation(&plate).await.unwrap();
        assert!(check.reconciliation.needs_new_payment);
        assert_eq!(check.reconciliation.amount_after_discount, dec!(10));
        sqlx::query(
            "UPDATE payments SET discount = 10 \
             WHERE session_id = $1 AND paid_at IS NULL",
        )
        .bind(entry.session_id)
        .execute(&pool)
        .await
        .unwrap();

        // A pending record blocks exit even when nothing would be charged
        let err = service.record_exit(&plate).await.unwrap_err();
        assert!(matches!(err, AppError::PaymentRequired(_)));

        // Settling the zero-amount pending record clears the gate
        let settled = service.settle_pending(&plate).await.unwrap();
        assert_eq!(settled.amount, dec!(0));
        service.record_exit(&plate).await.unwrap();
    }

    #[test]
    fn test_payment_row_mapping_null_amount() {
        let row = PaymentRow {
            payment_id: 7,
            session_id: 3,
            amount: None,
            discount: dec!(5),
            paid_at: None,
        };

        let payment: Payment = row.into();
        assert_eq!(payment.amount, Decimal::ZERO);
        assert_eq!(payment.discount, dec!(5));
        assert!(payment.is_pending());
    }
}
