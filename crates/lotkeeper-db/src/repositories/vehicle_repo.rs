//! Vehicle repository implementation
//!
//! PostgreSQL-backed lookups for the vehicle registry. Vehicles are created
//! inside the entry transaction (see the services crate); this repository
//! only reads.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lotkeeper_core::{models::Vehicle, traits::VehicleRepository, AppError, AppResult};
use sqlx::PgPool;
use tracing::{debug, error, instrument};

/// PostgreSQL implementation of VehicleRepository
pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    /// Create a new vehicle repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    #[instrument(skip(self))]
    async fn find_by_plate(&self, license_plate: &str) -> AppResult<Option<Vehicle>> {
        debug!("Finding vehicle by plate: {}", license_plate);

        let result = sqlx::query_as::<sqlx::Postgres, VehicleRow>(
            r#"
            SELECT vehicle_id, license_plate, vip_expires_at, created_at
            FROM vehicles
            WHERE license_plate = $1
            "#,
        )
        .bind(license_plate)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            error!("Database error finding vehicle {}: {}", license_plate, e);
            AppError::Database(format!("Failed to find vehicle: {}", e))
        })?;

        Ok(result.map(Into::into))
    }
}

/// Helper struct for mapping database rows
#[derive(Debug, sqlx::FromRow)]
struct VehicleRow {
    vehicle_id: i64,
    license_plate: String,
    vip_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<VehicleRow> for Vehicle {
    fn from(row: VehicleRow) -> Self {
        Self {
            vehicle_id: row.vehicle_id,
            license_plate: row.license_plate,
            vip_expires_at: row.vip_expires_at,
            created_at: row.created_at,
        }
    }
}
