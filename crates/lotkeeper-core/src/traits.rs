//! Repository seams for external state
//!
//! Services depend on these traits rather than on concrete database code, so
//! the rate/options snapshot source and the registries can be mocked in tests.

use crate::error::AppError;
use crate::models::{BillingOptions, DiscountRule, RateTier, Vehicle};
use async_trait::async_trait;
use serde::Serialize;

/// Vehicle registry lookups
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    /// Find a vehicle by license plate
    async fn find_by_plate(&self, license_plate: &str) -> Result<Option<Vehicle>, AppError>;
}

/// Rate table and billing options access
///
/// Implementations must return the *current* configuration on every call;
/// the core never caches these across computations.
#[async_trait]
pub trait RateRepository: Send + Sync {
    /// Rate tiers ordered ascending by threshold
    async fn get_tiers(&self) -> Result<Vec<RateTier>, AppError>;

    /// Latest billing options, falling back to defaults when unconfigured
    async fn get_options(&self) -> Result<BillingOptions, AppError>;
}

/// Discount rule lookups (rule CRUD lives with an external collaborator)
#[async_trait]
pub trait DiscountRepository: Send + Sync {
    /// Active rules applicable to the given VIP status, ordered by min_purchase
    async fn list_active(&self, is_vip: bool) -> Result<Vec<DiscountRule>, AppError>;

    /// Active rule by ID
    async fn find_active_by_id(&self, discount_id: i32) -> Result<Option<DiscountRule>, AppError>;
}

/// Paginated response wrapper
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct PaginationMeta {
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
    pub total_pages: i64,
}

impl PaginationMeta {
    pub fn new(total: i64, page: i64, per_page: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };

        Self {
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_meta() {
        let meta = PaginationMeta::new(95, 1, 10);
        assert_eq!(meta.total_pages, 10);

        let meta = PaginationMeta::new(101, 1, 10);
        assert_eq!(meta.total_pages, 11);
    }
}
