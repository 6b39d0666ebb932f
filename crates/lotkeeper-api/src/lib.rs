//! API layer for lotkeeper
//!
//! HTTP handlers for the parking session lifecycle, session listings, and
//! discount application.

#![forbid(unsafe_code)]

pub mod dto;
pub mod handlers;

use lotkeeper_db::{PgDiscountRepository, PgRateRepository, PgVehicleRepository};
use lotkeeper_services::{DiscountService, ParkingService};

/// Parking service wired to the Postgres rate repository
pub type PgParkingService = ParkingService<PgRateRepository>;

/// Discount service wired to the Postgres repositories
pub type PgDiscountService =
    DiscountService<PgVehicleRepository, PgDiscountRepository, PgRateRepository>;

// Re-export DTOs (common types)
pub use dto::{ApiResponse, PaginationParams};

// Re-export handler configuration functions
pub use handlers::{configure_discounts, configure_parking};
