//! Repository implementations

pub mod discount_repo;
pub mod rate_repo;
pub mod vehicle_repo;

pub use discount_repo::PgDiscountRepository;
pub use rate_repo::PgRateRepository;
pub use vehicle_repo::PgVehicleRepository;
