//! Domain models for lotkeeper
//!
//! This module contains all the core domain models used throughout the application.

pub mod discount;
pub mod payment;
pub mod rate;
pub mod session;
pub mod vehicle;

pub use discount::{CustomerType, DiscountRule};
pub use payment::Payment;
pub use rate::{BillingOptions, RateTier};
pub use session::ParkingSession;
pub use vehicle::Vehicle;
