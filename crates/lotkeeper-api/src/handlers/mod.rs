//! HTTP request handlers

pub mod discount;
pub mod parking;
pub mod sessions;

pub use discount::configure as configure_discounts;
pub use parking::configure as configure_parking;
