//! Data Transfer Objects (DTOs) for API requests and responses

pub mod common;
pub mod discount;
pub mod parking;

pub use common::*;
